use log::debug;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// A reproducible stream of pseudo-random numbers derived from a seed string.
///
/// The seed string is hashed with SHA-256 and the digest seeds a ChaCha20
/// generator, so the same seed yields the same sequence on every platform.
/// Tournament operators rely on this to preview pairings before committing
/// them.
///
/// ```
/// use trial_tab::random::SeededRandom;
///
/// let mut a = SeededRandom::new("spring-invitational");
/// let mut b = SeededRandom::new("spring-invitational");
/// assert_eq!(a.next_int(1000), b.next_int(1000));
/// ```
pub struct SeededRandom {
    rng: ChaCha20Rng,
}

impl SeededRandom {
    pub fn new(seed: &str) -> SeededRandom {
        let digest: String = sha256::digest(seed);
        let mut bytes = [0u8; 32];
        for (idx, b) in bytes.iter_mut().enumerate() {
            // The digest is always 64 lowercase hexadecimal characters.
            *b = digest
                .get(2 * idx..2 * idx + 2)
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .unwrap_or(0);
        }
        debug!("SeededRandom::new: seed {:?} digest {}", seed, digest);
        SeededRandom {
            rng: ChaCha20Rng::from_seed(bytes),
        }
    }

    /// A float in `[0, 1)`.
    pub fn next_float(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    /// An integer in `[0, max)`. Returns 0 when `max` is 0.
    pub fn next_int(&mut self, max: usize) -> usize {
        if max == 0 {
            0
        } else {
            self.rng.random_range(0..max)
        }
    }

    pub fn next_bool(&mut self) -> bool {
        self.rng.random_bool(0.5)
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }
}
