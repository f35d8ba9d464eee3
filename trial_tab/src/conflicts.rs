use std::collections::BTreeMap;

use crate::config::{ConflictType, Pairing};

/// Which kinds of matchups are forbidden.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct ConflictRules {
    pub allow_same_school: bool,
    pub allow_repeat_matchup: bool,
}

impl ConflictRules {
    pub const STRICT: ConflictRules = ConflictRules {
        allow_same_school: false,
        allow_repeat_matchup: false,
    };
}

/// Classifies a candidate matchup.
///
/// The same-school check takes precedence when both conditions hold. A team
/// with an unknown school never conflicts on school.
pub fn conflict(
    side1_school: Option<&str>,
    side2_school: Option<&str>,
    side1_past_opponents: &[String],
    side2: &str,
    rules: &ConflictRules,
) -> ConflictType {
    let same_school = matches!((side1_school, side2_school), (Some(s1), Some(s2)) if s1 == s2);
    if same_school && !rules.allow_same_school {
        ConflictType::SameSchool
    } else if !rules.allow_repeat_matchup && side1_past_opponents.iter().any(|o| o == side2) {
        ConflictType::AlreadyFaced
    } else {
        ConflictType::None
    }
}

/// The historical state a pairing is checked against.
pub struct ConflictContext<'a> {
    pub schools: &'a BTreeMap<String, String>,
    pub past_opponents: &'a BTreeMap<String, Vec<String>>,
    pub rules: ConflictRules,
}

impl<'a> ConflictContext<'a> {
    pub fn check(&self, pairing: &Pairing) -> ConflictType {
        let [side1, side2] = pairing;
        let past: &[String] = self
            .past_opponents
            .get(side1)
            .map(|v| v.as_slice())
            .unwrap_or(&[]);
        conflict(
            self.schools.get(side1).map(|s| s.as_str()),
            self.schools.get(side2).map(|s| s.as_str()),
            past,
            side2,
            &self.rules,
        )
    }

    pub fn is_conflict(&self, pairing: &Pairing) -> bool {
        self.check(pairing) != ConflictType::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn past(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn same_school_takes_precedence() {
        let res = conflict(
            Some("Alpha"),
            Some("Alpha"),
            &past(&["1002"]),
            "1002",
            &ConflictRules::STRICT,
        );
        assert_eq!(res, ConflictType::SameSchool);
        assert_eq!(res.to_string(), "same school");
    }

    #[test]
    fn repeat_matchup() {
        let res = conflict(
            Some("Alpha"),
            Some("Beta"),
            &past(&["1003", "1002"]),
            "1002",
            &ConflictRules::STRICT,
        );
        assert_eq!(res, ConflictType::AlreadyFaced);
        assert_eq!(res.to_string(), "already faced");
    }

    #[test]
    fn allowed_by_rules() {
        let rules = ConflictRules {
            allow_same_school: true,
            allow_repeat_matchup: false,
        };
        let res = conflict(Some("Alpha"), Some("Alpha"), &past(&["1002"]), "1002", &rules);
        assert_eq!(res, ConflictType::AlreadyFaced);
        let rules = ConflictRules {
            allow_same_school: true,
            allow_repeat_matchup: true,
        };
        let res = conflict(Some("Alpha"), Some("Alpha"), &past(&["1002"]), "1002", &rules);
        assert_eq!(res, ConflictType::None);
    }

    #[test]
    fn unknown_school_is_not_same_school() {
        let res = conflict(None, None, &[], "1002", &ConflictRules::STRICT);
        assert_eq!(res, ConflictType::None);
    }

    #[test]
    fn context_lookup() {
        let schools: BTreeMap<String, String> = [("1001", "Alpha"), ("1002", "Alpha"), ("1003", "Beta")]
            .iter()
            .map(|(t, s)| (t.to_string(), s.to_string()))
            .collect();
        let mut past_opponents: BTreeMap<String, Vec<String>> = BTreeMap::new();
        past_opponents.insert("1001".to_string(), past(&["1003"]));
        let ctx = ConflictContext {
            schools: &schools,
            past_opponents: &past_opponents,
            rules: ConflictRules::STRICT,
        };
        assert_eq!(
            ctx.check(&["1001".to_string(), "1002".to_string()]),
            ConflictType::SameSchool
        );
        assert_eq!(
            ctx.check(&["1001".to_string(), "1003".to_string()]),
            ConflictType::AlreadyFaced
        );
        // Only the first team's history is consulted.
        assert!(!ctx.is_conflict(&["1003".to_string(), "1001".to_string()]));
    }
}
