use crate::dataset::Label;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which label substrings an entry path contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelMatch {
    Neither,
    Only(Label),
    Both,
}

impl LabelMatch {
    pub fn from_path(path: &str) -> Self {
        let ham = path.contains(Label::Ham.as_str());
        let spam = path.contains(Label::Spam.as_str());

        match (ham, spam) {
            (false, false) => LabelMatch::Neither,
            (true, false) => LabelMatch::Only(Label::Ham),
            (false, true) => LabelMatch::Only(Label::Spam),
            (true, true) => LabelMatch::Both,
        }
    }
}

/// What to do with an entry whose path contains both "ham" and "spam".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AmbiguityPolicy {
    /// Abort the build and name the offending entry
    #[default]
    Error,
    /// Keep one record labeled ham
    Ham,
    /// Keep one record labeled spam
    Spam,
    /// Keep two records, ham first
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Labels(&'static [Label]),
    Reject,
}

impl AmbiguityPolicy {
    pub fn resolve(self, matched: LabelMatch) -> Resolution {
        match matched {
            LabelMatch::Neither => Resolution::Labels(&[]),
            LabelMatch::Only(Label::Ham) => Resolution::Labels(&[Label::Ham]),
            LabelMatch::Only(Label::Spam) => Resolution::Labels(&[Label::Spam]),
            LabelMatch::Both => match self {
                AmbiguityPolicy::Error => Resolution::Reject,
                AmbiguityPolicy::Ham => Resolution::Labels(&[Label::Ham]),
                AmbiguityPolicy::Spam => Resolution::Labels(&[Label::Spam]),
                AmbiguityPolicy::Both => Resolution::Labels(&[Label::Ham, Label::Spam]),
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AmbiguityPolicy::Error => "error",
            AmbiguityPolicy::Ham => "ham",
            AmbiguityPolicy::Spam => "spam",
            AmbiguityPolicy::Both => "both",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_from_enron_paths() {
        assert_eq!(
            LabelMatch::from_path("enron1/ham/0001.1999-12-10.farmer.ham.txt"),
            LabelMatch::Only(Label::Ham)
        );
        assert_eq!(
            LabelMatch::from_path("enron1/spam/0006.2003-12-18.GP.spam.txt"),
            LabelMatch::Only(Label::Spam)
        );
        assert_eq!(LabelMatch::from_path("enron1/Summary.txt"), LabelMatch::Neither);
        assert_eq!(LabelMatch::from_path("enron1/spamham/01"), LabelMatch::Both);
    }

    #[test]
    fn test_substring_match_is_case_sensitive() {
        assert_eq!(LabelMatch::from_path("enron1/HAM/0001"), LabelMatch::Neither);
    }

    #[test]
    fn test_single_matches_ignore_policy() {
        for policy in [
            AmbiguityPolicy::Error,
            AmbiguityPolicy::Ham,
            AmbiguityPolicy::Spam,
            AmbiguityPolicy::Both,
        ] {
            assert_eq!(
                policy.resolve(LabelMatch::Only(Label::Spam)),
                Resolution::Labels(&[Label::Spam])
            );
            assert_eq!(policy.resolve(LabelMatch::Neither), Resolution::Labels(&[]));
        }
    }

    #[test]
    fn test_ambiguous_resolution() {
        assert_eq!(AmbiguityPolicy::Error.resolve(LabelMatch::Both), Resolution::Reject);
        assert_eq!(
            AmbiguityPolicy::Ham.resolve(LabelMatch::Both),
            Resolution::Labels(&[Label::Ham])
        );
        assert_eq!(
            AmbiguityPolicy::Both.resolve(LabelMatch::Both),
            Resolution::Labels(&[Label::Ham, Label::Spam])
        );
    }

    #[test]
    fn test_default_policy_is_error() {
        assert_eq!(AmbiguityPolicy::default(), AmbiguityPolicy::Error);
    }
}
