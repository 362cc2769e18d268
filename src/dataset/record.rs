use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Ham,
    Spam,
}

impl Label {
    /// The class tag written to the dataset, which is also the path substring
    /// that selects entries for this label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Ham => "ham",
            Label::Spam => "spam",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ham" => Ok(Label::Ham),
            "spam" => Ok(Label::Spam),
            other => Err(format!("unknown class '{}'", other)),
        }
    }
}

/// One raw email message and its class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledRecord {
    pub message: Vec<u8>,
    pub class: Label,
}

impl LabeledRecord {
    pub fn new(message: impl Into<Vec<u8>>, class: Label) -> Self {
        Self {
            message: message.into(),
            class,
        }
    }
}
