//! The closed set of deliverable document types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypeError;

/// Category of CV template a user can request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Junior,
    Senior,
}

impl DocumentType {
    pub const ALL: [DocumentType; 2] = [DocumentType::Junior, DocumentType::Senior];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Junior => "junior",
            Self::Senior => "senior",
        }
    }

    /// Display form with a leading capital, e.g. `Junior`.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Junior => "Junior",
            Self::Senior => "Senior",
        }
    }

    /// Single-byte tag used in composite storage keys.
    pub fn tag(&self) -> u8 {
        match self {
            Self::Junior => 1,
            Self::Senior => 2,
        }
    }
}

impl FromStr for DocumentType {
    type Err = TypeError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "junior" => Ok(Self::Junior),
            "senior" => Ok(Self::Senior),
            _ => Err(TypeError::InvalidDocumentType(s.to_string())),
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Junior".parse::<DocumentType>(), Ok(DocumentType::Junior));
        assert_eq!(" SENIOR ".parse::<DocumentType>(), Ok(DocumentType::Senior));
    }

    #[test]
    fn rejects_unknown_types() {
        let err = "lead".parse::<DocumentType>().unwrap_err();
        assert_eq!(err, TypeError::InvalidDocumentType("lead".to_string()));
    }

    #[test]
    fn tags_are_distinct() {
        assert_ne!(DocumentType::Junior.tag(), DocumentType::Senior.tag());
    }
}
