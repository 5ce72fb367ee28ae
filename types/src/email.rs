//! Delivery email addresses.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypeError;

/// An email address captured from user input.
///
/// Only a shallow shape check is applied (`local@domain.tld`, no spaces);
/// deliverability is the mail transport's concern.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(raw: &str) -> Result<Self, TypeError> {
        let trimmed = raw.trim();
        let valid = match trimmed.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.contains('@')
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
                    && !trimmed.chars().any(char::is_whitespace)
            }
            None => false,
        };
        if valid {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(TypeError::InvalidEmail(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EmailAddress {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = TypeError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<EmailAddress> for String {
    fn from(email: EmailAddress) -> Self {
        email.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert_eq!(EmailAddress::parse(" a@x.com ").unwrap().as_str(), "a@x.com");
    }

    #[test]
    fn rejects_malformed_addresses() {
        for raw in ["", "ax.com", "@x.com", "a@x", "a@@x.com", "a b@x.com", "a@x.com."] {
            assert!(EmailAddress::parse(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn deserialize_applies_the_shape_check() {
        let good: EmailAddress =
            bincode::deserialize(&bincode::serialize("a@x.com").unwrap()).unwrap();
        assert_eq!(good.as_str(), "a@x.com");

        for raw in ["not-an-address", "a@x", ""] {
            let bytes = bincode::serialize(raw).unwrap();
            let decoded: Result<EmailAddress, _> = bincode::deserialize(&bytes);
            assert!(decoded.is_err(), "{raw} should be rejected");
        }
    }
}
