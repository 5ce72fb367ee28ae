//! Verification codes and their generation.
//!
//! A code is 8 characters drawn from `A-Z0-9` (36 symbols, roughly 41 bits
//! of entropy). Generators only produce candidates; global uniqueness is
//! established against the request store by the issuance workflow.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypeError;

/// Symbols a code may contain.
pub const CODE_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Exact length of every verification code.
pub const CODE_LEN: usize = 8;

/// A short token correlating an out-of-band verification action with a
/// pending CV request.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VerificationCode(String);

impl VerificationCode {
    /// Validate and wrap a code. Lowercase input is rejected, not folded.
    pub fn parse(raw: &str) -> Result<Self, TypeError> {
        if Self::is_well_formed(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(TypeError::InvalidCode(raw.to_string()))
        }
    }

    pub fn is_well_formed(raw: &str) -> bool {
        raw.len() == CODE_LEN && raw.bytes().all(|b| CODE_ALPHABET.contains(&b))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for VerificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for VerificationCode {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VerificationCode {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if Self::is_well_formed(&s) {
            Ok(Self(s))
        } else {
            Err(TypeError::InvalidCode(s))
        }
    }
}

impl From<VerificationCode> for String {
    fn from(code: VerificationCode) -> Self {
        code.0
    }
}

/// Source of candidate verification codes.
pub trait CodeGenerator: Send + Sync {
    fn generate(&self) -> VerificationCode;
}

/// Generator backed by the thread-local CSPRNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomCodeGenerator;

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self) -> VerificationCode {
        let mut rng = rand::thread_rng();
        let code: String = (0..CODE_LEN)
            .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
            .collect();
        VerificationCode(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_uppercase_alphanumerics() {
        let code = VerificationCode::parse("AB12CD34").unwrap();
        assert_eq!(code.as_str(), "AB12CD34");
    }

    #[test]
    fn parse_rejects_wrong_length_and_case() {
        assert!(VerificationCode::parse("AB12CD3").is_err());
        assert!(VerificationCode::parse("AB12CD345").is_err());
        assert!(VerificationCode::parse("ab12cd34").is_err());
        assert!(VerificationCode::parse("AB12-D34").is_err());
    }

    #[test]
    fn random_codes_are_well_formed() {
        let gen = RandomCodeGenerator;
        for _ in 0..256 {
            let code = gen.generate();
            assert!(VerificationCode::is_well_formed(code.as_str()), "{code}");
        }
    }

    #[test]
    fn deserialize_rejects_malformed_code() {
        let bytes = bincode::serialize("short").unwrap();
        let decoded: Result<VerificationCode, _> = bincode::deserialize(&bytes);
        assert!(decoded.is_err());
    }
}
