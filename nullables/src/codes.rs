//! Nullable code generator: scripted verification codes.

use cvup_types::{CodeGenerator, VerificationCode};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Returns pre-configured codes in order, wrapping around at the end.
pub struct NullCodeGenerator {
    codes: Vec<VerificationCode>,
    index: AtomicUsize,
}

impl NullCodeGenerator {
    /// # Panics
    ///
    /// If `codes` is empty.
    pub fn new(codes: Vec<VerificationCode>) -> Self {
        assert!(!codes.is_empty(), "NullCodeGenerator needs at least one code");
        Self {
            codes,
            index: AtomicUsize::new(0),
        }
    }

    /// Every call returns the same code, e.g. to force collisions.
    pub fn constant(code: VerificationCode) -> Self {
        Self::new(vec![code])
    }

    /// Number of codes handed out so far.
    pub fn generated(&self) -> usize {
        self.index.load(Ordering::SeqCst)
    }
}

impl CodeGenerator for NullCodeGenerator {
    fn generate(&self) -> VerificationCode {
        let idx = self.index.fetch_add(1, Ordering::SeqCst);
        self.codes[idx % self.codes.len()].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(raw: &str) -> VerificationCode {
        VerificationCode::parse(raw).unwrap()
    }

    #[test]
    fn cycles_through_script() {
        let codes = NullCodeGenerator::new(vec![code("AAAA0001"), code("AAAA0002")]);
        assert_eq!(codes.generate(), code("AAAA0001"));
        assert_eq!(codes.generate(), code("AAAA0002"));
        assert_eq!(codes.generate(), code("AAAA0001"));
        assert_eq!(codes.generated(), 3);
    }
}
