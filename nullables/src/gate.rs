//! Nullable verification gate: scripted verdicts, failures and latency.

use cvup_types::VerificationCode;
use cvup_verification::{GateError, VerificationGate};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A verification gate whose answers are set by the test.
///
/// Per-code verdicts take precedence over the default verdict. A configured
/// failure takes precedence over both.
pub struct NullGate {
    default_verdict: bool,
    verdicts: Mutex<HashMap<VerificationCode, bool>>,
    failure: Mutex<Option<String>>,
    delay: Mutex<Duration>,
    calls: AtomicUsize,
}

impl NullGate {
    fn with_default(verdict: bool) -> Self {
        Self {
            default_verdict: verdict,
            verdicts: Mutex::new(HashMap::new()),
            failure: Mutex::new(None),
            delay: Mutex::new(Duration::ZERO),
            calls: AtomicUsize::new(0),
        }
    }

    /// Every code counts as verified.
    pub fn verified() -> Self {
        Self::with_default(true)
    }

    /// No code counts as verified until told otherwise.
    pub fn unverified() -> Self {
        Self::with_default(false)
    }

    pub fn set_verdict(&self, code: &VerificationCode, verdict: bool) {
        self.verdicts.lock().unwrap().insert(code.clone(), verdict);
    }

    /// Answer every call with an `Unreachable` error until [`Self::recover`].
    pub fn fail_with(&self, reason: impl Into<String>) {
        *self.failure.lock().unwrap() = Some(reason.into());
    }

    pub fn recover(&self) {
        *self.failure.lock().unwrap() = None;
    }

    /// Sleep this long before answering.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl VerificationGate for NullGate {
    fn name(&self) -> &str {
        "null-gate"
    }

    async fn is_verified(&self, code: &VerificationCode) -> Result<bool, GateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(reason) = self.failure.lock().unwrap().clone() {
            return Err(GateError::Unreachable(reason));
        }
        let verdict = self.verdicts.lock().unwrap().get(code).copied();
        Ok(verdict.unwrap_or(self.default_verdict))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(raw: &str) -> VerificationCode {
        VerificationCode::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn per_code_verdict_overrides_default() {
        let gate = NullGate::unverified();
        gate.set_verdict(&code("GOOD0001"), true);
        assert!(gate.is_verified(&code("GOOD0001")).await.unwrap());
        assert!(!gate.is_verified(&code("OTHR0001")).await.unwrap());
        assert_eq!(gate.call_count(), 2);
    }

    #[tokio::test]
    async fn failure_wins_until_recovered() {
        let gate = NullGate::verified();
        gate.fail_with("down");
        assert!(matches!(
            gate.is_verified(&code("GOOD0001")).await,
            Err(GateError::Unreachable(_))
        ));
        gate.recover();
        assert!(gate.is_verified(&code("GOOD0001")).await.unwrap());
    }
}
