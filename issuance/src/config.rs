//! Workflow tuning knobs.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuanceConfig {
    /// Codes tried before giving up with `GeneratorExhausted`.
    #[serde(default = "default_max_code_attempts")]
    pub max_code_attempts: u32,

    /// Upper bound on one verification gate call.
    #[serde(default = "default_gate_timeout_secs")]
    pub gate_timeout_secs: u64,

    /// Upper bound on one delivery attempt.
    #[serde(default = "default_delivery_timeout_secs")]
    pub delivery_timeout_secs: u64,

    /// How long a claim holds the store-level delivery lease. Never shorter
    /// than one gate call plus one delivery attempt.
    #[serde(default = "default_claim_lease_secs")]
    pub claim_lease_secs: u64,
}

fn default_max_code_attempts() -> u32 {
    8
}

fn default_gate_timeout_secs() -> u64 {
    15
}

fn default_delivery_timeout_secs() -> u64 {
    60
}

fn default_claim_lease_secs() -> u64 {
    120
}

impl IssuanceConfig {
    pub fn gate_timeout(&self) -> Duration {
        Duration::from_secs(self.gate_timeout_secs)
    }

    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_secs(self.delivery_timeout_secs)
    }

    pub fn claim_lease(&self) -> Duration {
        let floor = self
            .gate_timeout_secs
            .saturating_add(self.delivery_timeout_secs)
            .saturating_add(1);
        Duration::from_secs(self.claim_lease_secs.max(floor))
    }
}

impl Default for IssuanceConfig {
    fn default() -> Self {
        Self {
            max_code_attempts: default_max_code_attempts(),
            gate_timeout_secs: default_gate_timeout_secs(),
            delivery_timeout_secs: default_delivery_timeout_secs(),
            claim_lease_secs: default_claim_lease_secs(),
        }
    }
}
