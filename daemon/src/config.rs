//! Daemon configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use cvup_bot::BotSettings;
use cvup_delivery::SmtpSettings;
use cvup_issuance::IssuanceConfig;

use crate::error::DaemonError;

/// Configuration for the CV_UP daemon.
///
/// Can be loaded from a TOML file via [`DaemonConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Directory holding the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB map size in MiB.
    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: usize,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Post users like and comment on to get verified.
    #[serde(default = "default_verification_post_url")]
    pub verification_post_url: String,

    /// Directory with `<type>_template.docx` files.
    #[serde(default = "default_templates_dir")]
    pub templates_dir: PathBuf,

    #[serde(default)]
    pub issuance: IssuanceConfig,

    #[serde(default)]
    pub gate: GateConfig,

    #[serde(default)]
    pub smtp: SmtpConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GateConfig {
    /// Base URL of the verification service.
    #[serde(default = "default_gate_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_gate_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default = "default_smtp_host")]
    pub host: String,

    #[serde(default = "default_smtp_port")]
    pub port: u16,

    #[serde(default)]
    pub username: String,

    /// Never read from or written to the file; comes from `CVUP_SMTP_PASSWORD`.
    #[serde(skip)]
    pub password: String,

    /// Sender mailbox, e.g. `CV_UP <bot@example.com>`.
    #[serde(default = "default_smtp_from")]
    pub from: String,

    #[serde(default = "default_smtp_timeout_secs")]
    pub timeout_secs: u64,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./cvup_data")
}

fn default_map_size_mb() -> usize {
    256
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_verification_post_url() -> String {
    "https://www.linkedin.com/".to_string()
}

fn default_templates_dir() -> PathBuf {
    PathBuf::from("./cv_templates")
}

fn default_gate_endpoint() -> String {
    "http://127.0.0.1:8088".to_string()
}

fn default_gate_timeout_secs() -> u64 {
    10
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_smtp_from() -> String {
    "CV_UP <noreply@localhost>".to_string()
}

fn default_smtp_timeout_secs() -> u64 {
    30
}

// ── Impl ───────────────────────────────────────────────────────────────

impl DaemonConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, DaemonError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DaemonError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, DaemonError> {
        toml::from_str(s).map_err(|e| DaemonError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, DaemonError> {
        toml::to_string_pretty(self).map_err(|e| DaemonError::Config(e.to_string()))
    }

    pub fn map_size_bytes(&self) -> usize {
        self.map_size_mb.saturating_mul(1024 * 1024)
    }

    pub fn bot_settings(&self) -> BotSettings {
        BotSettings {
            verification_post_url: self.verification_post_url.clone(),
        }
    }

    pub fn smtp_settings(&self) -> SmtpSettings {
        SmtpSettings {
            host: self.smtp.host.clone(),
            port: self.smtp.port,
            username: self.smtp.username.clone(),
            password: self.smtp.password.clone(),
            from: self.smtp.from.clone(),
            timeout: Duration::from_secs(self.smtp.timeout_secs),
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            map_size_mb: default_map_size_mb(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            verification_post_url: default_verification_post_url(),
            templates_dir: default_templates_dir(),
            issuance: IssuanceConfig::default(),
            gate: GateConfig::default(),
            smtp: SmtpConfig::default(),
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            endpoint: default_gate_endpoint(),
            timeout_secs: default_gate_timeout_secs(),
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
            from: default_smtp_from(),
            timeout_secs: default_smtp_timeout_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = DaemonConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = DaemonConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.map_size_mb, config.map_size_mb);
        assert_eq!(parsed.smtp.port, 587);
        assert_eq!(parsed.issuance, config.issuance);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = DaemonConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.data_dir, PathBuf::from("./cvup_data"));
        assert_eq!(config.log_format, "human");
        assert_eq!(config.issuance.max_code_attempts, 8);
        assert_eq!(config.gate.timeout_secs, 10);
    }

    #[test]
    fn nested_sections_override() {
        let toml = r#"
            map_size_mb = 64

            [issuance]
            gate_timeout_secs = 3

            [smtp]
            host = "mail.example.com"
            username = "bot@example.com"
        "#;
        let config = DaemonConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.map_size_bytes(), 64 * 1024 * 1024);
        assert_eq!(config.issuance.gate_timeout_secs, 3);
        assert_eq!(config.issuance.delivery_timeout_secs, 60);
        assert_eq!(config.smtp.host, "mail.example.com");
        assert_eq!(config.smtp.port, 587);
    }

    #[test]
    fn password_is_never_serialized() {
        let mut config = DaemonConfig::default();
        config.smtp.password = "hunter2".into();
        assert!(!config.to_toml_string().unwrap().contains("hunter2"));
        let parsed = DaemonConfig::from_toml_str("[smtp]\npassword = \"x\"").unwrap();
        assert!(parsed.smtp.password.is_empty());
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = DaemonConfig::from_toml_file(Path::new("/nonexistent/cvup.toml"));
        assert!(matches!(result, Err(DaemonError::Config(_))));
    }
}
