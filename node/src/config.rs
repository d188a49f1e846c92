//! Ledger configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use civic_types::{AccountId, KeyPair, ProtocolParams};
use civic_utils::LogFormat;

use crate::NodeError;

/// File name of the persisted ledger snapshot inside `data_dir`.
pub const SNAPSHOT_FILE: &str = "ledger.snapshot";

/// Configuration for a civic ledger instance.
///
/// Can be loaded from a TOML file via [`LedgerConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Identity allowed to run the one-shot bootstrap.
    #[serde(default = "default_deployer")]
    pub deployer: AccountId,

    /// Identity that controls every component once bootstrap completes.
    #[serde(default = "default_consensus_account")]
    pub consensus_account: AccountId,

    /// External identity that manages the verification operator set.
    #[serde(default = "default_operator_registry")]
    pub operator_registry: AccountId,

    /// Directory holding the ledger snapshot.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Hex-encoded 32-byte seed for the proof-bundle signing key. A fresh key
    /// is generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attestation_seed: Option<String>,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to collect Prometheus metrics.
    #[serde(default)]
    pub enable_metrics: bool,

    /// Protocol parameters (fixed by bootstrap, not TOML config).
    #[serde(skip)]
    pub params: ProtocolParams,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_deployer() -> AccountId {
    AccountId::new("deployer")
}

fn default_consensus_account() -> AccountId {
    AccountId::new("consensus")
}

fn default_operator_registry() -> AccountId {
    AccountId::new("operator-registry")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./civic_data")
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl LedgerConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        let config: Self = toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Identity checks run on every load and before a ledger is built.
    pub fn validate(&self) -> Result<(), NodeError> {
        for (field, id) in [
            ("deployer", &self.deployer),
            ("consensus_account", &self.consensus_account),
            ("operator_registry", &self.operator_registry),
        ] {
            if !id.is_valid() {
                return Err(NodeError::Config(format!("{field} must be a non-empty identity")));
            }
        }
        if self.deployer == self.consensus_account {
            return Err(NodeError::Config(
                "deployer and consensus_account must differ".into(),
            ));
        }
        Ok(())
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_FILE)
    }

    /// The proof-bundle signing key: from `attestation_seed` if set, fresh otherwise.
    pub fn signing_key(&self) -> Result<KeyPair, NodeError> {
        match &self.attestation_seed {
            Some(seed_hex) => {
                let mut seed = [0u8; 32];
                hex::decode_to_slice(seed_hex.trim(), &mut seed)
                    .map_err(|e| NodeError::Config(format!("attestation_seed: {e}")))?;
                Ok(civic_crypto::keypair_from_seed(&seed))
            }
            None => Ok(civic_crypto::generate_keypair()?),
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            deployer: default_deployer(),
            consensus_account: default_consensus_account(),
            operator_registry: default_operator_registry(),
            data_dir: default_data_dir(),
            attestation_seed: None,
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            enable_metrics: false,
            params: ProtocolParams::civic_defaults(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = LedgerConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = LedgerConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.deployer, config.deployer);
        assert_eq!(parsed.data_dir, config.data_dir);
        assert_eq!(parsed.log_format, LogFormat::Human);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = LedgerConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.consensus_account, AccountId::new("consensus"));
        assert_eq!(config.log_level, "info");
        assert!(!config.enable_metrics);
        assert_eq!(config.params, ProtocolParams::civic_defaults());
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            deployer = "founder"
            log_format = "json"
            enable_metrics = true
        "#;
        let config = LedgerConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.deployer, AccountId::new("founder"));
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.enable_metrics);
        assert_eq!(config.operator_registry, AccountId::new("operator-registry"));
    }

    #[test]
    fn params_are_not_configurable() {
        let config = LedgerConfig::from_toml_str("[params]\nvote_threshold = 1\n");
        // Unknown tables are ignored; the bootstrap parameter set stands.
        assert_eq!(config.unwrap().params.vote_threshold, 2);
    }

    #[test]
    fn deployer_must_differ_from_consensus_account() {
        let result = LedgerConfig::from_toml_str("deployer = \"consensus\"");
        assert!(matches!(result, Err(NodeError::Config(_))));
    }

    #[test]
    fn seed_yields_stable_key() {
        let config = LedgerConfig {
            attestation_seed: Some("07".repeat(32)),
            ..LedgerConfig::default()
        };
        let a = config.signing_key().unwrap();
        let b = config.signing_key().unwrap();
        assert_eq!(a.public, b.public);

        let bad = LedgerConfig {
            attestation_seed: Some("07".into()),
            ..LedgerConfig::default()
        };
        assert!(matches!(bad.signing_key(), Err(NodeError::Config(_))));
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = LedgerConfig::from_toml_file("/nonexistent/civic.toml");
        assert!(matches!(result, Err(NodeError::Config(_))));
    }
}
