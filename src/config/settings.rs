//! Configuration record for amman-config
//!
//! This module provides the configuration handed to the validator orchestrator,
//! with TOML file parsing and environment variable override support.

use crate::error::{AmmanError, Result};
use crate::localnet::{tmp_ledger_dir, LOCALHOST};
use crate::programs::ProgramRegistry;
use crate::types::Commitment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Main configuration structure read by the validator orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AmmanConfig {
    /// Programs to deploy before the validator starts
    pub programs: Arc<ProgramRegistry>,
    /// Test validator configuration
    pub validator: ValidatorConfig,
    /// Companion relay configuration
    pub relay: RelayConfig,
}

/// Test validator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidatorConfig {
    /// Terminate any running validator before starting a new one
    pub kill_running_validators: bool,
    /// Programs loaded into the fresh validator, shared with [`AmmanConfig::programs`]
    #[serde(skip_deserializing)]
    pub programs: Arc<ProgramRegistry>,
    /// Commitment level for RPC calls made during setup and teardown
    pub commitment: Commitment,
    /// Wipe existing ledger state before start
    pub reset_ledger: bool,
    /// Verify fee-account balances once the validator is up
    pub verify_fees: bool,
    /// JSON RPC endpoint of the validator
    #[serde(serialize_with = "endpoint::serialize")]
    pub json_rpc_url: Url,
    /// Pubsub endpoint, `None` (serialized as `""`) disables it
    #[serde(with = "endpoint::optional")]
    pub websocket_url: Option<Url>,
    /// Directory the validator persists its ledger to
    pub ledger_dir: PathBuf,
}

/// Companion relay configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RelayConfig {
    /// Start the relay alongside the validator
    pub enabled: bool,
    /// Terminate any running relay before starting a new one
    pub kill_running_relay: bool,
}

impl Default for AmmanConfig {
    /// Defaults without a ledger directory; see [`AmmanConfig::new`]
    fn default() -> Self {
        let programs = Arc::new(ProgramRegistry::new());
        Self {
            programs: Arc::clone(&programs),
            validator: ValidatorConfig {
                programs,
                ..ValidatorConfig::default()
            },
            relay: RelayConfig::default(),
        }
    }
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            kill_running_validators: true,
            programs: Arc::default(),
            commitment: Commitment::SingleGossip,
            reset_ledger: true,
            verify_fees: false,
            json_rpc_url: Url::parse(LOCALHOST).expect("LOCALHOST is a valid URL"),
            websocket_url: None,
            ledger_dir: PathBuf::new(),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            kill_running_relay: true,
        }
    }
}

/// Build the configuration record for a fresh local validator run
pub fn amman_config() -> Result<AmmanConfig> {
    AmmanConfig::new()
}

impl AmmanConfig {
    /// Create the default configuration with a freshly allocated ledger directory.
    ///
    /// Does not read the environment or any file.
    pub fn new() -> Result<Self> {
        let mut config = Self::default();
        config.validator.ledger_dir = tmp_ledger_dir()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AmmanError::Configuration(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let mut config = Self::parse(&contents)?;

        // Apply environment variable overrides
        config.apply_env_overrides();

        config.ensure_ledger_dir()?;
        config.validate()?;

        info!(
            path = %path.display(),
            programs = config.programs.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parse a TOML document, without environment overrides
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let mut config = Self::parse(contents)?;
        config.ensure_ledger_dir()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, otherwise start from the defaults.
    ///
    /// Environment overrides apply in both cases.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        config.ensure_ledger_dir()?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the program registry, keeping the validator's view in sync
    pub fn with_programs(mut self, programs: ProgramRegistry) -> Self {
        self.programs = Arc::new(programs);
        self.link_programs();
        self
    }

    /// Whether the orchestrator should expose a pubsub endpoint
    pub fn websocket_enabled(&self) -> bool {
        self.validator.websocket_url.is_some()
    }

    /// Export as pretty-printed JSON in the shape the orchestrator reads
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Export as TOML, loadable again through [`AmmanConfig::from_file`]
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    fn parse(contents: &str) -> Result<Self> {
        let mut config: AmmanConfig = toml::from_str(contents)?;

        let document: toml::Table = contents.parse()?;
        let shadowed = shadowed_validator_programs(&document)
            .filter(|declared| *declared != *config.programs);
        if let Some(declared) = shadowed {
            warn!(
                declared = declared.len(),
                registered = config.programs.len(),
                "Ignoring [validator.programs], validator programs come from [programs]"
            );
        }

        config.link_programs();
        Ok(config)
    }

    /// The top-level registry is the single source of program registration
    fn link_programs(&mut self) {
        self.validator.programs = Arc::clone(&self.programs);
    }

    fn ensure_ledger_dir(&mut self) -> Result<()> {
        if self.validator.ledger_dir.as_os_str().is_empty() {
            self.validator.ledger_dir = tmp_ledger_dir()?;
        }
        Ok(())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Validator config overrides
        if let Some(url) = env_override::<Url>("AMMAN_JSON_RPC_URL") {
            self.validator.json_rpc_url = url;
        }
        if let Ok(raw) = std::env::var("AMMAN_WEBSOCKET_URL") {
            if raw.is_empty() {
                self.validator.websocket_url = None;
            } else if let Some(url) = parse_override::<Url>("AMMAN_WEBSOCKET_URL", &raw) {
                self.validator.websocket_url = Some(url);
            }
        }
        if let Ok(dir) = std::env::var("AMMAN_LEDGER_DIR") {
            self.validator.ledger_dir = PathBuf::from(dir);
        }
        if let Some(commitment) = env_override("AMMAN_COMMITMENT") {
            self.validator.commitment = commitment;
        }
        if let Some(reset) = env_override("AMMAN_RESET_LEDGER") {
            self.validator.reset_ledger = reset;
        }
        if let Some(kill) = env_override("AMMAN_KILL_RUNNING_VALIDATORS") {
            self.validator.kill_running_validators = kill;
        }
        if let Some(verify) = env_override("AMMAN_VERIFY_FEES") {
            self.validator.verify_fees = verify;
        }

        // Relay config overrides
        if let Some(enabled) = env_override("AMMAN_RELAY_ENABLED") {
            self.relay.enabled = enabled;
        }
        if let Some(kill) = env_override("AMMAN_KILL_RUNNING_RELAY") {
            self.relay.kill_running_relay = kill;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        // Validate endpoints
        if !matches!(self.validator.json_rpc_url.scheme(), "http" | "https") {
            return Err(AmmanError::Configuration(format!(
                "JSON RPC URL must use http or https: {}",
                self.validator.json_rpc_url
            )));
        }
        if let Some(url) = &self.validator.websocket_url {
            if !matches!(url.scheme(), "ws" | "wss") {
                return Err(AmmanError::Configuration(format!(
                    "Websocket URL must use ws or wss: {}",
                    url
                )));
            }
        }

        if self.validator.ledger_dir.as_os_str().is_empty() {
            return Err(AmmanError::Configuration(
                "Ledger directory cannot be empty".to_string(),
            ));
        }

        // Validate program registration
        self.programs.validate()?;
        if self.validator.programs != self.programs {
            return Err(AmmanError::Configuration(
                "Validator programs must match the registered programs".to_string(),
            ));
        }

        Ok(())
    }
}

/// Programs table written under `[validator]`, which deserialization skips
fn shadowed_validator_programs(document: &toml::Table) -> Option<ProgramRegistry> {
    let table = document.get("validator")?.get("programs")?.clone();
    match table.try_into() {
        Ok(registry) => Some(registry),
        Err(e) => {
            warn!(error = %e, "Ignoring malformed [validator.programs]");
            None
        }
    }
}

fn env_override<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    parse_override(key, &raw)
}

fn parse_override<T: FromStr>(key: &str, raw: &str) -> Option<T> {
    match raw.parse() {
        Ok(value) => {
            debug!(key, value = raw, "Applied environment override");
            Some(value)
        }
        Err(_) => {
            warn!(key, value = raw, "Ignoring unparseable environment override");
            None
        }
    }
}

/// Serde adapters writing endpoints without the root slash `Url` appends
mod endpoint {
    use crate::localnet::endpoint_str;
    use serde::Serializer;
    use url::Url;

    pub fn serialize<S: Serializer>(url: &Url, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(endpoint_str(url))
    }

    /// `None` maps to and from the empty string
    pub mod optional {
        use super::endpoint_str;
        use serde::{de, Deserialize, Deserializer, Serializer};
        use url::Url;

        pub fn serialize<S: Serializer>(
            url: &Option<Url>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(url.as_ref().map(endpoint_str).unwrap_or(""))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Url>, D::Error> {
            let raw = String::deserialize(deserializer)?;
            if raw.is_empty() {
                return Ok(None);
            }
            Url::parse(&raw).map(Some).map_err(de::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::localnet::{endpoint_str, LOCALHOST_WS};
    use std::env;

    fn test_config() -> AmmanConfig {
        let mut config = AmmanConfig::default();
        config.validator.ledger_dir = PathBuf::from("/tmp/amman-ledger-test");
        config
    }

    #[test]
    fn test_default_config() {
        let config = test_config();

        assert!(config.programs.is_empty());
        assert!(Arc::ptr_eq(&config.programs, &config.validator.programs));
        assert!(config.validator.kill_running_validators);
        assert_eq!(config.validator.commitment, Commitment::SingleGossip);
        assert!(config.validator.reset_ledger);
        assert!(!config.validator.verify_fees);
        assert_eq!(endpoint_str(&config.validator.json_rpc_url), LOCALHOST);
        assert!(!config.websocket_enabled());
        assert!(config.relay.enabled);
        assert!(config.relay.kill_running_relay);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_has_no_ledger_dir() {
        let config = AmmanConfig::default();

        assert!(config.validator.ledger_dir.as_os_str().is_empty());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_rpc_scheme() {
        let mut config = test_config();
        config.validator.json_rpc_url = Url::parse(LOCALHOST_WS).unwrap();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_websocket_scheme() {
        let mut config = test_config();
        config.validator.websocket_url = Some(Url::parse(LOCALHOST).unwrap());
        assert!(config.validate().is_err());

        config.validator.websocket_url = Some(Url::parse(LOCALHOST_WS).unwrap());
        assert!(config.validate().is_ok());
        assert!(config.websocket_enabled());
    }

    #[test]
    fn test_config_validation_program_drift() {
        let mut config = test_config();
        let mut drifted = ProgramRegistry::new();
        drifted.register("stray");
        config.validator.programs = Arc::new(drifted);

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Validator programs"));
    }

    #[test]
    fn test_with_programs_keeps_views_shared() {
        let mut registry = ProgramRegistry::new();
        registry.register("token_metadata");

        let config = test_config().with_programs(registry);

        assert_eq!(config.programs.len(), 1);
        assert!(Arc::ptr_eq(&config.programs, &config.validator.programs));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_override_commitment() {
        env::set_var("AMMAN_COMMITMENT", "finalized");

        let mut config = test_config();
        config.apply_env_overrides();

        assert_eq!(config.validator.commitment, Commitment::Finalized);

        env::remove_var("AMMAN_COMMITMENT");
    }

    #[test]
    fn test_env_override_relay_enabled() {
        env::set_var("AMMAN_RELAY_ENABLED", "false");

        let mut config = test_config();
        config.apply_env_overrides();

        assert!(!config.relay.enabled);

        env::remove_var("AMMAN_RELAY_ENABLED");
    }

    #[test]
    fn test_env_override_unparseable_is_ignored() {
        env::set_var("AMMAN_VERIFY_FEES", "sometimes");

        let mut config = test_config();
        config.apply_env_overrides();

        assert!(!config.validator.verify_fees);

        env::remove_var("AMMAN_VERIFY_FEES");
    }

    #[test]
    fn test_env_override_websocket_url() {
        env::set_var("AMMAN_WEBSOCKET_URL", LOCALHOST_WS);

        let mut config = test_config();
        config.apply_env_overrides();

        assert_eq!(
            config.validator.websocket_url.as_ref().map(endpoint_str),
            Some(LOCALHOST_WS)
        );

        env::remove_var("AMMAN_WEBSOCKET_URL");
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = AmmanConfig::parse(
            r#"
            [validator]
            commitment = "confirmed"
            verifyFees = true

            [relay]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.validator.commitment, Commitment::Confirmed);
        assert!(config.validator.verify_fees);
        assert!(config.validator.reset_ledger);
        assert!(!config.relay.enabled);
        assert!(config.relay.kill_running_relay);
    }

    #[test]
    fn test_parse_links_programs() {
        let config = AmmanConfig::parse(
            r#"
            [programs]
            vault = "/programs/vault.so"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.validator.programs.get("vault"),
            Some(Path::new("/programs/vault.so"))
        );
        assert!(Arc::ptr_eq(&config.programs, &config.validator.programs));
    }

    #[test]
    fn test_parse_ignores_validator_programs_table() {
        let document: toml::Table = r#"
            [validator.programs]
            stray = "/x.so"
            "#
        .parse()
        .unwrap();

        let shadowed = shadowed_validator_programs(&document).unwrap();
        assert_eq!(shadowed.get("stray"), Some(Path::new("/x.so")));

        let config = AmmanConfig::parse(
            r#"
            [validator.programs]
            stray = "/x.so"
            "#,
        )
        .unwrap();

        assert!(config.programs.is_empty());
        assert!(config.validator.programs.is_empty());
        assert!(Arc::ptr_eq(&config.programs, &config.validator.programs));
    }

    #[test]
    fn test_no_shadowed_programs_without_table() {
        let document: toml::Table = "[validator]\nresetLedger = false\n".parse().unwrap();

        assert!(shadowed_validator_programs(&document).is_none());
    }

    #[test]
    fn test_parse_malformed_url() {
        let result = AmmanConfig::parse(
            r#"
            [validator]
            jsonRpcUrl = "::bad"
            "#,
        );

        match result {
            Err(AmmanError::Configuration(message)) => {
                assert!(message.contains("relative URL without a base"))
            }
            other => panic!("expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_unknown_commitment() {
        let result = AmmanConfig::parse(
            r#"
            [validator]
            commitment = "eventually"
            "#,
        );

        assert!(matches!(result, Err(AmmanError::Configuration(_))));
    }

    #[test]
    fn test_config_serialization() {
        let config = test_config();

        // Test TOML serialization
        let toml_str = config.to_toml().unwrap();
        let deserialized = AmmanConfig::parse(&toml_str).unwrap();

        assert_eq!(deserialized, config);
    }

    #[test]
    fn test_json_shape() {
        let config = test_config();
        let json: serde_json::Value = serde_json::from_str(&config.to_json().unwrap()).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "programs": {},
                "validator": {
                    "killRunningValidators": true,
                    "programs": {},
                    "commitment": "singleGossip",
                    "resetLedger": true,
                    "verifyFees": false,
                    "jsonRpcUrl": LOCALHOST,
                    "websocketUrl": "",
                    "ledgerDir": "/tmp/amman-ledger-test",
                },
                "relay": {
                    "enabled": true,
                    "killRunningRelay": true,
                },
            })
        );
    }
}
