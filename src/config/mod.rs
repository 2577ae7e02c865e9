//! Configuration module for the local test validator and its relay
//!
//! This module contains the configuration record handed to the validator
//! orchestrator, along with its TOML loader and validation rules.

mod settings;

pub use settings::{amman_config, AmmanConfig, RelayConfig, ValidatorConfig};
