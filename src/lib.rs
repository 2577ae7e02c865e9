//! amman-config - Configuration for a local Solana test validator and its relay
//!
//! The [`amman_config`] provider builds the record an orchestrator reads once at
//! startup: which locally built programs to deploy, how to run the validator, and
//! whether to start the companion relay.

pub mod config;
pub mod error;
pub mod localnet;
pub mod logging;
pub mod programs;
pub mod types;

pub use config::{amman_config, AmmanConfig, RelayConfig, ValidatorConfig};
pub use error::{AmmanError, Result};
pub use localnet::{tmp_ledger_dir, LOCALHOST, LOCALHOST_WS};
pub use programs::{local_deploy_dir, local_deploy_path, ProgramRegistry};
pub use types::Commitment;
