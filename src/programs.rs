//! Registry of locally built programs to deploy into the test validator
//!
//! Program artifacts live in a single deploy directory so that relocating them
//! only means changing that directory, not every registry entry.

use crate::error::{AmmanError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory, relative to this crate, holding compiled program artifacts
pub const LOCAL_DEPLOY_DIR_NAME: &str = "test-programs";

/// File extension of a compiled program artifact
pub const PROGRAM_EXTENSION: &str = "so";

/// Directory holding the locally built program binaries
pub fn local_deploy_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(LOCAL_DEPLOY_DIR_NAME)
}

/// Path of the compiled artifact for `program_name` in the local deploy directory
pub fn local_deploy_path(program_name: &str) -> PathBuf {
    deploy_path_in(&local_deploy_dir(), program_name)
}

fn deploy_path_in(deploy_dir: &Path, program_name: &str) -> PathBuf {
    deploy_dir.join(format!("{}.{}", program_name, PROGRAM_EXTENSION))
}

/// Program name to artifact path mapping.
///
/// Serializes as a plain table: `{ "token_metadata": "/path/token_metadata.so" }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgramRegistry {
    programs: BTreeMap<String, PathBuf>,
}

impl ProgramRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a program whose artifact lives in the local deploy directory
    pub fn register(&mut self, program_name: &str) -> &PathBuf {
        self.register_in(&local_deploy_dir(), program_name)
    }

    /// Register a program whose artifact lives in `deploy_dir`
    pub fn register_in(&mut self, deploy_dir: &Path, program_name: &str) -> &PathBuf {
        self.insert(program_name, deploy_path_in(deploy_dir, program_name))
    }

    /// Register a program with an explicit artifact path
    pub fn insert(&mut self, program_name: &str, path: impl Into<PathBuf>) -> &PathBuf {
        let path = path.into();
        debug!(program = program_name, path = %path.display(), "Registered program");
        self.programs.insert(program_name.to_string(), path);
        &self.programs[program_name]
    }

    /// Get the artifact path of a registered program
    pub fn get(&self, program_name: &str) -> Option<&Path> {
        self.programs.get(program_name).map(PathBuf::as_path)
    }

    /// Iterate over registered programs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.programs
            .iter()
            .map(|(name, path)| (name.as_str(), path.as_path()))
    }

    /// Get the number of registered programs
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    /// Check if no program is registered
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Names of registered programs whose artifact file does not exist
    pub fn missing_artifacts(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, path)| !path.is_file())
            .map(|(name, _)| name)
            .collect()
    }

    /// Check that every program name can be used as an artifact file stem
    pub fn validate(&self) -> Result<()> {
        for (name, path) in self.iter() {
            if name.is_empty() {
                return Err(AmmanError::Configuration(
                    "Program name cannot be empty".to_string(),
                ));
            }
            if name.contains(['/', '\\']) {
                return Err(AmmanError::Configuration(format!(
                    "Program name '{}' must not contain path separators",
                    name
                )));
            }
            if path.as_os_str().is_empty() {
                return Err(AmmanError::Configuration(format!(
                    "Program '{}' has an empty artifact path",
                    name
                )));
            }
        }
        Ok(())
    }
}

impl FromIterator<(String, PathBuf)> for ProgramRegistry {
    fn from_iter<I: IntoIterator<Item = (String, PathBuf)>>(iter: I) -> Self {
        Self {
            programs: iter.into_iter().collect(),
        }
    }
}
