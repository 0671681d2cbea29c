// SPDX-License-Identifier: MIT OR Apache-2.0
//! Designer configuration.
//!
//! Settings are stored as RON. Every field has a default so partial files
//! are accepted.

use room_designer_core::{ReconcileOptions, RoomSize, DEFAULT_CAPACITY};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default tracing filter directive
pub const DEFAULT_LOG_FILTER: &str = "room_designer_app=debug,room_designer_core=info";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid RON
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Serializing the settings failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] ron::Error),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Designer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignerConfig {
    /// Number of undo steps kept
    pub history_capacity: usize,
    /// Skip transform edits for meshes that did not move
    pub skip_unchanged_transforms: bool,
    /// Room created for a new document
    pub default_room: RoomSize,
    /// Tracing filter used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for DesignerConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_CAPACITY,
            skip_unchanged_transforms: true,
            default_room: RoomSize::default(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl DesignerConfig {
    /// Parse settings from a RON string
    pub fn from_ron(source: &str) -> Result<Self> {
        Ok(ron::from_str(source)?)
    }

    /// Serialize settings to a RON string
    pub fn to_ron(&self) -> Result<String> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        let config = Self::from_ron(&source)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load settings from a file, or use the defaults when no file is given
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Reconciliation options derived from these settings
    pub fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            skip_unchanged_transforms: self.skip_unchanged_transforms,
        }
    }
}
