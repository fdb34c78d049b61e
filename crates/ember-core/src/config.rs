// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Engine configuration.
//!
//! Settings are plain serde structures loaded from JSON. Every field has a
//! default, so a partial file only overrides what it names.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::event::DrainBudget;

/// What `add_listener` does when the owner id is already registered for the
/// same event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Append a second, independent registration. Both fire.
    #[default]
    Allow,
    /// Keep the existing registration and report failure.
    Reject,
    /// Swap the callback of the existing registration, keeping its position.
    Replace,
}

/// Settings for an [`EventDispatcher`](crate::event::EventDispatcher).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Handling of repeated owner ids for one event type.
    pub duplicate_policy: DuplicatePolicy,
    /// Time allowed for each per-frame drain, in milliseconds.
    /// `None` drains every queued event each frame.
    pub frame_budget_ms: Option<u64>,
    /// Emit a trace line for every listener invocation.
    pub log_deliveries: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::Allow,
            frame_budget_ms: Some(2),
            log_deliveries: false,
        }
    }
}

impl DispatcherConfig {
    /// The drain budget derived from [`frame_budget_ms`](Self::frame_budget_ms).
    pub fn frame_budget(&self) -> DrainBudget {
        match self.frame_budget_ms {
            Some(ms) => DrainBudget::Within(Duration::from_millis(ms)),
            None => DrainBudget::Unbounded,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Event dispatcher settings.
    pub dispatcher: DispatcherConfig,
}

impl EngineConfig {
    /// Load configuration from a JSON string.
    ///
    /// ## Errors
    /// Returns [`ConfigError::Json`] if `json` is not a valid configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load configuration from a JSON file.
    ///
    /// ## Errors
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Json`] if its content does not parse.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&content)?;
        log::info!("Loaded engine config from '{}'.", path.display());
        Ok(config)
    }

    /// Save configuration to a JSON file.
    ///
    /// ## Errors
    /// Returns [`ConfigError::Io`] if the file cannot be written.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
