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

//! Error types for the event and configuration layers.
//!
//! Dispatch operations themselves report success through `bool` results; the
//! errors here cover the conditions a caller must be able to detect and react
//! to rather than silently ignore.

use std::path::PathBuf;

use thiserror::Error;

use crate::event::EventType;

/// Errors raised by the event layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventError {
    /// The registry has handed out every id below [`EventType::SENTINEL`].
    #[error("event type space exhausted after {issued} ids (sentinel {sentinel})")]
    TypeSpaceExhausted {
        /// The number of ids issued by the registry.
        issued: u64,
        /// The reserved value that can never be issued.
        sentinel: EventType,
    },
}

/// Errors raised while loading or saving engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read or written.
    #[error("failed to access config file '{path}': {source}")]
    Io {
        /// The file that was being accessed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The configuration could not be parsed or serialized.
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}
