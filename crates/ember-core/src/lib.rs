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

//! # Ember Core
//!
//! Foundational crate for the Ember engine: the typed event dispatcher and
//! the context, configuration, and timing types around it.

#![warn(missing_docs)]

pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod utils;

pub use config::{DispatcherConfig, DuplicatePolicy, EngineConfig};
pub use context::EngineContext;
pub use error::{ConfigError, EventError};
pub use event::{
    BroadcastReport, DrainBudget, EventDispatcher, EventHandle, EventPayload, EventRecord,
    EventType,
};
pub use utils::timer::Stopwatch;
