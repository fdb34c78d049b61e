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

//! Engine context handed to game-side collaborators.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::error::EventError;
use crate::event::{DrainBudget, EventDispatcher, EventPayload, EventType, EventTypeRegistry};

/// Owns the engine-wide services that collaborators share.
///
/// The dispatcher lives here instead of behind a global, so its lifetime is
/// the context's lifetime and every component receives it explicitly.
pub struct EngineContext<P: EventPayload> {
    config: EngineConfig,
    event_types: EventTypeRegistry,
    events: Arc<EventDispatcher<P>>,
}

impl<P: EventPayload> EngineContext<P> {
    /// Builds a context and its dispatcher from `config`.
    pub fn new(config: EngineConfig) -> Self {
        let events = Arc::new(EventDispatcher::new(config.dispatcher.clone()));
        Self {
            config,
            event_types: EventTypeRegistry::new(),
            events,
        }
    }

    /// The configuration the context was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// A shared handle to the event dispatcher.
    pub fn events(&self) -> Arc<EventDispatcher<P>> {
        Arc::clone(&self.events)
    }

    /// Declares a new event category, unique within this context.
    ///
    /// ## Errors
    /// Returns [`EventError::TypeSpaceExhausted`] once the context's id
    /// space is used up.
    pub fn declare_event_type(&self) -> Result<EventType, EventError> {
        self.event_types.generate()
    }

    /// The drain budget each frame should pass to `broadcast`.
    pub fn frame_budget(&self) -> DrainBudget {
        self.config.dispatcher.frame_budget()
    }

    /// Tears down every listener and queued event.
    pub fn shutdown(&self) {
        log::info!("Shutting down engine context.");
        self.events.clear();
    }
}

impl<P: EventPayload> Default for EngineContext<P> {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
