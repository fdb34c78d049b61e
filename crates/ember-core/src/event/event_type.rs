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

//! Process-unique identifiers for event categories.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::EventError;

/// An opaque identifier for a category of events.
///
/// Ids are issued by an [`EventTypeRegistry`], starting at `1`. The value
/// [`EventType::SENTINEL`] is reserved and never issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventType(u64);

impl EventType {
    /// The reserved id that a registry never hands out.
    pub const SENTINEL: EventType = EventType(0xFFFF_FFFF);

    /// Returns the raw numeric value of this id.
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventType({})", self.0)
    }
}

/// A monotonically increasing source of [`EventType`] ids.
///
/// Generation is lock-free and may be called from any thread.
#[derive(Debug)]
pub struct EventTypeRegistry {
    last: AtomicU64,
}

impl EventTypeRegistry {
    /// Creates a registry whose first generated id is `1`.
    pub const fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    /// Creates a registry that behaves as if `last` ids had already been issued.
    #[cfg(test)]
    pub(crate) const fn starting_after(last: u64) -> Self {
        Self {
            last: AtomicU64::new(last),
        }
    }

    /// Returns the next unused id.
    ///
    /// ## Errors
    /// Returns [`EventError::TypeSpaceExhausted`] once the next id would equal
    /// [`EventType::SENTINEL`]. The registry stays exhausted afterwards.
    pub fn generate(&self) -> Result<EventType, EventError> {
        let sentinel = EventType::SENTINEL.raw();
        self.last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                let next = last + 1;
                (next < sentinel).then_some(next)
            })
            .map(|last| {
                let id = EventType(last + 1);
                log::debug!("Generated {id}.");
                id
            })
            .map_err(|issued| EventError::TypeSpaceExhausted {
                issued,
                sentinel: EventType::SENTINEL,
            })
    }

    /// Returns how many ids this registry has issued so far.
    pub fn issued(&self) -> u64 {
        self.last.load(Ordering::Acquire)
    }
}

impl Default for EventTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_REGISTRY: EventTypeRegistry = EventTypeRegistry::new();

/// Generates an id from the process-wide registry.
///
/// Event kinds declared once at startup use this; subsystems that want an
/// isolated id space own their own [`EventTypeRegistry`].
pub fn generate() -> Result<EventType, EventError> {
    GLOBAL_REGISTRY.generate()
}
