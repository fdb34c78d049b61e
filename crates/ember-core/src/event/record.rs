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

//! The payload carried through the dispatcher.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use super::EventType;

/// The data describing one kind of occurrence.
///
/// Usually implemented by a single enum with one variant per event kind, so
/// that a dispatcher can carry every event of a game through one queue.
pub trait EventPayload: Clone + Send + Sync + 'static {
    /// A human-readable name for the event, used in diagnostics.
    fn name(&self) -> &str;
}

/// A shared reference to an [`EventRecord`].
///
/// The same record may be held by a dispatch queue and by any listener that is
/// currently handling it; it is released when the last holder drops it.
pub type EventHandle<P> = Arc<EventRecord<P>>;

/// One occurrence of an event, as delivered to listeners.
///
/// `handled` and `timestamp` are bookkeeping for producers and consumers; the
/// dispatcher never reads them. Both use interior mutability because every
/// listener in a fan-out observes the same record.
pub struct EventRecord<P> {
    event_type: EventType,
    payload: P,
    handled: AtomicBool,
    timestamp: AtomicU64,
}

impl<P: EventPayload> EventRecord<P> {
    /// Creates a record of the given type.
    pub fn new(event_type: EventType, payload: P) -> Self {
        Self {
            event_type,
            payload,
            handled: AtomicBool::new(false),
            timestamp: AtomicU64::new(0f64.to_bits()),
        }
    }

    /// Creates a record and wraps it in a shareable [`EventHandle`].
    pub fn handle(event_type: EventType, payload: P) -> EventHandle<P> {
        Arc::new(Self::new(event_type, payload))
    }

    /// The category this record belongs to.
    #[inline]
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// The payload's human-readable name.
    #[inline]
    pub fn name(&self) -> &str {
        self.payload.name()
    }

    /// The event data.
    #[inline]
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Whether a consumer has flagged this record as handled.
    pub fn is_handled(&self) -> bool {
        self.handled.load(Ordering::Acquire)
    }

    /// Sets the handled flag.
    pub fn set_handled(&self, handled: bool) {
        self.handled.store(handled, Ordering::Release);
    }

    /// The timestamp stored by the producer, in seconds.
    pub fn timestamp(&self) -> f64 {
        f64::from_bits(self.timestamp.load(Ordering::Acquire))
    }

    /// Stores a timestamp, in seconds.
    pub fn set_timestamp(&self, seconds: f64) {
        self.timestamp.store(seconds.to_bits(), Ordering::Release);
    }

    /// Produces an independent deep copy of this record.
    ///
    /// The copy starts with the same flag and timestamp values but shares no
    /// state with the original afterwards.
    pub fn copy(&self) -> EventHandle<P> {
        let copy = Self::new(self.event_type, self.payload.clone());
        copy.set_handled(self.is_handled());
        copy.set_timestamp(self.timestamp());
        Arc::new(copy)
    }
}

impl<P: EventPayload> fmt::Debug for EventRecord<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRecord")
            .field("name", &self.name())
            .field("event_type", &self.event_type)
            .field("handled", &self.is_handled())
            .field("timestamp", &self.timestamp())
            .finish()
    }
}
