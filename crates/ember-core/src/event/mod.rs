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

//! Typed publish/subscribe event dispatching.
//!
//! Producers wrap a payload in an [`EventRecord`] tagged with an
//! [`EventType`] and hand it to an [`EventDispatcher`], either firing it
//! immediately or queueing it for the next drain cycle. Consumers register
//! listeners per event type; fan-out always follows registration order.
//!
//! Deferred delivery uses a pair of queues. A drain ([`EventDispatcher::broadcast`])
//! switches new arrivals to the idle queue before processing, so each cycle
//! is bounded by what was queued when it began. A drain that runs out of
//! budget moves its remainder to the head of the next cycle, preserving the
//! original queue order.

mod dispatcher;
mod event_type;
mod listener;
mod queue;
mod record;
mod stats;

pub use self::dispatcher::{BroadcastReport, DrainBudget, EventDispatcher};
pub use self::event_type::{generate, EventType, EventTypeRegistry};
pub use self::listener::{Listener, ListenerFn, ListenerRegistry};
pub use self::queue::DispatchQueues;
pub use self::record::{EventHandle, EventPayload, EventRecord};
pub use self::stats::{DispatcherStats, DispatcherStatsSnapshot};
