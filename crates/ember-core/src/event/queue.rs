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

//! The double-buffered FIFO queues behind deferred delivery.

use std::collections::VecDeque;

use super::{EventHandle, EventPayload, EventType};

const QUEUE_COUNT: usize = 2;

/// A pair of FIFO queues with one "active" slot accepting new events.
///
/// A drain processes the active slot after switching new arrivals to the
/// other one, so events queued while draining wait for the next cycle.
pub struct DispatchQueues<P> {
    queues: [VecDeque<EventHandle<P>>; QUEUE_COUNT],
    active: usize,
}

impl<P: EventPayload> DispatchQueues<P> {
    /// Creates two empty queues with slot `0` active.
    pub fn new() -> Self {
        Self {
            queues: [VecDeque::new(), VecDeque::new()],
            active: 0,
        }
    }

    /// The index of the slot currently accepting events.
    #[inline]
    pub fn active_slot(&self) -> usize {
        self.active
    }

    /// Appends an event to the active queue.
    pub fn push(&mut self, event: EventHandle<P>) {
        self.queues[self.active].push_back(event);
    }

    /// Removes queued events of `event_type` from the active queue.
    ///
    /// Removes only the earliest match unless `all` is set. Returns the number
    /// of events removed.
    pub fn abort(&mut self, event_type: EventType, all: bool) -> usize {
        let queue = &mut self.queues[self.active];
        let mut removed = 0;
        let mut index = 0;
        while index < queue.len() {
            if queue[index].event_type() == event_type {
                queue.remove(index);
                removed += 1;
                if !all {
                    break;
                }
            } else {
                index += 1;
            }
        }
        removed
    }

    /// Starts a drain cycle.
    ///
    /// Returns the slot to process and makes the other slot active, clearing
    /// it first. The new active slot is always empty at this point: the
    /// previous drain emptied it or moved its remainder across, even when a
    /// listener unwound out of that drain.
    pub fn begin_drain(&mut self) -> usize {
        let to_process = self.active;
        self.active = (self.active + 1) % QUEUE_COUNT;
        self.queues[self.active].clear();
        to_process
    }

    /// Pops the front event of `slot`.
    pub fn pop_front(&mut self, slot: usize) -> Option<EventHandle<P>> {
        self.queues[slot].pop_front()
    }

    /// Moves whatever is left in `slot` to the front of the active queue.
    ///
    /// Events are taken from the back of `slot` and pushed onto the front of
    /// the active queue, so they keep their original relative order and run
    /// ahead of anything queued during the interrupted drain. Returns the
    /// number of events moved.
    pub fn requeue_remainder(&mut self, slot: usize) -> usize {
        if slot == self.active {
            return 0;
        }
        let mut moved = 0;
        while let Some(event) = self.queues[slot].pop_back() {
            self.queues[self.active].push_front(event);
            moved += 1;
        }
        moved
    }

    /// The number of events waiting in the active queue.
    pub fn active_len(&self) -> usize {
        self.queues[self.active].len()
    }

    /// The number of events held across both queues.
    pub fn pending_len(&self) -> usize {
        self.queues.iter().map(VecDeque::len).sum()
    }

    /// Whether `slot` has no events left.
    pub fn is_drained(&self, slot: usize) -> bool {
        self.queues[slot].is_empty()
    }

    /// Drops every queued event.
    pub fn clear(&mut self) {
        for queue in &mut self.queues {
            queue.clear();
        }
    }
}

impl<P: EventPayload> Default for DispatchQueues<P> {
    fn default() -> Self {
        Self::new()
    }
}
