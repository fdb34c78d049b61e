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

//! Counters describing what a dispatcher has done over its lifetime.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters, updated by the dispatcher as it works.
#[derive(Debug, Default)]
pub struct DispatcherStats {
    fired: AtomicU64,
    fire_dropped: AtomicU64,
    queued: AtomicU64,
    queue_rejected: AtomicU64,
    delivered: AtomicU64,
    aborted: AtomicU64,
    timeouts: AtomicU64,
    carried_over: AtomicU64,
}

/// A point-in-time copy of [`DispatcherStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatcherStatsSnapshot {
    /// Events passed to `fire_event` that reached at least one listener.
    pub fired: u64,
    /// Events passed to `fire_event` with no listener for their type.
    pub fire_dropped: u64,
    /// Events accepted by `queue_event`.
    pub queued: u64,
    /// Events refused by `queue_event` because nothing listened for them.
    pub queue_rejected: u64,
    /// Queued events taken off a queue by a drain.
    pub delivered: u64,
    /// Queued events removed by `abort_event`.
    pub aborted: u64,
    /// Drains that stopped because their budget ran out.
    pub timeouts: u64,
    /// Events moved to the next cycle by interrupted drains.
    pub carried_over: u64,
}

impl DispatcherStats {
    #[inline]
    fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }

    pub(crate) fn record_fire(&self, reached_listener: bool) {
        if reached_listener {
            Self::bump(&self.fired, 1);
        } else {
            Self::bump(&self.fire_dropped, 1);
        }
    }

    pub(crate) fn record_queue(&self, accepted: bool) {
        if accepted {
            Self::bump(&self.queued, 1);
        } else {
            Self::bump(&self.queue_rejected, 1);
        }
    }

    pub(crate) fn record_delivered(&self, count: u64) {
        Self::bump(&self.delivered, count);
    }

    pub(crate) fn record_aborted(&self, count: u64) {
        Self::bump(&self.aborted, count);
    }

    pub(crate) fn record_timeout(&self, carried_over: u64) {
        Self::bump(&self.timeouts, 1);
        Self::bump(&self.carried_over, carried_over);
    }

    /// Reads every counter.
    pub fn snapshot(&self) -> DispatcherStatsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        DispatcherStatsSnapshot {
            fired: load(&self.fired),
            fire_dropped: load(&self.fire_dropped),
            queued: load(&self.queued),
            queue_rejected: load(&self.queue_rejected),
            delivered: load(&self.delivered),
            aborted: load(&self.aborted),
            timeouts: load(&self.timeouts),
            carried_over: load(&self.carried_over),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let stats = DispatcherStats::default();
        stats.record_fire(true);
        stats.record_fire(false);
        stats.record_queue(true);
        stats.record_queue(true);
        stats.record_queue(false);
        stats.record_delivered(2);
        stats.record_aborted(1);
        stats.record_timeout(4);

        assert_eq!(
            stats.snapshot(),
            DispatcherStatsSnapshot {
                fired: 1,
                fire_dropped: 1,
                queued: 2,
                queue_rejected: 1,
                delivered: 2,
                aborted: 1,
                timeouts: 1,
                carried_over: 4,
            }
        );
    }
}
