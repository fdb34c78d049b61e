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

//! The façade tying listeners and queues together.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use super::listener::{Listener, ListenerRegistry};
use super::queue::DispatchQueues;
use super::stats::{DispatcherStats, DispatcherStatsSnapshot};
use super::{EventHandle, EventPayload, EventType};
use crate::config::DispatcherConfig;
use crate::utils::timer::{Clock, Stopwatch, SystemClock};

/// How long a single [`EventDispatcher::broadcast`] may keep delivering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainBudget {
    /// Deliver everything that was queued before the drain started.
    Unbounded,
    /// Stop after the first delivery that ends past this much time.
    Within(Duration),
}

impl DrainBudget {
    /// The millisecond value that [`from_millis`](Self::from_millis) reads as
    /// "no timeout".
    pub const INFINITE_MILLIS: u64 = 0xFFFF_FFFF;

    /// A budget that expires as soon as one event has been delivered.
    pub const IMMEDIATE: DrainBudget = DrainBudget::Within(Duration::ZERO);

    /// Builds a budget from a millisecond count.
    pub fn from_millis(ms: u64) -> Self {
        if ms == Self::INFINITE_MILLIS {
            DrainBudget::Unbounded
        } else {
            DrainBudget::Within(Duration::from_millis(ms))
        }
    }

    fn deadline(self, clock: &dyn Clock) -> Option<Instant> {
        match self {
            DrainBudget::Unbounded => None,
            DrainBudget::Within(budget) => clock.now().checked_add(budget),
        }
    }
}

/// The outcome of one drain cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Every event queued before the drain was delivered.
    pub flushed: bool,
    /// Events taken off the queue and handed to their listeners.
    pub delivered: usize,
    /// Events left over and moved to the head of the next cycle.
    pub carried_over: usize,
    /// Wall time spent in the drain.
    pub elapsed: Duration,
}

impl BroadcastReport {
    fn skipped() -> Self {
        Self {
            flushed: false,
            delivered: 0,
            carried_over: 0,
            elapsed: Duration::ZERO,
        }
    }
}

/// Publish/subscribe hub with immediate and deferred delivery.
///
/// Listeners are registered per [`EventType`] and always invoked in
/// registration order. Events are either fired synchronously with
/// [`fire_event`](Self::fire_event), or queued with
/// [`queue_event`](Self::queue_event) and delivered later by
/// [`broadcast`](Self::broadcast), which preserves queue order across
/// interrupted drains.
///
/// The dispatcher is an ordinary value: the application constructs it and
/// hands it (usually as an `Arc`) to whatever needs to publish or subscribe.
/// Every method takes `&self`. No internal lock is held while a listener
/// runs, so listeners may call back into the dispatcher.
pub struct EventDispatcher<P: EventPayload> {
    listeners: Mutex<ListenerRegistry<P>>,
    queues: Mutex<DispatchQueues<P>>,
    draining: AtomicBool,
    clock: Arc<dyn Clock>,
    config: DispatcherConfig,
    stats: DispatcherStats,
}

/// Ends a drain cycle, including when a listener unwinds out of it.
///
/// Whatever is still waiting in the slot being drained moves to the head of
/// the active queue, so the next `begin_drain` never clears undelivered
/// events. The in-progress flag is released last.
struct DrainGuard<'a, P: EventPayload> {
    draining: &'a AtomicBool,
    queues: &'a Mutex<DispatchQueues<P>>,
    slot: usize,
}

impl<P: EventPayload> DrainGuard<'_, P> {
    fn requeue_remainder(&self) -> usize {
        lock(self.queues).requeue_remainder(self.slot)
    }
}

impl<P: EventPayload> Drop for DrainGuard<'_, P> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            let rescued = self.requeue_remainder();
            if rescued > 0 {
                log::error!(
                    "Listener panicked mid-drain; {rescued} undelivered event(s) kept for the next cycle."
                );
            }
        }
        self.draining.store(false, Ordering::Release);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<P: EventPayload> EventDispatcher<P> {
    /// Creates a dispatcher driven by the system clock.
    ///
    /// ## Arguments
    /// * `config` - Duplicate-registration policy and logging options.
    ///
    /// ## Returns
    /// A dispatcher with no listeners and two empty queues.
    pub fn new(config: DispatcherConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a dispatcher whose drain deadlines are measured on `clock`.
    ///
    /// ## Arguments
    /// * `config` - Duplicate-registration policy and logging options.
    /// * `clock` - The time source read when a drain has a finite budget.
    pub fn with_clock(config: DispatcherConfig, clock: Arc<dyn Clock>) -> Self {
        log::info!(
            "EventDispatcher initialized (duplicates: {:?}).",
            config.duplicate_policy
        );
        Self {
            listeners: Mutex::new(ListenerRegistry::new(config.duplicate_policy)),
            queues: Mutex::new(DispatchQueues::new()),
            draining: AtomicBool::new(false),
            clock,
            config,
            stats: DispatcherStats::default(),
        }
    }

    /// The configuration this dispatcher was built with.
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Registers a closure for `event_type`.
    ///
    /// ## Arguments
    /// * `owner` - The key later passed to [`remove_listener`](Self::remove_listener).
    /// * `event_type` - The category to subscribe to.
    /// * `callback` - Invoked with every event of that category, after any
    ///   listener registered earlier.
    ///
    /// ## Returns
    /// `false` only when the duplicate policy rejects the registration.
    pub fn add_listener<F>(
        &self,
        owner: impl Into<String>,
        event_type: EventType,
        callback: F,
    ) -> bool
    where
        F: Fn(&EventHandle<P>) + Send + Sync + 'static,
    {
        lock(&self.listeners).add(Listener::new(owner, event_type, callback))
    }

    /// Registers a method of `target` for `event_type`.
    ///
    /// The dispatcher only holds a weak reference to `target`; once the
    /// target is dropped its callback is skipped.
    ///
    /// ## Arguments
    /// * `owner` - The key later passed to [`remove_listener`](Self::remove_listener).
    /// * `target` - The receiving object.
    /// * `method` - Called on `target` for every event of `event_type`.
    /// * `event_type` - The category to subscribe to.
    ///
    /// ## Returns
    /// `false` only when the duplicate policy rejects the registration.
    pub fn add_bound_listener<T>(
        &self,
        owner: impl Into<String>,
        target: &Arc<T>,
        method: fn(&T, &EventHandle<P>),
        event_type: EventType,
    ) -> bool
    where
        T: Send + Sync + 'static,
    {
        lock(&self.listeners).add(Listener::bound(owner, event_type, target, method))
    }

    /// Removes the first listener registered by `owner` for `event_type`.
    ///
    /// ## Returns
    /// `true` if a registration was removed; `false` if none matched.
    pub fn remove_listener(&self, owner: &str, event_type: EventType) -> bool {
        lock(&self.listeners).remove(owner, event_type)
    }

    /// Removes every listener registered by `owner`, returning how many.
    pub fn remove_owner(&self, owner: &str) -> usize {
        lock(&self.listeners).remove_owner(owner)
    }

    /// Whether at least one listener is registered for `event_type`.
    pub fn has_listeners(&self, event_type: EventType) -> bool {
        lock(&self.listeners).contains(event_type)
    }

    /// The number of listeners registered for `event_type`.
    pub fn listener_count(&self, event_type: EventType) -> usize {
        lock(&self.listeners).count(event_type)
    }

    /// Delivers `event` to its listeners right now.
    ///
    /// ## Arguments
    /// * `event` - The record handed, unchanged, to every listener of its type.
    ///
    /// ## Returns
    /// `true` if at least one listener was invoked. `false` if nothing
    /// listens for the event's type; the event is then dropped.
    pub fn fire_event(&self, event: &EventHandle<P>) -> bool {
        let listeners = lock(&self.listeners).snapshot(event.event_type());
        let reached = !listeners.is_empty();
        self.stats.record_fire(reached);

        if !reached {
            log::trace!("No listener for '{}'; dropped.", event.name());
            return false;
        }
        self.fan_out(event, &listeners);
        true
    }

    /// Queues `event` for the next [`broadcast`](Self::broadcast).
    ///
    /// ## Arguments
    /// * `event` - The record to append to the active queue.
    ///
    /// ## Returns
    /// `true` once queued. `false`, without queueing, if nothing currently
    /// listens for its type; a listener registered later does not revive a
    /// rejected event.
    pub fn queue_event(&self, event: EventHandle<P>) -> bool {
        let listeners = lock(&self.listeners);
        let accepted = listeners.contains(event.event_type());
        self.stats.record_queue(accepted);

        if !accepted {
            log::trace!("No listener for '{}'; not queued.", event.name());
            return false;
        }
        lock(&self.queues).push(event);
        true
    }

    /// Removes queued events of `event_type` from the active queue.
    ///
    /// Only the earliest match is removed unless `all` is set. Events being
    /// drained by a running broadcast are not affected. The scan does not
    /// require `event_type` to still have listeners, so events queued before
    /// their last listener was removed can still be aborted.
    ///
    /// ## Arguments
    /// * `event_type` - The category to remove.
    /// * `all` - Remove every match instead of only the earliest one.
    ///
    /// ## Returns
    /// `true` if at least one queued event was removed.
    pub fn abort_event(&self, event_type: EventType, all: bool) -> bool {
        let removed = lock(&self.queues).abort(event_type, all);
        if removed > 0 {
            log::debug!("Aborted {removed} queued event(s) of {event_type}.");
            self.stats.record_aborted(removed as u64);
        }
        removed > 0
    }

    /// Delivers queued events until the queue is empty or `budget` runs out.
    ///
    /// See [`broadcast_report`](Self::broadcast_report) for the full contract.
    ///
    /// ## Arguments
    /// * `budget` - How long the drain may keep delivering.
    ///
    /// ## Returns
    /// `true` if every event queued before the call was delivered.
    pub fn broadcast(&self, budget: DrainBudget) -> bool {
        self.broadcast_report(budget).flushed
    }

    /// Runs one drain cycle and reports what it did.
    ///
    /// Events queued while the drain runs, including by listeners, wait for
    /// the next cycle. The budget is checked after each delivered event; a
    /// slow listener is never interrupted. Events left when the budget runs
    /// out move to the head of the active queue in their original order.
    ///
    /// A broadcast started while another is running (for example from a
    /// listener) delivers nothing and reports `flushed == false`. If a
    /// listener panics, the undelivered rest of the drain is kept at the head
    /// of the active queue before the panic propagates.
    ///
    /// ## Arguments
    /// * `budget` - How long the drain may keep delivering.
    ///
    /// ## Returns
    /// A [`BroadcastReport`] with the delivered and carried-over counts.
    pub fn broadcast_report(&self, budget: DrainBudget) -> BroadcastReport {
        if self.draining.swap(true, Ordering::AcqRel) {
            log::warn!("broadcast called while a drain is already running; skipped.");
            return BroadcastReport::skipped();
        }
        let watch = Stopwatch::new();
        let deadline = budget.deadline(self.clock.as_ref());
        let slot = lock(&self.queues).begin_drain();
        let guard = DrainGuard {
            draining: &self.draining,
            queues: &self.queues,
            slot,
        };
        let mut delivered = 0;
        let mut timed_out = false;

        loop {
            let next = lock(&self.queues).pop_front(slot);
            let Some(event) = next else {
                break;
            };

            let listeners = lock(&self.listeners).snapshot(event.event_type());
            self.fan_out(&event, &listeners);
            delivered += 1;

            if deadline.is_some_and(|deadline| self.clock.now() >= deadline) {
                timed_out = true;
                break;
            }
        }

        let carried_over = guard.requeue_remainder();
        drop(guard);
        self.stats.record_delivered(delivered as u64);
        if carried_over > 0 {
            log::warn!(
                "Aborting event processing, time ran out: {carried_over} event(s) carried to the next cycle."
            );
            self.stats.record_timeout(carried_over as u64);
        } else if timed_out {
            log::debug!("Drain budget ran out on the last queued event; nothing carried over.");
        }

        BroadcastReport {
            flushed: carried_over == 0,
            delivered,
            carried_over,
            elapsed: watch.elapsed(),
        }
    }

    /// The number of events waiting for the next broadcast.
    pub fn queued_len(&self) -> usize {
        lock(&self.queues).active_len()
    }

    /// The number of events held across both queues.
    pub fn pending_len(&self) -> usize {
        lock(&self.queues).pending_len()
    }

    /// Reads the lifetime counters.
    pub fn stats(&self) -> DispatcherStatsSnapshot {
        self.stats.snapshot()
    }

    /// Drops every listener and every queued event.
    pub fn clear(&self) {
        let dropped = {
            let mut queues = lock(&self.queues);
            let pending = queues.pending_len();
            queues.clear();
            pending
        };
        lock(&self.listeners).clear();
        log::info!("EventDispatcher cleared ({dropped} queued event(s) dropped).");
    }

    fn fan_out(&self, event: &EventHandle<P>, listeners: &[Arc<Listener<P>>]) {
        for listener in listeners {
            if self.config.log_deliveries {
                log::trace!(
                    "Delivering '{}' ({}) to '{}'.",
                    event.name(),
                    event.event_type(),
                    listener.owner()
                );
            }
            listener.invoke(event);
        }
    }
}

impl<P: EventPayload> Default for EventDispatcher<P> {
    fn default() -> Self {
        Self::new(DispatcherConfig::default())
    }
}

impl<P: EventPayload> Drop for EventDispatcher<P> {
    fn drop(&mut self) {
        let pending = lock(&self.queues).pending_len();
        if pending > 0 {
            log::debug!("EventDispatcher dropped with {pending} undelivered event(s).");
        }
    }
}
