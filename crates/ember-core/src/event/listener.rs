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

//! Per-type ordered collections of listener callbacks.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use super::{EventHandle, EventType};
use crate::config::DuplicatePolicy;

/// The callable stored for a registration.
pub type ListenerFn<P> = Arc<dyn Fn(&EventHandle<P>) + Send + Sync>;

/// One registration: an owner id, the type it subscribes to, and its callback.
pub struct Listener<P> {
    owner: String,
    event_type: EventType,
    callback: ListenerFn<P>,
}

impl<P> Listener<P> {
    /// Creates a registration from any closure.
    pub fn new<F>(owner: impl Into<String>, event_type: EventType, callback: F) -> Self
    where
        F: Fn(&EventHandle<P>) + Send + Sync + 'static,
    {
        Self {
            owner: owner.into(),
            event_type,
            callback: Arc::new(callback),
        }
    }

    /// Creates a registration bound to a method of `target`.
    ///
    /// Only a weak reference to `target` is kept. Once the target is dropped
    /// the callback becomes a no-op.
    pub fn bound<T>(
        owner: impl Into<String>,
        event_type: EventType,
        target: &Arc<T>,
        method: fn(&T, &EventHandle<P>),
    ) -> Self
    where
        T: Send + Sync + 'static,
        P: 'static,
    {
        let target: Weak<T> = Arc::downgrade(target);
        let owner = owner.into();
        let label = owner.clone();
        Self::new(owner, event_type, move |event: &EventHandle<P>| {
            match target.upgrade() {
                Some(target) => method(&target, event),
                None => log::trace!("Listener '{label}' outlived its receiver; skipping."),
            }
        })
    }

    /// The caller-assigned owner id, used as the removal key.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// The event type this listener subscribes to.
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Invokes the callback.
    #[inline]
    pub fn invoke(&self, event: &EventHandle<P>) {
        (self.callback)(event)
    }
}

impl<P> fmt::Debug for Listener<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("owner", &self.owner)
            .field("event_type", &self.event_type)
            .finish_non_exhaustive()
    }
}

/// Maps each [`EventType`] to its listeners in registration order.
///
/// A type with no registrations has no entry, so [`contains`](Self::contains)
/// always means "at least one listener".
pub struct ListenerRegistry<P> {
    listeners: HashMap<EventType, Vec<Arc<Listener<P>>>>,
    policy: DuplicatePolicy,
}

impl<P> ListenerRegistry<P> {
    /// Creates an empty registry.
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            listeners: HashMap::new(),
            policy,
        }
    }

    /// Appends a registration, honouring the duplicate policy.
    ///
    /// Returns `false` only when the policy is [`DuplicatePolicy::Reject`] and
    /// the owner id is already registered for the same type.
    pub fn add(&mut self, listener: Listener<P>) -> bool {
        let list = self.listeners.entry(listener.event_type).or_default();
        let existing = list.iter().position(|l| l.owner == listener.owner);

        match (existing, self.policy) {
            (Some(_), DuplicatePolicy::Reject) => {
                log::warn!(
                    "Listener '{}' is already registered for {}; rejected.",
                    listener.owner,
                    listener.event_type
                );
                false
            }
            (Some(index), DuplicatePolicy::Replace) => {
                log::debug!(
                    "Replacing listener '{}' for {}.",
                    listener.owner,
                    listener.event_type
                );
                list[index] = Arc::new(listener);
                true
            }
            _ => {
                log::debug!(
                    "Adding listener '{}' for {}.",
                    listener.owner,
                    listener.event_type
                );
                list.push(Arc::new(listener));
                true
            }
        }
    }

    /// Removes the first registration of `owner` for `event_type`.
    pub fn remove(&mut self, owner: &str, event_type: EventType) -> bool {
        let Some(list) = self.listeners.get_mut(&event_type) else {
            return false;
        };
        let Some(index) = list.iter().position(|l| l.owner == owner) else {
            return false;
        };

        list.remove(index);
        if list.is_empty() {
            self.listeners.remove(&event_type);
        }
        log::debug!("Removed listener '{owner}' for {event_type}.");
        true
    }

    /// Removes every registration of `owner`, across all types.
    pub fn remove_owner(&mut self, owner: &str) -> usize {
        let mut removed = 0;
        self.listeners.retain(|_, list| {
            let before = list.len();
            list.retain(|l| l.owner != owner);
            removed += before - list.len();
            !list.is_empty()
        });
        removed
    }

    /// A copy of the current listener list for `event_type`, in order.
    ///
    /// Fan-out iterates the snapshot so listeners can modify the registry
    /// while being invoked.
    pub fn snapshot(&self, event_type: EventType) -> Vec<Arc<Listener<P>>> {
        self.listeners
            .get(&event_type)
            .cloned()
            .unwrap_or_default()
    }

    /// Whether at least one listener is registered for `event_type`.
    pub fn contains(&self, event_type: EventType) -> bool {
        self.listeners.contains_key(&event_type)
    }

    /// The number of listeners registered for `event_type`.
    pub fn count(&self, event_type: EventType) -> usize {
        self.listeners.get(&event_type).map_or(0, Vec::len)
    }

    /// Drops every registration.
    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventPayload, EventRecord, EventTypeRegistry};
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    struct Ping;

    impl EventPayload for Ping {
        fn name(&self) -> &str {
            "Ping"
        }
    }

    fn owners(registry: &ListenerRegistry<Ping>, event_type: EventType) -> Vec<String> {
        registry
            .snapshot(event_type)
            .iter()
            .map(|l| l.owner().to_string())
            .collect()
    }

    fn noop(owner: &str, event_type: EventType) -> Listener<Ping> {
        Listener::new(owner, event_type, |_| {})
    }

    #[test]
    fn registration_order_is_preserved() {
        let types = EventTypeRegistry::new();
        let t = types.generate().unwrap();
        let other = types.generate().unwrap();
        let mut registry = ListenerRegistry::new(DuplicatePolicy::Allow);

        registry.add(noop("a", t));
        registry.add(noop("x", other));
        registry.add(noop("b", t));
        registry.add(noop("y", other));
        registry.add(noop("c", t));

        assert_eq!(owners(&registry, t), ["a", "b", "c"]);
        assert_eq!(owners(&registry, other), ["x", "y"]);
    }

    #[test]
    fn remove_takes_first_match_only() {
        let types = EventTypeRegistry::new();
        let t = types.generate().unwrap();
        let mut registry = ListenerRegistry::new(DuplicatePolicy::Allow);

        registry.add(noop("a", t));
        registry.add(noop("b", t));
        registry.add(noop("a", t));

        assert!(registry.remove("a", t));
        assert_eq!(owners(&registry, t), ["b", "a"]);
        assert!(!registry.remove("missing", t));
    }

    #[test]
    fn removing_last_listener_drops_the_entry() {
        let types = EventTypeRegistry::new();
        let t = types.generate().unwrap();
        let mut registry = ListenerRegistry::new(DuplicatePolicy::Allow);

        registry.add(noop("a", t));
        assert!(registry.contains(t));
        assert!(registry.remove("a", t));
        assert!(!registry.contains(t));
        assert_eq!(registry.count(t), 0);
        assert!(!registry.remove("a", t));
    }

    #[test]
    fn reject_policy_keeps_the_original() {
        let types = EventTypeRegistry::new();
        let t = types.generate().unwrap();
        let mut registry = ListenerRegistry::new(DuplicatePolicy::Reject);

        assert!(registry.add(noop("a", t)));
        assert!(!registry.add(noop("a", t)));
        assert_eq!(registry.count(t), 1);
    }

    #[test]
    fn replace_policy_keeps_position() {
        let types = EventTypeRegistry::new();
        let t = types.generate().unwrap();
        let mut registry = ListenerRegistry::new(DuplicatePolicy::Replace);
        let hits = Arc::new(Mutex::new(Vec::new()));

        for (owner, tag) in [("a", "a1"), ("b", "b1"), ("a", "a2")] {
            let hits = Arc::clone(&hits);
            assert!(registry.add(Listener::new(owner, t, move |_| {
                hits.lock().unwrap().push(tag)
            })));
        }

        let event = EventRecord::handle(t, Ping);
        for listener in registry.snapshot(t) {
            listener.invoke(&event);
        }
        assert_eq!(*hits.lock().unwrap(), ["a2", "b1"]);
    }

    #[test]
    fn remove_owner_spans_types() {
        let types = EventTypeRegistry::new();
        let t1 = types.generate().unwrap();
        let t2 = types.generate().unwrap();
        let mut registry = ListenerRegistry::new(DuplicatePolicy::Allow);

        registry.add(noop("a", t1));
        registry.add(noop("a", t2));
        registry.add(noop("b", t2));

        assert_eq!(registry.remove_owner("a"), 2);
        assert!(!registry.contains(t1));
        assert_eq!(owners(&registry, t2), ["b"]);
    }

    #[test]
    fn bound_listener_does_not_keep_target_alive() {
        struct Receiver {
            hits: Mutex<u32>,
        }
        impl Receiver {
            fn on_ping(&self, _event: &EventHandle<Ping>) {
                *self.hits.lock().unwrap() += 1;
            }
        }

        let types = EventTypeRegistry::new();
        let t = types.generate().unwrap();
        let receiver = Arc::new(Receiver {
            hits: Mutex::new(0),
        });
        let listener = Listener::bound("receiver", t, &receiver, Receiver::on_ping);
        let event = EventRecord::handle(t, Ping);

        listener.invoke(&event);
        assert_eq!(*receiver.hits.lock().unwrap(), 1);

        let weak = Arc::downgrade(&receiver);
        drop(receiver);
        assert!(weak.upgrade().is_none());
        listener.invoke(&event);
    }
}
