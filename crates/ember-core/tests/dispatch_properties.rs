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

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use ember_core::event::EventTypeRegistry;
use ember_core::utils::timer::ManualClock;
use ember_core::{
    DispatcherConfig, DrainBudget, EventDispatcher, EventHandle, EventPayload, EventRecord,
    EventType,
};

// --- Test Setup: a tagged game event and a delivery log ---
#[derive(Debug, Clone, PartialEq)]
enum GameEvent {
    EntityDestroyed { entity: u32 },
    EntitySpawned { entity: u32 },
}

impl EventPayload for GameEvent {
    fn name(&self) -> &str {
        match self {
            GameEvent::EntityDestroyed { .. } => "EntityDestroyed",
            GameEvent::EntitySpawned { .. } => "EntitySpawned",
        }
    }
}

impl GameEvent {
    fn entity(&self) -> u32 {
        match self {
            GameEvent::EntityDestroyed { entity } | GameEvent::EntitySpawned { entity } => *entity,
        }
    }
}

type Deliveries = Arc<Mutex<Vec<(String, u32)>>>;

fn listen(
    dispatcher: &EventDispatcher<GameEvent>,
    deliveries: &Deliveries,
    owner: &str,
    event_type: EventType,
) {
    let deliveries = Arc::clone(deliveries);
    let tag = owner.to_string();
    dispatcher.add_listener(owner, event_type, move |event: &EventHandle<GameEvent>| {
        deliveries
            .lock()
            .unwrap()
            .push((tag.clone(), event.payload().entity()))
    });
}

fn destroyed(event_type: EventType, entity: u32) -> EventHandle<GameEvent> {
    EventRecord::handle(event_type, GameEvent::EntityDestroyed { entity })
}

fn taken(deliveries: &Deliveries) -> Vec<(String, u32)> {
    std::mem::take(&mut *deliveries.lock().unwrap())
}

fn pairs(expected: &[(&str, u32)]) -> Vec<(String, u32)> {
    expected.iter().map(|(o, e)| (o.to_string(), *e)).collect()
}
// ---

#[test]
fn unbounded_drain_preserves_queue_and_registration_order() {
    let types = EventTypeRegistry::new();
    let t = types.generate().unwrap();
    let dispatcher = EventDispatcher::default();
    let deliveries = Deliveries::default();

    listen(&dispatcher, &deliveries, "a", t);
    listen(&dispatcher, &deliveries, "b", t);

    for entity in 0..20 {
        assert!(dispatcher.queue_event(destroyed(t, entity)));
    }
    assert!(dispatcher.broadcast(DrainBudget::Unbounded));

    let expected: Vec<(String, u32)> = (0..20)
        .flat_map(|e| [("a".to_string(), e), ("b".to_string(), e)])
        .collect();
    assert_eq!(taken(&deliveries), expected);
}

#[test]
fn registration_order_survives_interleaved_types() {
    let types = EventTypeRegistry::new();
    let t = types.generate().unwrap();
    let noise: Vec<EventType> = (0..5).map(|_| types.generate().unwrap()).collect();
    let dispatcher = EventDispatcher::default();
    let deliveries = Deliveries::default();

    for (owner, n) in [("A", 0), ("B", 1), ("C", 2)] {
        listen(&dispatcher, &deliveries, owner, t);
        listen(&dispatcher, &deliveries, &format!("noise{n}"), noise[n]);
        listen(&dispatcher, &deliveries, &format!("noise{}", n + 2), noise[n + 2]);
    }

    dispatcher.fire_event(&destroyed(t, 1));
    dispatcher.queue_event(destroyed(t, 2));
    dispatcher.broadcast(DrainBudget::Unbounded);

    assert_eq!(
        taken(&deliveries),
        pairs(&[("A", 1), ("B", 1), ("C", 1), ("A", 2), ("B", 2), ("C", 2)])
    );
}

#[test]
fn zero_listener_types_are_dropped() {
    let types = EventTypeRegistry::new();
    let t = types.generate().unwrap();
    let unheard = types.generate().unwrap();
    let dispatcher = EventDispatcher::default();
    let deliveries = Deliveries::default();
    listen(&dispatcher, &deliveries, "a", t);

    dispatcher.queue_event(destroyed(t, 1));
    let before = dispatcher.queued_len();

    assert!(!dispatcher.queue_event(destroyed(unheard, 2)));
    assert_eq!(dispatcher.queued_len(), before);
    assert!(!dispatcher.fire_event(&destroyed(unheard, 3)));
    assert!(taken(&deliveries).is_empty());
}

#[test]
fn bounded_drain_round_trip() {
    const N: u32 = 8;
    const K: usize = 5;

    let types = EventTypeRegistry::new();
    let t = types.generate().unwrap();
    let clock = Arc::new(ManualClock::with_step(Duration::from_millis(1)));
    let dispatcher = EventDispatcher::with_clock(DispatcherConfig::default(), clock);
    let deliveries = Deliveries::default();
    listen(&dispatcher, &deliveries, "l", t);

    for entity in 0..N {
        dispatcher.queue_event(destroyed(t, entity));
    }

    let report = dispatcher.broadcast_report(DrainBudget::from_millis(K as u64));
    assert!(!report.flushed);
    assert_eq!(report.delivered, K);
    assert_eq!(report.carried_over, N as usize - K);
    let first: Vec<u32> = taken(&deliveries).into_iter().map(|(_, e)| e).collect();
    assert_eq!(first, (0..(K as u32)).collect::<Vec<_>>());

    assert!(dispatcher.broadcast(DrainBudget::from_millis(DrainBudget::INFINITE_MILLIS)));
    let rest: Vec<u32> = taken(&deliveries).into_iter().map(|(_, e)| e).collect();
    assert_eq!(rest, ((K as u32)..N).collect::<Vec<_>>());
}

#[test]
fn immediate_deadline_delivers_one_event_per_cycle() {
    let types = EventTypeRegistry::new();
    let t = types.generate().unwrap();
    let dispatcher = EventDispatcher::default();
    let deliveries = Deliveries::default();
    listen(&dispatcher, &deliveries, "L", t);

    dispatcher.queue_event(destroyed(t, 1));
    dispatcher.queue_event(destroyed(t, 2));

    assert!(!dispatcher.broadcast(DrainBudget::IMMEDIATE));
    assert_eq!(taken(&deliveries), pairs(&[("L", 1)]));

    assert!(dispatcher.broadcast(DrainBudget::Unbounded));
    assert_eq!(taken(&deliveries), pairs(&[("L", 2)]));
}

#[test]
fn abort_removes_earliest_or_all_matches() {
    let types = EventTypeRegistry::new();
    let destroy = types.generate().unwrap();
    let spawn = types.generate().unwrap();
    let dispatcher = EventDispatcher::default();
    let deliveries = Deliveries::default();
    listen(&dispatcher, &deliveries, "d", destroy);
    listen(&dispatcher, &deliveries, "s", spawn);

    let spawned = |entity| EventRecord::handle(spawn, GameEvent::EntitySpawned { entity });

    dispatcher.queue_event(spawned(1));
    dispatcher.queue_event(destroyed(destroy, 2));
    dispatcher.queue_event(destroyed(destroy, 3));
    dispatcher.queue_event(spawned(4));

    assert!(dispatcher.abort_event(destroy, false));
    dispatcher.broadcast(DrainBudget::Unbounded);
    assert_eq!(taken(&deliveries), pairs(&[("s", 1), ("d", 3), ("s", 4)]));

    dispatcher.queue_event(destroyed(destroy, 5));
    dispatcher.queue_event(spawned(6));
    dispatcher.queue_event(destroyed(destroy, 7));
    assert!(dispatcher.abort_event(destroy, true));
    dispatcher.broadcast(DrainBudget::Unbounded);
    assert_eq!(taken(&deliveries), pairs(&[("s", 6)]));
}

#[test]
fn abort_reaches_events_carried_over_from_a_timed_out_drain() {
    let types = EventTypeRegistry::new();
    let t = types.generate().unwrap();
    let dispatcher = EventDispatcher::default();
    let deliveries = Deliveries::default();
    listen(&dispatcher, &deliveries, "l", t);

    for entity in 1..=3 {
        dispatcher.queue_event(destroyed(t, entity));
    }
    assert!(!dispatcher.broadcast(DrainBudget::IMMEDIATE));
    assert_eq!(dispatcher.queued_len(), 2);

    assert!(dispatcher.abort_event(t, false));
    assert!(dispatcher.broadcast(DrainBudget::Unbounded));
    assert_eq!(taken(&deliveries), pairs(&[("l", 1), ("l", 3)]));
}

#[test]
fn producers_on_other_threads_feed_the_next_drain() {
    let types = EventTypeRegistry::new();
    let t = types.generate().unwrap();
    let dispatcher = Arc::new(EventDispatcher::<GameEvent>::default());
    let deliveries = Deliveries::default();
    listen(&dispatcher, &deliveries, "l", t);

    let producers: Vec<_> = (0..4u32)
        .map(|p| {
            let dispatcher = Arc::clone(&dispatcher);
            thread::spawn(move || {
                for i in 0..50 {
                    assert!(dispatcher.queue_event(destroyed(t, p * 1000 + i)));
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().expect("Producer thread panicked");
    }

    assert!(dispatcher.broadcast(DrainBudget::Unbounded));
    let delivered = taken(&deliveries);
    assert_eq!(delivered.len(), 200);

    // Each producer's own events keep their relative order.
    for p in 0..4u32 {
        let mine: Vec<u32> = delivered
            .iter()
            .map(|(_, e)| *e)
            .filter(|e| e / 1000 == p)
            .collect();
        assert_eq!(mine, (0..50).map(|i| p * 1000 + i).collect::<Vec<_>>());
    }
}
