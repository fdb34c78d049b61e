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

//! Game-side event kinds and a test entity that subscribes to them.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use anyhow::Result;
use ember_core::{EngineContext, EventDispatcher, EventHandle, EventPayload, EventType};

/// Every event the sandbox game publishes.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    EntitySpawned { entity: u32 },
    EntityDestroyed { entity: u32 },
}

impl EventPayload for GameEvent {
    fn name(&self) -> &str {
        match self {
            GameEvent::EntitySpawned { .. } => "EntitySpawned",
            GameEvent::EntityDestroyed { .. } => "EntityDestroyed",
        }
    }
}

/// The event categories declared at startup.
#[derive(Debug, Clone, Copy)]
pub struct GameEventTypes {
    pub entity_spawned: EventType,
    pub entity_destroyed: EventType,
}

impl GameEventTypes {
    pub fn declare(context: &EngineContext<GameEvent>) -> Result<Self> {
        Ok(Self {
            entity_spawned: context.declare_event_type()?,
            entity_destroyed: context.declare_event_type()?,
        })
    }
}

/// An entity that wants to hear about destructions.
pub struct TestEntity {
    id: u32,
    destroyed_seen: AtomicU32,
    destroyed: AtomicBool,
}

impl TestEntity {
    pub fn new(id: u32) -> Arc<Self> {
        Arc::new(Self {
            id,
            destroyed_seen: AtomicU32::new(0),
            destroyed: AtomicBool::new(false),
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    fn listener_id(&self) -> String {
        format!("test_entity_{}", self.id)
    }

    pub fn init(self: &Arc<Self>, events: &EventDispatcher<GameEvent>, types: &GameEventTypes) {
        events.add_bound_listener(
            self.listener_id(),
            self,
            Self::on_entity_destroyed,
            types.entity_destroyed,
        );
    }

    pub fn destroy(&self, events: &EventDispatcher<GameEvent>, types: &GameEventTypes) {
        if !events.remove_listener(&self.listener_id(), types.entity_destroyed) {
            log::warn!("Entity {} was not listening.", self.id);
        }
    }

    pub fn destroyed_seen(&self) -> u32 {
        self.destroyed_seen.load(Ordering::Relaxed)
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Relaxed)
    }

    fn on_entity_destroyed(&self, event: &EventHandle<GameEvent>) {
        self.destroyed_seen.fetch_add(1, Ordering::Relaxed);
        if let GameEvent::EntityDestroyed { entity } = event.payload() {
            if *entity == self.id {
                self.destroyed.store(true, Ordering::Relaxed);
                event.set_handled(true);
            }
            log::info!("Entity {} saw '{}' for entity {entity}.", self.id, event.name());
        }
    }
}
