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

mod game;

use anyhow::{Context, Result};
use ember_core::{EngineConfig, EngineContext, EventRecord};

use crate::game::{GameEvent, GameEventTypes, TestEntity};

const FRAMES: u32 = 5;
const ENTITIES: u32 = 4;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::from_file(&path)
            .with_context(|| format!("loading engine config from '{path}'"))?,
        None => EngineConfig::default(),
    };

    let context = EngineContext::<GameEvent>::new(config);
    let types = GameEventTypes::declare(&context)?;
    let events = context.events();

    let entities: Vec<_> = (0..ENTITIES).map(TestEntity::new).collect();
    for entity in &entities {
        entity.init(&events, &types);
    }
    events.add_listener("spawn_logger", types.entity_spawned, |event| {
        log::info!("'{}' fired immediately.", event.name());
    });

    for frame in 0..FRAMES {
        events.fire_event(&EventRecord::handle(
            types.entity_spawned,
            GameEvent::EntitySpawned { entity: ENTITIES + frame },
        ));

        let victim = frame % ENTITIES;
        let event = EventRecord::handle(
            types.entity_destroyed,
            GameEvent::EntityDestroyed { entity: victim },
        );
        event.set_timestamp(f64::from(frame) / 60.0);
        events.queue_event(event);

        let report = events.broadcast_report(context.frame_budget());
        log::info!(
            "Frame {frame}: delivered {}, carried over {}, flushed: {} ({:?}).",
            report.delivered,
            report.carried_over,
            report.flushed,
            report.elapsed
        );
    }

    for entity in &entities {
        log::info!(
            "Entity {} heard {} destruction(s); destroyed: {}.",
            entity.id(),
            entity.destroyed_seen(),
            entity.is_destroyed()
        );
        entity.destroy(&events, &types);
    }

    let stats = events.stats();
    log::info!(
        "Dispatcher stats: fired {}, queued {}, delivered {}, timeouts {}.",
        stats.fired,
        stats.queued,
        stats.delivered,
        stats.timeouts
    );
    context.shutdown();
    Ok(())
}
