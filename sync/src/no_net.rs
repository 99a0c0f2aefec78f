use std::collections::HashMap;

use netsync_serde::{BitReader, BitWriter};
use netsync_shared::{ChangeTracker, EntityId, HostEntity, HostWorld, Registry, SyncValue};

/// Offline stand-in for a player controller: captures and applies inputs so
/// gameplay code behaves as it does online, but keeps no history.
pub struct NoNetController {
    frame_id: u64,
}

impl NoNetController {
    pub fn new() -> Self {
        Self { frame_id: 0 }
    }

    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    pub fn process<V: SyncValue>(
        &mut self,
        host: &mut dyn HostWorld<Value = V>,
        host_entity: HostEntity,
        delta: f32,
    ) {
        self.frame_id += 1;

        let mut writer = BitWriter::new();
        host.collect_input(host_entity, delta, &mut writer);
        let buffer = writer.to_bytes();

        let mut reader = BitReader::new(&buffer);
        host.apply_input(host_entity, delta, &mut reader);
    }
}

impl Default for NoNetController {
    fn default() -> Self {
        Self::new()
    }
}

/// Degenerate backend for running without any network peer: the same tick
/// loop as the online modes, with no buffering, no snapshots, and no
/// reconciliation. Host code written against the synchronizer works
/// unchanged offline.
pub struct NoNetBackend {
    controllers: HashMap<EntityId, NoNetController>,
}

impl NoNetBackend {
    pub fn new() -> Self {
        Self {
            controllers: HashMap::new(),
        }
    }

    pub fn on_entity_removed(&mut self, entity: EntityId) {
        self.controllers.remove(&entity);
    }

    pub fn clear(&mut self) {
        self.controllers.clear();
    }

    pub fn process<V: SyncValue>(
        &mut self,
        registry: &mut Registry<V>,
        tracker: &ChangeTracker,
        host: &mut dyn HostWorld<Value = V>,
        delta: f32,
    ) {
        let entities = registry.ids();

        for entity in &entities {
            let Some(record) = registry.get(*entity) else {
                continue;
            };
            let host_entity = record.host_entity;
            for function in &record.process_functions {
                host.process(host_entity, function, delta);
            }
        }

        for entity in registry.controllers().to_vec() {
            let Some(record) = registry.get(entity) else {
                continue;
            };
            let host_entity = record.host_entity;
            self.controllers
                .entry(entity)
                .or_default()
                .process(host, host_entity, delta);
        }

        for entity in &entities {
            tracker.pull(registry, *entity, host);
        }
    }
}

impl Default for NoNetBackend {
    fn default() -> Self {
        Self::new()
    }
}
