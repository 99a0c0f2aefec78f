use log::{info, warn};

use std::collections::HashMap;

use crate::{
    host::{HostWorld, SyncValue},
    registry::{
        error::RegistryError,
        record::{EntityRecord, FieldRecord},
        RemovedEntity,
    },
    types::{EntityId, FieldName, FunctionName, HostEntity, NetId, PeerId},
};

/// The tracked-entity / tracked-field graph.
///
/// Entities live in an arena indexed by `EntityId`; every live entity sits in
/// exactly one of the `globals` list, the `controllers` list, or some
/// controller's `controlled` list. Arena slots are tombstoned on removal and
/// never reused, so ids stay unique for the registry's lifetime.
pub struct Registry<V> {
    entities: Vec<Option<EntityRecord<V>>>,
    by_host: HashMap<HostEntity, EntityId>,
    globals: Vec<EntityId>,
    controllers: Vec<EntityId>,
    net_id_counter: NetId,
    /// True on the authoritative side (server / no-net); the client never
    /// assigns net ids.
    generate_net_ids: bool,
}

impl<V: SyncValue> Registry<V> {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            by_host: HashMap::new(),
            globals: Vec::new(),
            controllers: Vec::new(),
            net_id_counter: 1,
            generate_net_ids: false,
        }
    }

    pub fn set_generate_net_ids(&mut self, generate: bool) {
        self.generate_net_ids = generate;
    }

    /// Register `host_entity` as a plain (non-controller) entity. Registering
    /// twice returns the existing id.
    pub fn register_entity(&mut self, host_entity: HostEntity) -> EntityId {
        if let Some(entity) = self.by_host.get(&host_entity) {
            return *entity;
        }

        let net_id = self.next_net_id();
        let entity = self.push_record(EntityRecord::new(host_entity, net_id));
        self.globals.push(entity);

        info!("new entity registered, net id: {net_id}, host: {host_entity:?}");
        entity
    }

    /// Register `host_entity` as a controller owned by `owner_peer`.
    pub fn register_controller(
        &mut self,
        host_entity: HostEntity,
        owner_peer: PeerId,
    ) -> Result<EntityId, RegistryError> {
        if let Some(entity) = self.by_host.get(&host_entity).copied() {
            let record = self.record(entity);
            if record.is_controller {
                return Err(RegistryError::ControllerReregistered(host_entity));
            }
            return Err(RegistryError::NotRegisteredAsController(host_entity));
        }

        let net_id = self.next_net_id();
        let mut record = EntityRecord::new(host_entity, net_id);
        record.is_controller = true;
        record.owner_peer = Some(owner_peer);

        let entity = self.push_record(record);
        self.controllers.push(entity);

        info!("new controller registered, net id: {net_id}, peer: {owner_peer}");
        Ok(entity)
    }

    /// Track a field of `host_entity`, registering the entity if needed.
    /// Re-registering an unregistered field re-enables it in place.
    pub fn register_field(
        &mut self,
        host: &dyn HostWorld<Value = V>,
        host_entity: HostEntity,
        name: FieldName,
        skip_rewind: bool,
    ) -> EntityId {
        let entity = self.register_entity(host_entity);
        let generate = self.generate_net_ids;
        let initial = host.get_field(host_entity, &name).map(|v| v.deep_copy());

        let record = self.record_mut(entity);
        match record.find_field(&name) {
            Some(index) => {
                let field = &mut record.fields[index];
                field.skip_rewind = skip_rewind;
                field.enabled = true;
            }
            None => {
                let net_id = if generate {
                    (record.fields.len() + 1) as NetId
                } else {
                    0
                };
                record.fields.push(FieldRecord {
                    net_id,
                    name,
                    last_seen: initial,
                    skip_rewind,
                    enabled: true,
                });
            }
        }
        entity
    }

    /// Stop tracking a field. The record is kept (disabled) so its net id is
    /// never reused.
    pub fn unregister_field(
        &mut self,
        host_entity: HostEntity,
        name: &str,
    ) -> Result<(), RegistryError> {
        let entity = self
            .by_host
            .get(&host_entity)
            .copied()
            .ok_or(RegistryError::UnknownEntity(host_entity))?;

        let record = self.record_mut(entity);
        let index = record
            .find_field(name)
            .ok_or_else(|| RegistryError::UnknownField(host_entity, name.to_string()))?;
        record.fields[index].enabled = false;
        Ok(())
    }

    /// Move `entity` under `controller`, or back into the globals when
    /// `controller` is `None`. Atomic with respect to snapshot generation
    /// under the single-threaded tick model.
    pub fn set_controlled_by(
        &mut self,
        entity: EntityId,
        controller: Option<EntityId>,
    ) -> Result<(), RegistryError> {
        if self.record(entity).is_controller {
            return Err(RegistryError::ControllerControlled);
        }
        if let Some(controller) = controller {
            if !self.record(controller).is_controller {
                return Err(RegistryError::ControlledByNonController);
            }
        }

        if let Some(old) = self.record(entity).controlled_by {
            self.record_mut(old).controlled.retain(|id| *id != entity);
            self.record_mut(entity).controlled_by = None;
            self.globals.push(entity);
        }

        if let Some(controller) = controller {
            self.globals.retain(|id| *id != entity);
            self.record_mut(controller).controlled.push(entity);
            self.record_mut(entity).controlled_by = Some(controller);
        }

        Ok(())
    }

    pub fn register_process(&mut self, host_entity: HostEntity, function: FunctionName) -> EntityId {
        let entity = self.register_entity(host_entity);
        let record = self.record_mut(entity);
        if !record.process_functions.contains(&function) {
            record.process_functions.push(function);
        }
        entity
    }

    pub fn unregister_process(&mut self, host_entity: HostEntity, function: &str) {
        if let Some(entity) = self.by_host.get(&host_entity).copied() {
            self.record_mut(entity)
                .process_functions
                .retain(|f| f != function);
        }
    }

    /// Remove every entity whose host-side object is gone. A removed
    /// controller releases all its controlled entities back into the globals.
    pub fn validate(&mut self, host: &dyn HostWorld<Value = V>) -> Vec<RemovedEntity> {
        let mut removed = Vec::new();

        for slot in &self.entities {
            if let Some(record) = slot {
                if !host.entity_exists(record.host_entity) {
                    removed.push(RemovedEntity {
                        entity: self.by_host[&record.host_entity],
                        host_entity: record.host_entity,
                        was_controller: record.is_controller,
                    });
                }
            }
        }

        for dead in &removed {
            self.remove(dead.entity);
            warn!("entity {:?} disappeared, removed from tracking", dead.host_entity);
        }

        removed
    }

    fn remove(&mut self, entity: EntityId) {
        let Some(record) = self.entities[entity.to_index()].take() else {
            return;
        };

        if let Some(controller) = record.controlled_by {
            if let Some(controller_record) = self.get_mut(controller) {
                controller_record.controlled.retain(|id| *id != entity);
            }
        }
        for controlled in &record.controlled {
            if let Some(controlled_record) = self.get_mut(*controlled) {
                controlled_record.controlled_by = None;
            }
            self.globals.push(*controlled);
        }

        self.by_host.remove(&record.host_entity);
        self.globals.retain(|id| *id != entity);
        self.controllers.retain(|id| *id != entity);
        if record.is_controller {
            for slot in self.entities.iter_mut().flatten() {
                if slot.controlled_by == Some(entity) {
                    slot.controlled_by = None;
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.by_host.clear();
        self.globals.clear();
        self.controllers.clear();
        self.net_id_counter = 1;
    }

    // Lookups

    pub fn get(&self, entity: EntityId) -> Option<&EntityRecord<V>> {
        self.entities.get(entity.to_index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, entity: EntityId) -> Option<&mut EntityRecord<V>> {
        self.entities
            .get_mut(entity.to_index())
            .and_then(Option::as_mut)
    }

    pub fn find_by_host(&self, host_entity: HostEntity) -> Option<EntityId> {
        self.by_host.get(&host_entity).copied()
    }

    pub fn controller_for_peer(&self, peer: PeerId) -> Option<EntityId> {
        self.controllers
            .iter()
            .copied()
            .find(|entity| self.record(*entity).owner_peer == Some(peer))
    }

    /// Every live entity, in registration order.
    pub fn ids(&self) -> Vec<EntityId> {
        self.entities
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|_| EntityId::new(index as u32)))
            .collect()
    }

    pub fn globals(&self) -> &[EntityId] {
        &self.globals
    }

    pub fn controllers(&self) -> &[EntityId] {
        &self.controllers
    }

    // Internal

    fn next_net_id(&mut self) -> NetId {
        if self.generate_net_ids {
            let id = self.net_id_counter;
            self.net_id_counter += 1;
            id
        } else {
            0
        }
    }

    fn push_record(&mut self, record: EntityRecord<V>) -> EntityId {
        let entity = EntityId::new(self.entities.len() as u32);
        self.by_host.insert(record.host_entity, entity);
        self.entities.push(Some(record));
        entity
    }

    fn record(&self, entity: EntityId) -> &EntityRecord<V> {
        self.get(entity).expect("entity id points at a live record")
    }

    fn record_mut(&mut self, entity: EntityId) -> &mut EntityRecord<V> {
        self.get_mut(entity)
            .expect("entity id points at a live record")
    }
}

impl<V: SyncValue> Default for Registry<V> {
    fn default() -> Self {
        Self::new()
    }
}
