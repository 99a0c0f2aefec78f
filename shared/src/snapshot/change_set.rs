use std::collections::{HashMap, HashSet};

use crate::types::{EntityId, FieldName};

/// What one entity accumulated since the last notifying broadcast.
#[derive(Debug, Default, Clone)]
pub struct EntityChange {
    /// The entity itself appeared since the last broadcast; peers need its
    /// verbose header.
    pub not_known_before: bool,
    /// Fields whose value changed.
    pub dirty_fields: HashSet<FieldName>,
    /// Fields that appeared since the last broadcast; peers need their
    /// verbose headers.
    pub unknown_fields: HashSet<FieldName>,
}

/// Server-side accumulator of everything that changed since the last
/// notifying state broadcast. Cleared once a broadcast goes out to all peers.
#[derive(Debug, Default)]
pub struct ChangeSet {
    entities: HashMap<EntityId, EntityChange>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_entity_new(&mut self, entity: EntityId) {
        self.entities.entry(entity).or_default().not_known_before = true;
    }

    pub fn mark_field_new(&mut self, entity: EntityId, name: &str) {
        let change = self.entities.entry(entity).or_default();
        change.dirty_fields.insert(name.to_string());
        change.unknown_fields.insert(name.to_string());
    }

    pub fn mark_field_changed(&mut self, entity: EntityId, name: &str) {
        self.entities
            .entry(entity)
            .or_default()
            .dirty_fields
            .insert(name.to_string());
    }

    pub fn get(&self, entity: EntityId) -> Option<&EntityChange> {
        self.entities.get(&entity)
    }

    pub fn forget_entity(&mut self, entity: EntityId) {
        self.entities.remove(&entity);
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }
}
