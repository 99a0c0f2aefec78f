use std::collections::HashMap;

use crate::types::{EntityId, FieldName, InputId};

/// The fields of a chosen entity set at a specific input id.
///
/// `input_id == InputId::MAX` marks a snapshot that carries no information for
/// the local player controller; such snapshots are never enqueued.
#[derive(Debug, Clone)]
pub struct Snapshot<V> {
    pub input_id: InputId,
    pub entities: HashMap<EntityId, Vec<(FieldName, V)>>,
}

impl<V: Clone> Snapshot<V> {
    pub fn new() -> Self {
        Self {
            input_id: InputId::MAX,
            entities: HashMap::new(),
        }
    }

    /// Insert or replace one field value of one entity.
    pub fn set_field(&mut self, entity: EntityId, name: &str, value: V) {
        let fields = self.entities.entry(entity).or_default();
        match fields.iter_mut().find(|(field, _)| field == name) {
            Some((_, slot)) => *slot = value,
            None => fields.push((name.to_string(), value)),
        }
    }

    pub fn fields(&self, entity: EntityId) -> Option<&[(FieldName, V)]> {
        self.entities.get(&entity).map(Vec::as_slice)
    }

    pub fn field(&self, entity: EntityId, name: &str) -> Option<&V> {
        self.fields(entity)?
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }
}

impl<V: Clone> Default for Snapshot<V> {
    fn default() -> Self {
        Self::new()
    }
}
