use crate::{
    host::{HostWorld, SyncValue},
    registry::registry::Registry,
    types::{EntityId, FieldName},
};

/// Polling change detection. Each tick, every enabled field's current host
/// value is compared against the copy taken at the end of the previous tick.
pub struct ChangeTracker {
    tolerance: f32,
}

impl ChangeTracker {
    pub fn new(tolerance: f32) -> Self {
        Self { tolerance }
    }

    pub fn set_tolerance(&mut self, tolerance: f32) {
        self.tolerance = tolerance;
    }

    /// Compare every enabled field of `entity` with its last seen value.
    /// On difference: store a deep copy, fan out the host change signal, and
    /// report the field name to the caller.
    pub fn pull<V: SyncValue>(
        &self,
        registry: &mut Registry<V>,
        entity: EntityId,
        host: &mut dyn HostWorld<Value = V>,
    ) -> Vec<FieldName> {
        let mut changed = Vec::new();

        let Some(record) = registry.get_mut(entity) else {
            return changed;
        };
        let host_entity = record.host_entity;

        for field in record.fields.iter_mut() {
            if !field.enabled {
                continue;
            }

            let Some(new_value) = host.get_field(host_entity, &field.name) else {
                continue;
            };

            let differs = match &field.last_seen {
                Some(old_value) => !old_value.equal_approx(&new_value, self.tolerance),
                None => true,
            };

            if differs {
                field.last_seen = Some(new_value.deep_copy());
                host.emit_change(host_entity, &field.name);
                changed.push(field.name.clone());
            }
        }

        changed
    }
}
