use log::{debug, warn};

use netsync_shared::{
    ChangeTracker, EntityId, EntityRecord, FieldName, HostWorld, Registry, SyncConfig, SyncValue,
};

use crate::client::{capture_fields, ClientBackend};

impl<V: SyncValue> ClientBackend<V> {
    /// Compare predicted history against authoritative history at the newest
    /// input id both sides know, and correct the client when they disagree.
    ///
    /// Only the local controller is recovered this way; dolls interpolate and
    /// the globals follow the client's reference frame.
    pub(crate) fn reconcile(
        &mut self,
        registry: &mut Registry<V>,
        tracker: &ChangeTracker,
        host: &mut dyn HostWorld<Value = V>,
        config: &SyncConfig,
        delta: f32,
    ) {
        let Some(player_entity) = self.player.as_ref().map(|player| player.entity) else {
            return;
        };
        if self.server_snapshots.is_empty() {
            // Nothing to recover against.
            return;
        }

        // Phase one: find the snapshot to check, the newest input id present
        // in both queues.
        let mut checkable = None;
        if !self.client_snapshots.is_empty() {
            for input_id in self.server_snapshots.ids_newest_first() {
                if self.client_snapshots.contains(input_id) {
                    checkable = Some(input_id);
                    break;
                }
            }
        }
        let Some(checkable) = checkable else {
            return;
        };

        self.server_snapshots.drop_below(checkable);
        self.client_snapshots.drop_below(checkable);

        let Some(server_snapshot) = self.server_snapshots.front().cloned() else {
            return;
        };
        let Some(client_snapshot) = self.client_snapshots.pop_front() else {
            return;
        };

        // Phase two: compare.
        let mut need_recover = false;
        let mut recover_controller = false;
        let mut nodes_to_recover = Vec::new();
        let mut postponed: Vec<(EntityId, Vec<(FieldName, V)>)> = Vec::new();
        let tolerance = config.comparison_float_tolerance;

        for (entity, server_fields) in &server_snapshot.entities {
            let Some(record) = registry.get(*entity) else {
                continue;
            };

            let mut recover_this = false;
            let mut postponed_fields = Vec::new();
            match client_snapshot.fields(*entity) {
                None => {
                    debug!(
                        "rewind needed: the client snapshot doesn't contain {:?}",
                        record.host_entity
                    );
                    recover_this = true;
                }
                Some(client_fields) => {
                    if fields_differ(
                        record,
                        server_fields,
                        client_fields,
                        &mut postponed_fields,
                        tolerance,
                    ) {
                        debug!("rewind needed: {:?} diverged", record.host_entity);
                        recover_this = true;
                    } else if !postponed_fields.is_empty() {
                        postponed.push((*entity, postponed_fields));
                    }
                }
            }

            if recover_this {
                need_recover = true;
                if record.is_controller || record.controlled_by.is_some() {
                    recover_controller = true;
                } else {
                    nodes_to_recover.push(*entity);
                }
            }
        }

        // Phase three: recover and replay.
        if need_recover {
            self.rewind_count += 1;
            debug!(
                "recover input: {checkable} - last input: {}",
                self.player
                    .as_ref()
                    .map(|player| player.controller.last_known_input())
                    .unwrap_or_default()
            );

            if recover_controller {
                // The controller rewinds with its whole controlled set, no
                // matter which of them the difference was found on.
                nodes_to_recover.push(player_entity);
                if let Some(record) = registry.get(player_entity) {
                    nodes_to_recover.extend(record.controlled.iter().copied());
                }
            }

            // Reset to the authoritative state at `checkable`.
            self.reset_in_progress = true;
            for entity in &nodes_to_recover {
                let Some(server_fields) = server_snapshot.fields(*entity) else {
                    warn!(
                        "{entity:?} was not found in the server snapshot, this is not supposed to happen a lot"
                    );
                    continue;
                };
                let Some(record) = registry.get_mut(*entity) else {
                    continue;
                };
                let host_entity = record.host_entity;
                for (name, value) in server_fields {
                    host.set_field(host_entity, name, value.deep_copy());
                    if let Some(index) = record.find_field(name) {
                        record.fields[index].last_seen = Some(value.deep_copy());
                    }
                    host.emit_change(host_entity, name);
                }
            }
            self.reset_in_progress = false;

            // Replay the inputs the server hasn't checked yet, refreshing the
            // stored client snapshots along the way.
            self.rewinding_in_progress = true;
            let remaining = match self.player.as_mut() {
                Some(player) => player.controller.notify_input_checked(checkable),
                None => 0,
            };
            if remaining != self.client_snapshots.len() {
                warn!(
                    "input history ({remaining}) and client snapshot queue ({}) fell out of step",
                    self.client_snapshots.len()
                );
            }

            let player_host_entity = registry.get(player_entity).map(|record| record.host_entity);

            for index in 0..remaining {
                for entity in &nodes_to_recover {
                    let Some(record) = registry.get(*entity) else {
                        continue;
                    };
                    let host_entity = record.host_entity;
                    for function in &record.process_functions {
                        host.process(host_entity, function, delta);
                    }
                }

                if recover_controller {
                    if let (Some(player), Some(host_entity)) =
                        (self.player.as_mut(), player_host_entity)
                    {
                        player
                            .controller
                            .process_instant(index, host, host_entity, delta);
                    }
                }

                for entity in &nodes_to_recover {
                    tracker.pull(registry, *entity, host);
                    if let (Some(snapshot), Some(record)) =
                        (self.client_snapshots.get_mut(index), registry.get(*entity))
                    {
                        snapshot.entities.insert(*entity, capture_fields(record));
                    }
                }
            }
            self.rewinding_in_progress = false;
        } else {
            // Apply the found differences without a rewind.
            self.reset_in_progress = true;
            for (entity, fields) in &postponed {
                let Some(record) = registry.get_mut(*entity) else {
                    continue;
                };
                let host_entity = record.host_entity;
                debug!("partial reset of {host_entity:?}");
                for (name, value) in fields {
                    host.set_field(host_entity, name, value.deep_copy());
                    if let Some(index) = record.find_field(name) {
                        record.fields[index].last_seen = Some(value.deep_copy());
                    }
                    host.emit_change(host_entity, name);
                }
            }
            for (entity, _) in &postponed {
                let Some(record) = registry.get(*entity) else {
                    continue;
                };
                let fields = capture_fields(record);
                if let Some(back) = self.client_snapshots.back_mut() {
                    back.entities.insert(*entity, fields);
                }
            }
            self.reset_in_progress = false;

            if let Some(player) = self.player.as_mut() {
                player.controller.notify_input_checked(checkable);
            }
        }

        self.server_snapshots.pop_front();
    }
}

/// Field-by-field comparison of one entity. Returns whether a rewind-worthy
/// difference exists; differences on `skip_rewind` fields are collected into
/// `postponed` instead.
fn fields_differ<V: SyncValue>(
    record: &EntityRecord<V>,
    server_fields: &[(FieldName, V)],
    client_fields: &[(FieldName, V)],
    postponed: &mut Vec<(FieldName, V)>,
    tolerance: f32,
) -> bool {
    for (name, server_value) in server_fields {
        let Some((_, client_value)) = client_fields.iter().find(|(field, _)| field == name) else {
            debug!("difference on `{name}`: not found in the client snapshot");
            return true;
        };

        if !server_value.equal_approx(client_value, tolerance) {
            let skip_rewind = record
                .find_field(name)
                .map(|index| record.fields[index].skip_rewind)
                .unwrap_or(false);

            if skip_rewind {
                postponed.push((name.clone(), server_value.deep_copy()));
            } else {
                debug!("difference on `{name}`: server {server_value:?}, client {client_value:?}");
                return true;
            }
        }
    }

    false
}
