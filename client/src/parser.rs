use log::{debug, warn};

use netsync_serde::BitReader;
use netsync_shared::{
    EntityHeader, FieldHeader, FieldRecord, HostEntity, HostWorld, InputId, Registry, RpcChannel,
    RpcEndpoint, RpcMethod, SnapshotReadError, SnapshotReader, SyncValue, SERVER_PEER_ID,
};

use crate::client::ClientBackend;

impl<V: SyncValue> ClientBackend<V> {
    /// Decode a state payload into `last_received`, resolving identifiers as
    /// they stream past.
    ///
    /// Entity blocks that cannot be resolved are skipped (after requesting a
    /// full snapshot, once per pass); anything structurally wrong aborts the
    /// whole payload. Returns whether the player controller's input id was
    /// present, which is what makes the snapshot usable for reconciliation.
    pub(crate) fn parse_snapshot(
        &mut self,
        registry: &mut Registry<V>,
        host: &mut dyn HostWorld<Value = V>,
        rpc: &mut dyn RpcEndpoint,
        payload: &[u8],
    ) -> Result<bool, SnapshotReadError> {
        self.need_full_snapshot_notified = false;

        let Some(player_entity) = self.player.as_ref().map(|player| player.entity) else {
            warn!("snapshots can't be received without a tracked player controller");
            return Ok(false);
        };

        let mut reader = SnapshotReader::new(payload)?;
        self.last_received.input_id = InputId::MAX;

        while let Some(header) = reader.next_entity()? {
            let net_id = header.net_id();

            let host_entity = match &header {
                EntityHeader::Verbose { path, .. } => {
                    // Associate the id with the path for future short headers.
                    self.node_paths.insert(net_id, path.clone());
                    host.resolve_path(path)
                }
                EntityHeader::Short { .. } => self.resolve_short(registry, host, rpc, net_id),
            };

            let Some(host_entity) = host_entity else {
                // The input-id flag is part of the block structure, consume it.
                reader.input_id()?;
                reader.skip_entity()?;
                debug!("entity with net id {net_id} doesn't exist on this client, block skipped");
                continue;
            };

            let entity = match registry.find_by_host(host_entity) {
                Some(entity) => entity,
                None => registry.register_entity(host_entity),
            };
            if let Some(record) = registry.get_mut(entity) {
                // Adopt the server-assigned identity.
                record.net_id = net_id;
            }
            self.node_id_map.insert(net_id, entity);

            let is_controller = registry
                .get(entity)
                .map(|record| record.is_controller)
                .unwrap_or(false);

            match (is_controller, reader.input_id()?) {
                (true, Some(input_id)) => {
                    if entity == player_entity {
                        self.last_received.input_id = input_id;
                    }
                }
                (true, None) => {
                    // The server is always able to send the input id; this
                    // snapshot is corrupted.
                    return Err(SnapshotReadError::MissingControllerInput);
                }
                (false, Some(_)) => {
                    debug!("input id on non-controller {entity:?}, ignored");
                }
                (false, None) => {}
            }

            self.last_received.entities.entry(entity).or_default();

            while let Some(field_header) = reader.next_field()? {
                let name = match field_header {
                    FieldHeader::Verbose { net_id: field_id, name } => {
                        let Some(record) = registry.get_mut(entity) else {
                            reader.value_bytes()?;
                            continue;
                        };
                        match record.find_field(&name) {
                            Some(index) => record.fields[index].net_id = field_id,
                            None => {
                                // Not registered locally: keep a disabled
                                // placeholder so the id resolves next time.
                                record.fields.push(FieldRecord {
                                    net_id: field_id,
                                    name: name.clone(),
                                    last_seen: None,
                                    skip_rewind: false,
                                    enabled: false,
                                });
                            }
                        }
                        name
                    }
                    FieldHeader::Short { net_id: field_id } => {
                        let found = registry.get(entity).and_then(|record| {
                            record
                                .find_field_by_net_id(field_id)
                                .map(|index| record.fields[index].name.clone())
                        });
                        match found {
                            Some(name) => name,
                            None => {
                                warn!("field id {field_id} is not known by this peer");
                                self.notify_full_snapshot_needed(rpc);
                                reader.value_bytes()?;
                                continue;
                            }
                        }
                    }
                };

                let bytes = reader.value_bytes()?;
                let value = V::decode(&mut BitReader::new(&bytes))
                    .map_err(SnapshotReadError::Malformed)?;
                self.last_received.set_field(entity, &name, value);
            }
        }

        if self.last_received.input_id == InputId::MAX {
            debug!("the player controller was not part of the received snapshot");
            Ok(false)
        } else {
            Ok(true)
        }
    }

    fn resolve_short(
        &mut self,
        registry: &Registry<V>,
        host: &dyn HostWorld<Value = V>,
        rpc: &mut dyn RpcEndpoint,
        net_id: u32,
    ) -> Option<HostEntity> {
        if let Some(entity) = self.node_id_map.get(&net_id).copied() {
            if let Some(record) = registry.get(entity) {
                if host.entity_exists(record.host_entity) {
                    return Some(record.host_entity);
                }
            }
            // This entity doesn't exist anymore.
            self.node_id_map.remove(&net_id);
        }

        if let Some(path) = self.node_paths.get(&net_id) {
            return host.resolve_path(path);
        }

        warn!("net id {net_id} is not known by this peer");
        self.notify_full_snapshot_needed(rpc);
        None
    }

    /// Ask the server for a full snapshot, at most once per parsing pass.
    fn notify_full_snapshot_needed(&mut self, rpc: &mut dyn RpcEndpoint) {
        if self.need_full_snapshot_notified {
            return;
        }
        self.need_full_snapshot_notified = true;
        rpc.send(
            SERVER_PEER_ID,
            RpcChannel::Reliable,
            RpcMethod::NotifyNeedFullSnapshot,
            Vec::new(),
        );
    }
}
