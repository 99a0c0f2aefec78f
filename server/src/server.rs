use std::collections::HashMap;

use log::{info, warn};

use netsync_serde::BitWriter;
use netsync_shared::{
    ChangeSet, ChangeTracker, EntityChange, EntityId, EpochPayload, FieldSelection, HostWorld,
    InputId, PeerId, Registry, RpcChannel, RpcEndpoint, RpcMethod, SnapshotWriter, SyncConfig,
    SyncValue,
};

use crate::{controller::ServerController, peer::PeerState, tick_rate::update_tick_rate};

/// The authoritative backend.
///
/// Per tick: dead entities were already removed by the synchronizer, then the
/// scene steps, every controller consumes one input, changes are pulled, each
/// peer's tick rate is adjusted, and state goes out when due.
pub struct ServerBackend {
    peers: HashMap<PeerId, PeerState>,
    controllers: HashMap<EntityId, ServerController>,
    changes: ChangeSet,
    state_notify_timer: f32,
}

impl ServerBackend {
    pub fn new() -> Self {
        Self {
            peers: HashMap::new(),
            controllers: HashMap::new(),
            changes: ChangeSet::new(),
            state_notify_timer: 0.0,
        }
    }

    // Peer lifecycle

    pub fn on_peer_connected(&mut self, peer: PeerId, config: &SyncConfig) {
        if self.peers.contains_key(&peer) {
            warn!("peer {peer} connected twice");
            return;
        }
        info!("peer {peer} connected");
        self.peers
            .insert(peer, PeerState::new(config.network_traced_frames));
    }

    pub fn on_peer_disconnected(&mut self, peer: PeerId) {
        info!("peer {peer} disconnected");
        self.peers.remove(&peer);
    }

    // Registration notifications

    pub fn on_entity_added(&mut self, entity: EntityId) {
        self.changes.mark_entity_new(entity);
    }

    pub fn on_field_added(&mut self, entity: EntityId, name: &str) {
        self.changes.mark_field_new(entity, name);
    }

    pub fn on_entity_removed(&mut self, entity: EntityId) {
        self.changes.forget_entity(entity);
        self.controllers.remove(&entity);
    }

    // RPC ingress

    pub fn receive_inputs<V: SyncValue>(
        &mut self,
        registry: &Registry<V>,
        peer: PeerId,
        payload: &[u8],
        config: &SyncConfig,
    ) {
        let Some(entity) = registry.controller_for_peer(peer) else {
            warn!("peer {peer} sent inputs but has no registered controller");
            return;
        };

        let controller = self.controllers.entry(entity).or_default();
        if let Err(error) =
            controller.receive_inputs(payload, config.server_input_storage_size)
        {
            warn!("peer {peer} sent a bad input packet: {error}");
        }
    }

    pub fn notify_need_full_snapshot(&mut self, peer: PeerId) {
        let Some(state) = self.peers.get_mut(&peer) else {
            warn!("full snapshot requested by unknown peer {peer}");
            return;
        };
        state.need_full_snapshot = true;
    }

    /// Drop accumulated broadcast state. Peers stay connected.
    pub fn clear(&mut self) {
        self.changes.clear();
        self.state_notify_timer = 0.0;
    }

    pub fn force_state_notify(&mut self, config: &SyncConfig) {
        // past the interval by a comfortable margin, immune to float error
        self.state_notify_timer = config.server_notify_state_interval + 1.0;
    }

    /// The server controller's input cursor for `entity`, if one exists yet.
    pub fn controller_input_id(&self, entity: EntityId) -> Option<InputId> {
        self.controllers
            .get(&entity)
            .map(ServerController::current_input_id)
    }

    /// How many ghost inputs `entity`'s controller has synthesized so far.
    pub fn controller_ghost_inputs(&self, entity: EntityId) -> Option<u32> {
        self.controllers
            .get(&entity)
            .map(ServerController::ghost_input_count)
    }

    // Tick

    pub fn process<V: SyncValue>(
        &mut self,
        registry: &mut Registry<V>,
        tracker: &ChangeTracker,
        host: &mut dyn HostWorld<Value = V>,
        rpc: &mut dyn RpcEndpoint,
        config: &SyncConfig,
        delta: f32,
    ) {
        let entities = registry.ids();

        // Step the scene.
        for entity in &entities {
            let Some(record) = registry.get(*entity) else {
                continue;
            };
            let host_entity = record.host_entity;
            for function in &record.process_functions {
                host.process(host_entity, function, delta);
            }
        }

        // Consume one input per controller.
        for entity in registry.controllers().to_vec() {
            let Some(record) = registry.get(entity) else {
                continue;
            };
            let host_entity = record.host_entity;
            let controller = self.controllers.entry(entity).or_default();
            controller.fetch_next_input(host, host_entity, delta);
        }

        // Pull the changes.
        for entity in &entities {
            for name in tracker.pull(registry, *entity, host) {
                self.changes.mark_field_changed(*entity, &name);
            }
        }

        // Adjust every peer's tick rate.
        for (peer_id, peer) in self.peers.iter_mut() {
            let Some(entity) = registry.controller_for_peer(*peer_id) else {
                continue;
            };
            let Some(controller) = self.controllers.get_mut(&entity) else {
                continue;
            };
            if controller.current_input_id() == InputId::MAX {
                continue;
            }

            let packet_missing = controller.take_packet_missing();
            if let Some(quantized) = update_tick_rate(
                peer,
                controller.inputs_count(),
                packet_missing,
                config,
                delta,
            ) {
                rpc.send(
                    *peer_id,
                    RpcChannel::Reliable,
                    RpcMethod::SendTickSpeed,
                    vec![quantized as u8],
                );
            }
        }

        self.broadcast_state(registry, host, rpc, config, delta);
        self.broadcast_epochs(registry, host, rpc);
    }

    // Snapshots

    fn broadcast_state<V: SyncValue>(
        &mut self,
        registry: &Registry<V>,
        host: &dyn HostWorld<Value = V>,
        rpc: &mut dyn RpcEndpoint,
        config: &SyncConfig,
        delta: f32,
    ) {
        if self.peers.is_empty() {
            // No one is listening.
            return;
        }

        self.state_notify_timer += delta;
        let notify_state = self.state_notify_timer >= config.server_notify_state_interval;
        if notify_state {
            self.state_notify_timer = 0.0;
        }

        let any_forced = self.peers.values().any(|peer| peer.force_notify_snapshot);
        if !notify_state && !any_forced {
            return;
        }

        // The global section is identical for every peer on the same
        // full/delta footing; encode each variant at most once.
        let mut full_globals: Option<BitWriter> = None;
        let mut delta_globals: Option<BitWriter> = None;

        let changes = &self.changes;
        let controllers = &self.controllers;

        for (peer_id, peer) in self.peers.iter_mut() {
            if !notify_state && !peer.force_notify_snapshot {
                continue;
            }
            peer.force_notify_snapshot = false;

            let full = peer.need_full_snapshot;
            peer.need_full_snapshot = false;

            let base = if full {
                full_globals
                    .get_or_insert_with(|| Self::encode_globals(registry, host, changes, true))
                    .clone()
            } else {
                delta_globals
                    .get_or_insert_with(|| Self::encode_globals(registry, host, changes, false))
                    .clone()
            };

            let mut writer = SnapshotWriter::resume(base);

            if let Some(entity) = registry.controller_for_peer(*peer_id) {
                let input_id = controllers
                    .get(&entity)
                    .map(ServerController::current_input_id)
                    .unwrap_or(InputId::MAX);

                if input_id != InputId::MAX {
                    Self::encode_entity(
                        &mut writer,
                        registry,
                        host,
                        changes,
                        entity,
                        full,
                        Some(input_id),
                    );
                    let controlled = registry
                        .get(entity)
                        .map(|record| record.controlled.clone())
                        .unwrap_or_default();
                    for controlled_entity in controlled {
                        Self::encode_entity(
                            &mut writer,
                            registry,
                            host,
                            changes,
                            controlled_entity,
                            full,
                            None,
                        );
                    }
                }
            }

            rpc.send(
                *peer_id,
                RpcChannel::Reliable,
                RpcMethod::SendState,
                writer.finish(),
            );
        }

        if notify_state {
            // The state got notified; from here on only fresh changes matter.
            self.changes.clear();
        }
    }

    fn encode_globals<V: SyncValue>(
        registry: &Registry<V>,
        host: &dyn HostWorld<Value = V>,
        changes: &ChangeSet,
        full: bool,
    ) -> BitWriter {
        let mut writer = SnapshotWriter::new();
        for entity in registry.globals() {
            Self::encode_entity(&mut writer, registry, host, changes, *entity, full, None);
        }
        writer.fork()
    }

    fn encode_entity<V: SyncValue>(
        writer: &mut SnapshotWriter,
        registry: &Registry<V>,
        host: &dyn HostWorld<Value = V>,
        changes: &ChangeSet,
        entity: EntityId,
        full: bool,
        input_id: Option<InputId>,
    ) {
        let Some(record) = registry.get(entity) else {
            return;
        };

        let change = changes.get(entity);
        let has_changes = full || change.is_some_and(|c| !c.dirty_fields.is_empty());

        // Controllers are always emitted (their input id anchors the
        // reconciliation); anything else earns its block by having changes.
        if input_id.is_none() && !has_changes {
            return;
        }

        let verbose = full || change.is_some_and(|c| c.not_known_before);
        let path = if verbose {
            let Some(path) = host.entity_path(record.host_entity) else {
                warn!(
                    "{:?} has no resolvable path, left out of the snapshot",
                    record.host_entity
                );
                return;
            };
            Some(path)
        } else {
            None
        };

        let empty_change = EntityChange::default();
        let selection = if full {
            FieldSelection::All
        } else {
            FieldSelection::Dirty(change.unwrap_or(&empty_change))
        };

        writer.write_entity(record, path.as_ref(), input_id, selection);
    }

    // Doll epochs

    fn broadcast_epochs<V: SyncValue>(
        &mut self,
        registry: &Registry<V>,
        host: &mut dyn HostWorld<Value = V>,
        rpc: &mut dyn RpcEndpoint,
    ) {
        if self.peers.len() < 2 {
            return;
        }

        for entity in registry.controllers().to_vec() {
            let Some(record) = registry.get(entity) else {
                continue;
            };
            let owner = record.owner_peer;
            let net_id = record.net_id;
            let host_entity = record.host_entity;

            let Some(path) = host.entity_path(host_entity) else {
                continue;
            };

            let Some(controller) = self.controllers.get_mut(&entity) else {
                continue;
            };
            if controller.current_input_id() == InputId::MAX {
                continue;
            }

            let (epoch, state) = controller.collect_epoch(host, host_entity);
            let payload = EpochPayload {
                net_id,
                path,
                epoch,
                state,
            }
            .encode();

            for peer_id in self.peers.keys() {
                if Some(*peer_id) != owner {
                    rpc.send(
                        *peer_id,
                        RpcChannel::Unreliable,
                        RpcMethod::DollSendEpoch,
                        payload.clone(),
                    );
                }
            }
        }
    }
}

impl Default for ServerBackend {
    fn default() -> Self {
        Self::new()
    }
}
