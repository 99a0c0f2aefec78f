use std::collections::HashMap;

use log::{debug, info, warn};

use netsync_shared::{
    ChangeTracker, EntityId, EntityPath, EntityRecord, EpochPayload, FieldName, HostWorld, InputId,
    NetId, PeerId, Registry, RpcEndpoint, Snapshot, SnapshotQueue, SyncConfig, SyncValue,
};

use crate::{doll::DollController, player_controller::PlayerController};

pub(crate) struct PlayerEntry {
    pub entity: EntityId,
    pub controller: PlayerController,
}

/// The predicting backend.
///
/// Per tick: the sub-tick scheduler decides how many simulation steps to run,
/// each step captures & applies a fresh input and stores a client snapshot,
/// then the reconciler compares predicted history against whatever
/// authoritative snapshots arrived.
pub struct ClientBackend<V: SyncValue> {
    local_peer: PeerId,
    pub(crate) player: Option<PlayerEntry>,
    pub(crate) dolls: HashMap<EntityId, DollController>,
    /// Deferred identifier resolution: server net id → local entity.
    pub(crate) node_id_map: HashMap<NetId, EntityId>,
    /// Server net id → path, remembered from verbose headers.
    pub(crate) node_paths: HashMap<NetId, EntityPath>,
    pub(crate) server_snapshots: SnapshotQueue<V>,
    pub(crate) client_snapshots: SnapshotQueue<V>,
    /// Accumulated view of the server state; every parsed snapshot updates it
    /// incrementally and a copy is enqueued.
    pub(crate) last_received: Snapshot<V>,
    /// At most one full-snapshot request per parse pass.
    pub(crate) need_full_snapshot_notified: bool,
    pub(crate) recover_in_progress: bool,
    pub(crate) reset_in_progress: bool,
    pub(crate) rewinding_in_progress: bool,
    /// Full rewind-and-replay corrections performed so far.
    pub(crate) rewind_count: usize,
}

impl<V: SyncValue> ClientBackend<V> {
    pub fn new(local_peer: PeerId) -> Self {
        Self {
            local_peer,
            player: None,
            dolls: HashMap::new(),
            node_id_map: HashMap::new(),
            node_paths: HashMap::new(),
            server_snapshots: SnapshotQueue::new(),
            client_snapshots: SnapshotQueue::new(),
            last_received: Snapshot::new(),
            need_full_snapshot_notified: false,
            recover_in_progress: false,
            reset_in_progress: false,
            rewinding_in_progress: false,
            rewind_count: 0,
        }
    }

    /// Drop identifier maps, snapshot queues, and the accumulated server
    /// view. Controllers stay registered.
    pub fn clear(&mut self) {
        self.node_id_map.clear();
        self.node_paths.clear();
        self.server_snapshots.clear();
        self.client_snapshots.clear();
        self.last_received = Snapshot::new();
        self.need_full_snapshot_notified = false;
    }

    pub fn is_recovered(&self) -> bool {
        self.recover_in_progress
    }

    pub fn is_resetted(&self) -> bool {
        self.reset_in_progress
    }

    pub fn is_rewinding(&self) -> bool {
        self.rewinding_in_progress
    }

    /// How many full rewind-and-replay corrections have run. A healthy
    /// in-sync session keeps this at zero.
    pub fn rewind_count(&self) -> usize {
        self.rewind_count
    }

    /// The player controller's most recent input id, for hosts that display
    /// or log sync status.
    pub fn player_input_id(&self) -> Option<InputId> {
        self.player
            .as_ref()
            .map(|player| player.controller.current_input_id())
    }

    pub fn pending_server_snapshots(&self) -> usize {
        self.server_snapshots.len()
    }

    pub fn pending_client_snapshots(&self) -> usize {
        self.client_snapshots.len()
    }

    /// Input frames not yet acknowledged by the server; the size of a
    /// potential rewind.
    pub fn pending_inputs(&self) -> usize {
        self.player
            .as_ref()
            .map(|player| player.controller.pending_inputs())
            .unwrap_or(0)
    }

    // Registration notifications

    pub fn on_entity_added(&mut self, registry: &Registry<V>, entity: EntityId, config: &SyncConfig) {
        let Some(record) = registry.get(entity) else {
            return;
        };
        if !record.is_controller {
            return;
        }

        if record.owner_peer == Some(self.local_peer) {
            if self.player.is_some() {
                warn!("only one player controller is supported, ignoring {entity:?}");
                return;
            }
            info!("player controller registered: {entity:?}");
            self.player = Some(PlayerEntry {
                entity,
                controller: PlayerController::new(),
            });
        } else {
            info!("doll controller registered: {entity:?}");
            self.dolls
                .insert(entity, DollController::new(config.network_traced_frames));
        }
    }

    pub fn on_entity_removed(&mut self, entity: EntityId) {
        if self
            .player
            .as_ref()
            .is_some_and(|player| player.entity == entity)
        {
            self.player = None;
        }
        self.dolls.remove(&entity);
    }

    // RPC ingress

    pub fn receive_state(
        &mut self,
        registry: &mut Registry<V>,
        host: &mut dyn HostWorld<Value = V>,
        rpc: &mut dyn RpcEndpoint,
        payload: &[u8],
    ) {
        // The parsed data lands in `last_received`, which always holds the
        // latest full reconstruction; the queue gets a copy, so popping the
        // queue never loses the baseline a delta needs.
        match self.parse_snapshot(registry, host, rpc, payload) {
            Ok(true) => {
                self.server_snapshots.insert(self.last_received.clone());
            }
            Ok(false) => {}
            Err(error) => {
                warn!("received a corrupted snapshot: {error}");
            }
        }
    }

    pub fn receive_tick_speed(&mut self, payload: &[u8]) {
        let Some(byte) = payload.first() else {
            warn!("empty tick-speed update");
            return;
        };
        if let Some(player) = self.player.as_mut() {
            player.controller.set_tick_speed_quantized(*byte as i8);
        }
    }

    pub fn receive_doll_epoch(
        &mut self,
        registry: &mut Registry<V>,
        host: &dyn HostWorld<Value = V>,
        payload: &[u8],
    ) {
        let epoch = match EpochPayload::decode(payload) {
            Ok(epoch) => epoch,
            Err(error) => {
                warn!("received a corrupted doll epoch: {error}");
                return;
            }
        };

        let entity = match self.node_id_map.get(&epoch.net_id) {
            Some(entity) => *entity,
            None => {
                // Epochs flow outside the snapshot path; adopt the id from
                // the carried path on first sight.
                let Some(host_entity) = host.resolve_path(&epoch.path) else {
                    debug!("doll epoch for unresolvable path `{}`", epoch.path);
                    return;
                };
                let Some(entity) = registry.find_by_host(host_entity) else {
                    debug!("doll epoch for untracked entity {host_entity:?}");
                    return;
                };
                if let Some(record) = registry.get_mut(entity) {
                    record.net_id = epoch.net_id;
                }
                self.node_id_map.insert(epoch.net_id, entity);
                entity
            }
        };

        let Some(doll) = self.dolls.get_mut(&entity) else {
            debug!("doll epoch for non-doll entity {entity:?}");
            return;
        };
        doll.receive_epoch(epoch.epoch, epoch.state);
    }

    // Tick

    pub fn process(
        &mut self,
        registry: &mut Registry<V>,
        tracker: &ChangeTracker,
        host: &mut dyn HostWorld<Value = V>,
        rpc: &mut dyn RpcEndpoint,
        config: &SyncConfig,
        delta: f32,
    ) {
        self.advance_dolls(registry, host, delta);

        let Some(player_entity) = self.player.as_ref().map(|player| player.entity) else {
            // No player controller, nothing to predict or reconcile.
            return;
        };

        let iterations_per_second = host.iterations_per_second();
        let sub_ticks = match self.player.as_mut() {
            Some(player) => {
                // Reset here, so even when no sub-tick runs the flag is right.
                player.controller.clear_new_input();
                player
                    .controller
                    .calculate_sub_ticks(delta, iterations_per_second)
            }
            None => 0,
        };

        let entities = registry.ids();

        for _ in 0..sub_ticks {
            for entity in &entities {
                let Some(record) = registry.get(*entity) else {
                    continue;
                };
                let host_entity = record.host_entity;
                for function in &record.process_functions {
                    host.process(host_entity, function, delta);
                }
            }

            let Some(host_entity) = registry.get(player_entity).map(|r| r.host_entity) else {
                break;
            };
            if let Some(player) = self.player.as_mut() {
                player
                    .controller
                    .process(host, rpc, host_entity, delta, config);
            }

            for entity in &entities {
                tracker.pull(registry, *entity, host);
            }

            let new_input = self
                .player
                .as_ref()
                .map(|player| {
                    (
                        player.controller.has_new_input(),
                        player.controller.current_input_id(),
                    )
                })
                .unwrap_or((false, InputId::MAX));
            if new_input.0 {
                self.store_client_snapshot(registry, player_entity, new_input.1);
            }
        }

        self.recover_in_progress = true;
        self.reconcile(registry, tracker, host, config, delta);
        self.recover_in_progress = false;
    }

    fn advance_dolls(
        &mut self,
        registry: &Registry<V>,
        host: &mut dyn HostWorld<Value = V>,
        delta: f32,
    ) {
        for (entity, doll) in self.dolls.iter_mut() {
            let Some(record) = registry.get(*entity) else {
                continue;
            };
            doll.next_epoch(delta, host, record.host_entity);
        }
    }

    /// Snapshot the predicted state (globals + the player controller + its
    /// controlled set) under the input id that produced it.
    fn store_client_snapshot(
        &mut self,
        registry: &Registry<V>,
        player_entity: EntityId,
        input_id: InputId,
    ) {
        let mut snapshot = Snapshot::new();
        snapshot.input_id = input_id;

        for entity in registry.globals() {
            if let Some(record) = registry.get(*entity) {
                snapshot.entities.insert(*entity, capture_fields(record));
            }
        }

        let Some(player_record) = registry.get(player_entity) else {
            return;
        };
        snapshot
            .entities
            .insert(player_entity, capture_fields(player_record));
        for controlled in &player_record.controlled {
            if let Some(record) = registry.get(*controlled) {
                snapshot.entities.insert(*controlled, capture_fields(record));
            }
        }

        self.client_snapshots.insert(snapshot);
    }
}

/// The enabled fields of a record, as deep copies of their last seen values.
pub(crate) fn capture_fields<V: SyncValue>(record: &EntityRecord<V>) -> Vec<(FieldName, V)> {
    record
        .fields
        .iter()
        .filter(|field| field.enabled)
        .filter_map(|field| {
            field
                .last_seen
                .as_ref()
                .map(|value| (field.name.clone(), value.deep_copy()))
        })
        .collect()
}
