use log::{info, warn};

use netsync_client::ClientBackend;
use netsync_server::ServerBackend;
use netsync_shared::{
    ChangeTracker, EntityId, FunctionName, HostEntity, HostWorld, InputId, NetworkStatus, PeerId,
    Registry, RegistryError, RpcEndpoint, SyncConfig, SyncValue,
};

use crate::no_net::NoNetBackend;

/// Which backend the synchronizer currently runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    NoNet,
    Server,
    Client,
}

enum Backend<V: SyncValue> {
    NoNet(NoNetBackend),
    Server(ServerBackend),
    Client(ClientBackend<V>),
}

/// The process-wide entry point: owns the registry, the change tracker, and
/// the mode backend, and routes ticks and inbound RPCs to whichever mode is
/// active.
///
/// Hosts may own more than one (a headless test harness runs a server and
/// several clients in one process).
pub struct Synchronizer<V: SyncValue> {
    config: SyncConfig,
    registry: Registry<V>,
    tracker: ChangeTracker,
    backend: Backend<V>,
}

impl<V: SyncValue> Synchronizer<V> {
    /// Starts in no-net mode; call [`reset_mode`](Self::reset_mode) once the
    /// network role is known.
    pub fn new(config: SyncConfig) -> Self {
        let tracker = ChangeTracker::new(config.comparison_float_tolerance);
        let mut registry = Registry::new();
        registry.set_generate_net_ids(true);

        Self {
            config,
            registry,
            tracker,
            backend: Backend::NoNet(NoNetBackend::new()),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn set_server_notify_state_interval(&mut self, interval: f32) {
        self.config.server_notify_state_interval = interval;
    }

    pub fn set_comparison_float_tolerance(&mut self, tolerance: f32) {
        self.config.comparison_float_tolerance = tolerance;
        self.tracker.set_tolerance(tolerance);
    }

    pub fn mode(&self) -> SyncMode {
        match &self.backend {
            Backend::NoNet(_) => SyncMode::NoNet,
            Backend::Server(_) => SyncMode::Server,
            Backend::Client(_) => SyncMode::Client,
        }
    }

    pub fn registry(&self) -> &Registry<V> {
        &self.registry
    }

    /// Rebuild the mode backend to match the host's network role. Everything
    /// already registered is announced to the fresh backend; mode-local state
    /// (peers, queues, input history) starts over.
    pub fn reset_mode(&mut self, network: &dyn NetworkStatus) {
        let mode = match network.peer_id() {
            None => SyncMode::NoNet,
            Some(_) if network.is_server() => SyncMode::Server,
            Some(_) => SyncMode::Client,
        };
        info!("synchronizer mode: {mode:?}");

        // Only the authoritative side hands out net ids.
        self.registry
            .set_generate_net_ids(mode != SyncMode::Client);

        self.backend = match mode {
            SyncMode::NoNet => Backend::NoNet(NoNetBackend::new()),
            SyncMode::Server => {
                let mut backend = ServerBackend::new();
                for entity in self.registry.ids() {
                    backend.on_entity_added(entity);
                    if let Some(record) = self.registry.get(entity) {
                        for field in &record.fields {
                            backend.on_field_added(entity, &field.name);
                        }
                    }
                }
                Backend::Server(backend)
            }
            SyncMode::Client => {
                let local_peer = network.peer_id().unwrap_or_default();
                let mut backend = ClientBackend::new(local_peer);
                for entity in self.registry.ids() {
                    backend.on_entity_added(&self.registry, entity, &self.config);
                }
                Backend::Client(backend)
            }
        };
    }

    /// Drop every tracked entity and all mode-local accumulations.
    pub fn clear(&mut self) {
        self.registry.clear();
        match &mut self.backend {
            Backend::NoNet(backend) => backend.clear(),
            Backend::Server(backend) => backend.clear(),
            Backend::Client(backend) => backend.clear(),
        }
    }

    // Registration

    pub fn register_entity(&mut self, host_entity: HostEntity) -> EntityId {
        let existed = self.registry.find_by_host(host_entity).is_some();
        let entity = self.registry.register_entity(host_entity);
        if !existed {
            self.notify_entity_added(entity);
        }
        entity
    }

    pub fn register_controller(
        &mut self,
        host_entity: HostEntity,
        owner_peer: PeerId,
    ) -> Result<EntityId, RegistryError> {
        let entity = self.registry.register_controller(host_entity, owner_peer)?;
        self.notify_entity_added(entity);
        Ok(entity)
    }

    /// Track `name` on `host_entity` (registering the entity if needed).
    pub fn register_field(
        &mut self,
        host: &dyn HostWorld<Value = V>,
        host_entity: HostEntity,
        name: &str,
        skip_rewind: bool,
    ) -> EntityId {
        let existed = self.registry.find_by_host(host_entity).is_some();
        let entity =
            self.registry
                .register_field(host, host_entity, name.to_string(), skip_rewind);
        if !existed {
            self.notify_entity_added(entity);
        }
        if let Backend::Server(backend) = &mut self.backend {
            backend.on_field_added(entity, name);
        }
        entity
    }

    pub fn unregister_field(
        &mut self,
        host_entity: HostEntity,
        name: &str,
    ) -> Result<(), RegistryError> {
        self.registry.unregister_field(host_entity, name)
    }

    pub fn set_controlled_by(
        &mut self,
        entity: EntityId,
        controller: Option<EntityId>,
    ) -> Result<(), RegistryError> {
        self.registry.set_controlled_by(entity, controller)
    }

    pub fn register_process(
        &mut self,
        host_entity: HostEntity,
        function: FunctionName,
    ) -> EntityId {
        let existed = self.registry.find_by_host(host_entity).is_some();
        let entity = self.registry.register_process(host_entity, function);
        if !existed {
            self.notify_entity_added(entity);
        }
        entity
    }

    pub fn unregister_process(&mut self, host_entity: HostEntity, function: &str) {
        self.registry.unregister_process(host_entity, function);
    }

    // Tick

    /// Run one physics tick: validate tracked entities against the host,
    /// then hand the tick to the active backend.
    pub fn process(
        &mut self,
        host: &mut dyn HostWorld<Value = V>,
        rpc: &mut dyn RpcEndpoint,
        delta: f32,
    ) {
        for removed in self.registry.validate(host) {
            match &mut self.backend {
                Backend::NoNet(backend) => backend.on_entity_removed(removed.entity),
                Backend::Server(backend) => backend.on_entity_removed(removed.entity),
                Backend::Client(backend) => backend.on_entity_removed(removed.entity),
            }
        }

        match &mut self.backend {
            Backend::NoNet(backend) => {
                backend.process(&mut self.registry, &self.tracker, host, delta)
            }
            Backend::Server(backend) => backend.process(
                &mut self.registry,
                &self.tracker,
                host,
                rpc,
                &self.config,
                delta,
            ),
            Backend::Client(backend) => backend.process(
                &mut self.registry,
                &self.tracker,
                host,
                rpc,
                &self.config,
                delta,
            ),
        }
    }

    // RPC ingress (called by the host when transport messages arrive)

    /// `_rpc_send_state`, server → client.
    pub fn receive_state(
        &mut self,
        host: &mut dyn HostWorld<Value = V>,
        rpc: &mut dyn RpcEndpoint,
        payload: &[u8],
    ) {
        let Backend::Client(backend) = &mut self.backend else {
            warn!("state snapshot received outside client mode");
            return;
        };
        backend.receive_state(&mut self.registry, host, rpc, payload);
    }

    /// `send_inputs`, client → server.
    pub fn receive_inputs(&mut self, peer: PeerId, payload: &[u8]) {
        let Backend::Server(backend) = &mut self.backend else {
            warn!("inputs received outside server mode");
            return;
        };
        backend.receive_inputs(&self.registry, peer, payload, &self.config);
    }

    /// `_rpc_send_tick_additional_speed`, server → client.
    pub fn receive_tick_speed(&mut self, payload: &[u8]) {
        let Backend::Client(backend) = &mut self.backend else {
            warn!("tick-speed update received outside client mode");
            return;
        };
        backend.receive_tick_speed(payload);
    }

    /// `_rpc_notify_need_full_snapshot`, client → server.
    pub fn notify_need_full_snapshot(&mut self, peer: PeerId) {
        let Backend::Server(backend) = &mut self.backend else {
            warn!("full-snapshot request received outside server mode");
            return;
        };
        backend.notify_need_full_snapshot(peer);
    }

    /// `doll_send_epoch`, server → non-owning peer.
    pub fn receive_doll_epoch(&mut self, host: &dyn HostWorld<Value = V>, payload: &[u8]) {
        let Backend::Client(backend) = &mut self.backend else {
            warn!("doll epoch received outside client mode");
            return;
        };
        backend.receive_doll_epoch(&mut self.registry, host, payload);
    }

    pub fn on_peer_connected(&mut self, peer: PeerId) {
        if let Backend::Server(backend) = &mut self.backend {
            backend.on_peer_connected(peer, &self.config);
        }
    }

    pub fn on_peer_disconnected(&mut self, peer: PeerId) {
        if let Backend::Server(backend) = &mut self.backend {
            backend.on_peer_disconnected(peer);
        }
    }

    /// Broadcast state on the next tick regardless of the notify timer.
    /// Server mode only.
    pub fn force_state_notify(&mut self) {
        let Backend::Server(backend) = &mut self.backend else {
            warn!("force_state_notify is a server-mode operation");
            return;
        };
        backend.force_state_notify(&self.config);
    }

    // Status

    /// Whether the reconciler is currently correcting state (either phase).
    pub fn is_recovered(&self) -> bool {
        match &self.backend {
            Backend::Client(backend) => backend.is_recovered(),
            _ => false,
        }
    }

    /// Whether state is being reset to a server snapshot right now.
    pub fn is_resetted(&self) -> bool {
        match &self.backend {
            Backend::Client(backend) => backend.is_resetted(),
            _ => false,
        }
    }

    /// Whether buffered inputs are being replayed right now.
    pub fn is_rewinding(&self) -> bool {
        match &self.backend {
            Backend::Client(backend) => backend.is_rewinding(),
            _ => false,
        }
    }

    /// The local player controller's newest input id. Client mode only.
    pub fn player_input_id(&self) -> Option<InputId> {
        match &self.backend {
            Backend::Client(backend) => backend.player_input_id(),
            _ => None,
        }
    }

    /// A controller's server-side input cursor. Server mode only.
    pub fn server_input_id(&self, entity: EntityId) -> Option<InputId> {
        match &self.backend {
            Backend::Server(backend) => backend.controller_input_id(entity),
            _ => None,
        }
    }

    /// Ghost inputs synthesized for a controller so far. Server mode only.
    pub fn server_ghost_inputs(&self, entity: EntityId) -> Option<u32> {
        match &self.backend {
            Backend::Server(backend) => backend.controller_ghost_inputs(entity),
            _ => None,
        }
    }

    /// `(server queue, client queue)` snapshot depths. Client mode only.
    pub fn pending_snapshots(&self) -> Option<(usize, usize)> {
        match &self.backend {
            Backend::Client(backend) => Some((
                backend.pending_server_snapshots(),
                backend.pending_client_snapshots(),
            )),
            _ => None,
        }
    }

    /// Input frames awaiting server acknowledgement. Client mode only.
    pub fn pending_inputs(&self) -> Option<usize> {
        match &self.backend {
            Backend::Client(backend) => Some(backend.pending_inputs()),
            _ => None,
        }
    }

    /// Full rewind-and-replay corrections performed so far. Client mode only.
    pub fn rewinds(&self) -> Option<usize> {
        match &self.backend {
            Backend::Client(backend) => Some(backend.rewind_count()),
            _ => None,
        }
    }

    fn notify_entity_added(&mut self, entity: EntityId) {
        match &mut self.backend {
            Backend::NoNet(_) => {}
            Backend::Server(backend) => backend.on_entity_added(entity),
            Backend::Client(backend) => {
                backend.on_entity_added(&self.registry, entity, &self.config)
            }
        }
    }
}
