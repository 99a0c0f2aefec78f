use netsync::{EntityId, HostEntity, PeerId, SyncConfig, Synchronizer};

use crate::helpers::{
    exchange::{deliver_to_client, deliver_to_server, drop_nothing},
    roles::{ClientRole, ServerRole},
    rpc::{Outbound, QueueRpc},
    test_value::TestValue,
    test_world::TestWorld,
};

pub const DELTA: f32 = 1.0 / 60.0;

/// A server and one predicted client wired back-to-back, with the player
/// controller and its `pos` field registered on both sides.
pub struct Session {
    pub server: Synchronizer<TestValue>,
    pub client: Synchronizer<TestValue>,
    pub server_world: TestWorld,
    pub client_world: TestWorld,
    pub server_rpc: QueueRpc,
    pub client_rpc: QueueRpc,
    pub client_peer: PeerId,
    pub player: HostEntity,
    pub server_player: EntityId,
    pub client_player: EntityId,
}

impl Session {
    pub fn start() -> Self {
        let client_peer: PeerId = 2;

        let mut server_world = TestWorld::new();
        let mut client_world = TestWorld::new();
        let player_s = server_world.spawn(10, "arena/player");
        let player_c = client_world.spawn(10, "arena/player");
        server_world.set(player_s, "pos", TestValue::Vec3(0.0, 0.0, 0.0));
        client_world.set(player_c, "pos", TestValue::Vec3(0.0, 0.0, 0.0));

        let mut server = Synchronizer::new(SyncConfig::default());
        server.reset_mode(&ServerRole);
        server.on_peer_connected(client_peer);

        let mut client = Synchronizer::new(SyncConfig::default());
        client.reset_mode(&ClientRole(client_peer));

        let server_player = server
            .register_controller(player_s, client_peer)
            .expect("fresh controller");
        server.register_field(&server_world, player_s, "pos", false);

        let client_player = client
            .register_controller(player_c, client_peer)
            .expect("fresh controller");
        client.register_field(&client_world, player_c, "pos", false);

        Self {
            server,
            client,
            server_world,
            client_world,
            server_rpc: QueueRpc::new(),
            client_rpc: QueueRpc::new(),
            client_peer,
            player: player_s,
            server_player,
            client_player,
        }
    }

    /// One lockstep tick: the client predicts with `axis`, its traffic
    /// reaches the server, the server simulates, its traffic reaches the
    /// client (to be reconciled on the next tick).
    pub fn tick(&mut self, axis: f32) {
        self.tick_with_drops(axis, &mut drop_nothing, &mut drop_nothing);
    }

    pub fn tick_with_drops(
        &mut self,
        axis: f32,
        drop_to_server: &mut dyn FnMut(&Outbound) -> bool,
        drop_to_client: &mut dyn FnMut(&Outbound) -> bool,
    ) {
        self.client_world.push_input(self.player, axis);
        self.client
            .process(&mut self.client_world, &mut self.client_rpc, DELTA);

        deliver_to_server(
            &mut self.server,
            self.client_peer,
            &mut self.client_rpc,
            drop_to_server,
        );

        self.server
            .process(&mut self.server_world, &mut self.server_rpc, DELTA);

        deliver_to_client(
            &mut self.client,
            &mut self.client_world,
            &mut self.client_rpc,
            self.client_peer,
            &mut self.server_rpc,
            drop_to_client,
        );
    }

    pub fn server_pos(&self) -> (f32, f32, f32) {
        self.server_world.pos(self.player)
    }

    pub fn client_pos(&self) -> (f32, f32, f32) {
        self.client_world.pos(self.player)
    }
}
