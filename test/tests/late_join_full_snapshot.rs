//! A peer that joins after identifiers were already introduced receives
//! short-form headers it cannot resolve: it must request a full snapshot
//! (once per parse pass), skip what it can't place, and resync from the next
//! broadcast.

use netsync::{RpcMethod, SyncConfig, Synchronizer};
use netsync_test::{
    deliver_to_client, deliver_to_server, ClientRole, QueueRpc, ServerRole, TestValue, TestWorld,
    DELTA,
};

#[test]
fn late_joiner_requests_and_receives_a_full_snapshot() {
    let peer_a = 2;
    let peer_b = 3;

    // server world: a sinking ball plus one player entity per peer
    let mut server_world = TestWorld::new();
    let ball_s = server_world.spawn(30, "arena/ball");
    server_world.set(ball_s, "pos", TestValue::Vec3(0.0, 0.0, 5.0));
    let player_a_s = server_world.spawn(10, "arena/player_a");
    server_world.set(player_a_s, "pos", TestValue::Vec3(0.0, 0.0, 0.0));
    let player_b_s = server_world.spawn(20, "arena/player_b");
    server_world.set(player_b_s, "pos", TestValue::Vec3(0.0, 0.0, 0.0));

    let mut server = Synchronizer::new(SyncConfig::default());
    server.reset_mode(&ServerRole);
    server.on_peer_connected(peer_a);
    server.register_field(&server_world, ball_s, "pos", false);
    server.register_process(ball_s, "sink".to_string());
    server.register_controller(player_a_s, peer_a).unwrap();
    server.register_field(&server_world, player_a_s, "pos", false);
    let mut server_rpc = QueueRpc::new();

    // client A plays from the start
    let mut world_a = TestWorld::new();
    let ball_a = world_a.spawn(30, "arena/ball");
    world_a.set(ball_a, "pos", TestValue::Vec3(0.0, 0.0, 5.0));
    let player_a = world_a.spawn(10, "arena/player_a");
    world_a.set(player_a, "pos", TestValue::Vec3(0.0, 0.0, 0.0));

    let mut client_a = Synchronizer::new(SyncConfig::default());
    client_a.reset_mode(&ClientRole(peer_a));
    client_a.register_field(&world_a, ball_a, "pos", false);
    client_a.register_controller(player_a, peer_a).unwrap();
    client_a.register_field(&world_a, player_a, "pos", false);
    let mut rpc_a = QueueRpc::new();

    // one broadcast interval with A alone; the verbose introductions go out
    // and the change set is cleared
    for _ in 0..60 {
        world_a.push_input(player_a, 1.0);
        client_a.process(&mut world_a, &mut rpc_a, DELTA);
        deliver_to_server(&mut server, peer_a, &mut rpc_a, &mut |_| false);
        server.process(&mut server_world, &mut server_rpc, DELTA);
        deliver_to_client(
            &mut client_a,
            &mut world_a,
            &mut rpc_a,
            peer_a,
            &mut server_rpc,
            &mut |_| false,
        );
    }

    // B joins now
    server.on_peer_connected(peer_b);
    server.register_controller(player_b_s, peer_b).unwrap();
    server.register_field(&server_world, player_b_s, "pos", false);

    let mut world_b = TestWorld::new();
    let ball_b = world_b.spawn(30, "arena/ball");
    world_b.set(ball_b, "pos", TestValue::Vec3(0.0, 0.0, 5.0));
    let player_b = world_b.spawn(20, "arena/player_b");
    world_b.set(player_b, "pos", TestValue::Vec3(0.0, 0.0, 0.0));

    let mut client_b = Synchronizer::new(SyncConfig::default());
    client_b.reset_mode(&ClientRole(peer_b));
    client_b.register_field(&world_b, ball_b, "pos", false);
    client_b.register_controller(player_b, peer_b).unwrap();
    client_b.register_field(&world_b, player_b, "pos", false);
    let mut rpc_b = QueueRpc::new();

    // run past two more broadcasts; count B's full-snapshot requests
    let mut full_snapshot_requests = 0;
    for _ in 0..125 {
        world_a.push_input(player_a, 1.0);
        client_a.process(&mut world_a, &mut rpc_a, DELTA);
        deliver_to_server(&mut server, peer_a, &mut rpc_a, &mut |_| false);

        world_b.push_input(player_b, 1.0);
        client_b.process(&mut world_b, &mut rpc_b, DELTA);
        deliver_to_server(&mut server, peer_b, &mut rpc_b, &mut |message| {
            if message.method == RpcMethod::NotifyNeedFullSnapshot {
                full_snapshot_requests += 1;
            }
            false
        });

        server.process(&mut server_world, &mut server_rpc, DELTA);

        deliver_to_client(
            &mut client_a,
            &mut world_a,
            &mut rpc_a,
            peer_a,
            &mut server_rpc,
            &mut |_| false,
        );
        deliver_to_client(
            &mut client_b,
            &mut world_b,
            &mut rpc_b,
            peer_b,
            &mut server_rpc,
            &mut |_| false,
        );
    }

    // the short-form ball header was unresolvable exactly once
    assert_eq!(full_snapshot_requests, 1);

    // after the full snapshot, B adopted the authoritative ball state
    let (_, _, ball_z_b) = world_b.pos(ball_b);
    let (_, _, ball_z_s) = server_world.pos(ball_s);
    assert!(ball_z_b < 4.0, "B never learned the ball moved: z = {ball_z_b}");
    assert!(
        (ball_z_b - ball_z_s).abs() < 0.5,
        "B's ball z {ball_z_b} vs server {ball_z_s}"
    );

    // A was never disturbed
    assert!((world_a.pos(ball_a).2 - ball_z_s).abs() < 0.5);
}
