//! Moving an entity into a controller's controlled set mid-session: it leaves
//! the globals, travels in the controller section of the snapshot, and
//! rewinds together with the controller from then on.

use netsync_test::{Session, TestValue};

#[test]
fn reassigned_entity_rides_the_controller_section() {
    let mut session = Session::start();

    // a crate that sinks on the server only
    let crate_s = session.server_world.spawn(40, "arena/crate");
    session
        .server_world
        .set(crate_s, "pos", TestValue::Vec3(0.0, 0.0, 3.0));
    let crate_c = session.client_world.spawn(40, "arena/crate");
    session
        .client_world
        .set(crate_c, "pos", TestValue::Vec3(0.0, 0.0, 3.0));

    let server_world = &session.server_world;
    let server_crate = session.server.register_field(server_world, crate_s, "pos", false);
    session.server.register_process(crate_s, "sink".to_string());
    let client_world = &session.client_world;
    let client_crate = session.client.register_field(client_world, crate_c, "pos", false);

    // one broadcast interval with the crate as a global
    for _ in 0..65 {
        session.tick(1.0);
    }
    let rewinds_as_global = session.client.rewinds().unwrap();
    assert!(rewinds_as_global >= 1, "the sinking crate never corrected");

    // the controller takes the crate over, on both sides
    session
        .server
        .set_controlled_by(server_crate, Some(session.server_player))
        .unwrap();
    session
        .client
        .set_controlled_by(client_crate, Some(session.client_player))
        .unwrap();

    assert!(!session.client.registry().globals().contains(&client_crate));
    assert_eq!(
        session.client.registry().get(session.client_player).unwrap().controlled,
        vec![client_crate]
    );

    // the next broadcasts carry the crate in the controller section; parsing
    // and reconciliation continue without spurious breakage
    for _ in 0..65 {
        session.tick(1.0);
    }

    assert!(session.client.rewinds().unwrap() > rewinds_as_global);

    let (_, _, crate_z_c) = session.client_world.pos(crate_c);
    let (_, _, crate_z_s) = session.server_world.pos(crate_s);
    assert!(
        (crate_z_c - crate_z_s).abs() < 0.5,
        "client crate z {crate_z_c} vs server {crate_z_s}"
    );

    // the controller's own prediction still matches
    let (client_x, _, _) = session.client_pos();
    let (server_x, _, _) = session.server_pos();
    assert!((client_x - server_x).abs() < 0.2);
}
