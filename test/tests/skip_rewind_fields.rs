//! Fields registered with `skip_rewind` are corrected in place: the value is
//! applied, but no rewind-and-replay runs for them.

use netsync_test::{Session, TestValue};

#[test]
fn cosmetic_difference_is_applied_without_a_rewind() {
    let mut session = Session::start();

    session.server_world.set(session.player, "tint", TestValue::Float(0.1));
    session.client_world.set(session.player, "tint", TestValue::Float(0.1));
    let server_world = &session.server_world;
    session.server.register_field(server_world, session.player, "tint", true);
    let client_world = &session.client_world;
    session.client.register_field(client_world, session.player, "tint", true);

    for _ in 0..30 {
        session.tick(1.0);
    }

    // the server changes the cosmetic field; the client keeps predicting the
    // old value
    session
        .server_world
        .set(session.player, "tint", TestValue::Float(0.9));

    for _ in 0..35 {
        session.tick(1.0);
    }

    // the authoritative value arrived and was applied in place
    assert_eq!(
        session.client_world.get(session.player, "tint"),
        Some(&TestValue::Float(0.9))
    );
    // with no replay: the cosmetic field alone never causes a rewind
    assert_eq!(session.client.rewinds(), Some(0));
}

#[test]
fn skip_rewind_does_not_shadow_real_divergence() {
    let mut session = Session::start();

    session.server_world.set(session.player, "tint", TestValue::Float(0.1));
    session.client_world.set(session.player, "tint", TestValue::Float(0.1));
    let server_world = &session.server_world;
    session.server.register_field(server_world, session.player, "tint", true);
    let client_world = &session.client_world;
    session.client.register_field(client_world, session.player, "tint", true);

    // both a cosmetic difference and a real (position) one
    session.server.register_process(session.player, "sink".to_string());
    session
        .server_world
        .set(session.player, "tint", TestValue::Float(0.9));

    for _ in 0..65 {
        session.tick(1.0);
    }

    // the position divergence still rewinds, and the cosmetic value still
    // lands
    assert!(session.client.rewinds().unwrap() >= 1);
    assert_eq!(
        session.client_world.get(session.player, "tint"),
        Some(&TestValue::Float(0.9))
    );
}
