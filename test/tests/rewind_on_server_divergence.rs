//! Server-side physics the client doesn't predict forces a rewind: the
//! client resets to the authoritative state and replays its pending inputs.

use netsync_test::{Session, DELTA};

#[test]
fn server_only_gravity_triggers_a_rewind() {
    let mut session = Session::start();
    // gravity acts on the server only; the client predicts z = 0
    session.server.register_process(session.player, "sink".to_string());

    for _ in 0..61 {
        session.tick(1.0);
    }

    assert!(session.client.rewinds().unwrap() >= 1);

    // the client adopted the authoritative altitude at the checked input
    let (_, _, client_z) = session.client_pos();
    assert!(
        (client_z - (-1.0)).abs() < 0.05,
        "client z = {client_z}, expected about -1.0"
    );

    // the horizontal prediction survived the rewind: reset + replay lands on
    // the same x the client had predicted
    let (client_x, _, _) = session.client_pos();
    let (server_x, _, _) = session.server_pos();
    assert!((client_x - server_x).abs() < 0.1);
}

#[test]
fn reset_emits_change_signals() {
    let mut session = Session::start();
    session.server.register_process(session.player, "sink".to_string());

    for _ in 0..60 {
        session.tick(1.0);
    }
    let changes_before = session.client_world.changes_for(session.player, "pos");

    // the tick that consumes the broadcast resets pos and replays
    session.tick(1.0);
    let changes_after = session.client_world.changes_for(session.player, "pos");

    // at least the reset write plus the replay pull, on top of the regular
    // per-sub-tick change
    assert!(
        changes_after >= changes_before + 2,
        "expected reset + replay signals, got {} -> {}",
        changes_before,
        changes_after
    );
}

#[test]
fn repeated_corrections_keep_tracking() {
    let mut session = Session::start();
    session.server.register_process(session.player, "sink".to_string());

    for _ in 0..300 {
        session.tick(1.0);
    }

    // every broadcast corrects the client's altitude to within one interval
    // of divergence (the client never predicts the sink between broadcasts)
    let (_, _, client_z) = session.client_pos();
    let (_, _, server_z) = session.server_pos();
    assert!(
        (client_z - server_z).abs() < 1.5 * 60.0 * DELTA,
        "client z {client_z} lost the server z {server_z}"
    );
    assert!(session.client.rewinds().unwrap() >= 4);
}
