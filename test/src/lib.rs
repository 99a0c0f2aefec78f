//! Shared helpers for the netsync end-to-end tests: a scriptable mock host
//! world, a capturing RPC endpoint, and the plumbing to exchange payloads
//! between in-process synchronizers.

pub mod helpers;

pub use helpers::{
    exchange::{deliver_to_client, deliver_to_server, drop_nothing},
    roles::{ClientRole, OfflineRole, ServerRole},
    rpc::{Outbound, QueueRpc},
    session::{Session, DELTA},
    test_value::TestValue,
    test_world::TestWorld,
};
