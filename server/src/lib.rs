//! # Netsync Server
//! The authoritative backend: consumes client inputs, steers each client's
//! tick rate so its input buffer stays healthy, and broadcasts delta-encoded
//! state snapshots.

mod controller;
mod peer;
mod server;
mod tick_rate;

pub use controller::ServerController;
pub use peer::PeerState;
pub use server::ServerBackend;
