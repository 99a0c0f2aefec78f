//! # Netsync Client
//! The predicting backend: captures player inputs ahead of the server,
//! ships them redundantly over the unreliable channel, and reconciles the
//! locally predicted state against authoritative snapshots, rewinding and
//! replaying buffered inputs when they disagree.

mod client;
mod doll;
mod parser;
mod player_controller;
mod reconciler;

pub use client::ClientBackend;
pub use doll::DollController;
pub use player_controller::PlayerController;
