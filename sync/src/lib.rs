//! # Netsync
//! A deterministic client-side-prediction / server-reconciliation engine.
//!
//! The server runs the authoritative simulation; each client predicts its own
//! controlled entity from local inputs and rewinds-and-replays whenever an
//! authoritative snapshot disagrees with what it predicted. One
//! [`Synchronizer`] per process side wraps the whole machinery behind a mode
//! that is rebuilt when the network role changes.

pub use netsync_shared::{
    BitReader, BitWrite, BitWriter, EntityId, EntityPath, EpochId, FieldName, FunctionName,
    HostEntity, HostWorld, InputId, NetId, NetworkStatus, PeerId, Registry, RegistryError,
    RpcChannel, RpcEndpoint, RpcMethod, Serde, SerdeErr, SyncConfig, SyncValue, SERVER_PEER_ID,
};

mod no_net;
mod synchronizer;

pub use no_net::{NoNetBackend, NoNetController};
pub use synchronizer::{SyncMode, Synchronizer};
