//! # Netsync Shared
//! Common functionality shared between the netsync-server & netsync-client crates:
//! the entity registry, change detection, the snapshot & input wire codecs, and
//! the traits through which the host application is reached.

pub use netsync_serde::{
    BitReader, BitWrite, BitWriter, Serde, SerdeErr, SignedInteger, SignedVariableInteger,
    UnsignedInteger, UnsignedVariableInteger,
};

mod config;
mod epoch;
mod host;
mod inputs;
mod registry;
mod snapshot;
mod tracer;
mod tracker;
mod types;

pub use config::{
    SyncConfig, MAX_ADDITIONAL_TICK_SPEED, MIN_INPUT_BUFFER_SIZE, TICK_SPEED_NOTIFY_THRESHOLD,
};
pub use epoch::EpochPayload;
pub use host::{HostWorld, NetworkStatus, RpcChannel, RpcEndpoint, RpcMethod, SyncValue};
pub use inputs::{
    codec::{decode_input_packet, encode_input_packet},
    error::InputDecodeError,
    frame::{similarity_of, InputFrame},
};
pub use registry::{
    error::RegistryError,
    record::{EntityRecord, FieldRecord},
    registry::Registry,
    RemovedEntity,
};
pub use snapshot::{
    change_set::{ChangeSet, EntityChange},
    error::SnapshotReadError,
    queue::{InsertOutcome, SnapshotQueue},
    reader::{EntityHeader, FieldHeader, SnapshotReader},
    snapshot::Snapshot,
    writer::{FieldSelection, SnapshotWriter},
    SNAPSHOT_FORMAT_VERSION,
};
pub use tracer::NetworkTracer;
pub use tracker::ChangeTracker;
pub use types::{
    EntityId, EntityPath, EpochId, FieldName, FunctionName, HostEntity, InputId, NetId, PeerId,
    SERVER_PEER_ID,
};
