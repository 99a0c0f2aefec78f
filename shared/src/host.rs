use std::fmt;

use netsync_serde::{BitReader, BitWrite, BitWriter, SerdeErr};

use crate::types::{EntityPath, FieldName, FunctionName, HostEntity, PeerId};

/// The value type the host synchronizes. The engine never inspects values; it
/// copies them, compares them approximately, and moves their encoded bytes.
pub trait SyncValue: Clone + fmt::Debug {
    /// Approximate equality, with `tolerance` applied to any floating-point
    /// content (scalars, vector components, rotations, element-wise for
    /// arrays and dictionaries).
    fn equal_approx(&self, other: &Self, tolerance: f32) -> bool;

    /// A copy that shares no mutable state with the original.
    fn deep_copy(&self) -> Self;

    fn encode(&self, writer: &mut dyn BitWrite);
    fn decode(reader: &mut BitReader) -> Result<Self, SerdeErr>;
}

/// Everything the engine needs from the host application: the entity store,
/// the per-entity step functions, input capture, and the physics clock.
///
/// All calls happen on the tick thread, between or during `process` calls.
pub trait HostWorld {
    type Value: SyncValue;

    fn entity_exists(&self, entity: HostEntity) -> bool;
    fn entity_path(&self, entity: HostEntity) -> Option<EntityPath>;
    fn resolve_path(&self, path: &EntityPath) -> Option<HostEntity>;

    fn get_field(&self, entity: HostEntity, field: &FieldName) -> Option<Self::Value>;
    fn set_field(&mut self, entity: HostEntity, field: &FieldName, value: Self::Value);
    /// Fan out the host-side "this field changed" signal.
    fn emit_change(&mut self, entity: HostEntity, field: &FieldName);

    /// Invoke one registered process callback of `entity`.
    fn process(&mut self, entity: HostEntity, function: &FunctionName, delta: f32);

    /// Capture the controller's current input into `writer`. Client-side only.
    fn collect_input(&mut self, controller: HostEntity, delta: f32, writer: &mut BitWriter);
    /// Step the controller with a previously captured input. A ghost input is
    /// delivered as an empty reader.
    fn apply_input(&mut self, controller: HostEntity, delta: f32, input: &mut BitReader);

    /// Capture the controller state a doll interpolates between. Server-side.
    fn collect_epoch_state(&mut self, controller: HostEntity, writer: &mut BitWriter);
    /// Blend a doll between two epoch states. `blend` is in `[0, 1]`.
    fn apply_epoch_state(&mut self, controller: HostEntity, blend: f32, from: &[u8], to: &[u8]);

    /// Physics iterations per second, the base rate the sub-tick scheduler
    /// speeds up or slows down.
    fn iterations_per_second(&self) -> f32;
}

/// The methods the engine sends over the host transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcMethod {
    /// server → client, snapshot payload
    SendState,
    /// client → server, empty payload
    NotifyNeedFullSnapshot,
    /// client → server, redundant input frames
    SendInputs,
    /// server → client, single signed byte
    SendTickSpeed,
    /// server → peer, doll epoch payload
    DollSendEpoch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcChannel {
    Reliable,
    Unreliable,
}

/// Host-supplied transport. Submitting a call returns immediately; delivery,
/// retry of reliable calls, and connection management are the host's problem.
pub trait RpcEndpoint {
    fn send(&mut self, peer: PeerId, channel: RpcChannel, method: RpcMethod, payload: Vec<u8>);
    fn broadcast(&mut self, channel: RpcChannel, method: RpcMethod, payload: Vec<u8>);
}

/// The host's view of the current network role, consulted when the
/// synchronizer (re)builds its mode backend.
pub trait NetworkStatus {
    /// `None` while no network session exists.
    fn peer_id(&self) -> Option<PeerId>;
    fn is_server(&self) -> bool;
}
