pub type PeerId = u64;
pub type NetId = u32;
pub type InputId = u32;
pub type EpochId = u64;

pub type FieldName = String;
pub type FunctionName = String;
pub type EntityPath = String;

/// The peer id the transport routes client→server calls to.
pub const SERVER_PEER_ID: PeerId = 1;

/// Index of an entity in the registry arena. Stable for the lifetime of the
/// registry; slots are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

impl EntityId {
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn to_index(self) -> usize {
        self.0 as usize
    }
}

/// The host application's opaque handle for an entity (a scene-node instance
/// id, an ECS entity bit-pattern, whatever the host uses).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostEntity(pub u64);
