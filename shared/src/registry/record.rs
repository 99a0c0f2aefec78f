use crate::types::{EntityId, FieldName, FunctionName, HostEntity, NetId, PeerId};

/// One tracked field of an entity. Records are disabled on unregister rather
/// than removed, so field net ids stay stable across peers.
#[derive(Debug, Clone)]
pub struct FieldRecord<V> {
    /// Server-assigned identity, 0 until known.
    pub net_id: NetId,
    pub name: FieldName,
    /// The value at the end of the previous tick (a deep copy).
    pub last_seen: Option<V>,
    /// Mismatches on this field are applied without a rewind.
    pub skip_rewind: bool,
    pub enabled: bool,
}

/// One tracked entity.
#[derive(Debug, Clone)]
pub struct EntityRecord<V> {
    pub host_entity: HostEntity,
    /// Server-assigned identity, 0 until known. Never 0 in a server-emitted
    /// snapshot.
    pub net_id: NetId,
    pub is_controller: bool,
    /// The peer that owns this controller's inputs. Controllers only.
    pub owner_peer: Option<PeerId>,
    /// Set when this entity sits in a controller's controlled list.
    pub controlled_by: Option<EntityId>,
    /// Controllers only: the entities this controller carries through
    /// prediction and rewind.
    pub controlled: Vec<EntityId>,
    pub fields: Vec<FieldRecord<V>>,
    pub process_functions: Vec<FunctionName>,
}

impl<V> EntityRecord<V> {
    pub fn new(host_entity: HostEntity, net_id: NetId) -> Self {
        Self {
            host_entity,
            net_id,
            is_controller: false,
            owner_peer: None,
            controlled_by: None,
            controlled: Vec::new(),
            fields: Vec::new(),
            process_functions: Vec::new(),
        }
    }

    pub fn find_field(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    /// Field lookup by wire identity. Id 0 means "unassigned" and never
    /// matches.
    pub fn find_field_by_net_id(&self, net_id: NetId) -> Option<usize> {
        if net_id == 0 {
            return None;
        }
        self.fields.iter().position(|field| field.net_id == net_id)
    }
}
