use netsync_serde::{BitReader, Serde, UnsignedVariableInteger};

use crate::{
    snapshot::{error::SnapshotReadError, SNAPSHOT_FORMAT_VERSION},
    types::{EntityPath, FieldName, InputId, NetId},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityHeader {
    /// First-sight form: id plus the path the client resolves it with.
    Verbose { net_id: NetId, path: EntityPath },
    /// Id only; the client must already know it.
    Short { net_id: NetId },
}

impl EntityHeader {
    pub fn net_id(&self) -> NetId {
        match self {
            EntityHeader::Verbose { net_id, .. } => *net_id,
            EntityHeader::Short { net_id } => *net_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldHeader {
    Verbose { net_id: NetId, name: FieldName },
    Short { net_id: NetId },
}

/// Token-level decoder for state payloads; the grammar lives in
/// [`super::writer::SnapshotWriter`]. The caller drives it:
/// `next_entity` → `input_id` → (`next_field` → `value_bytes`)* until
/// `next_field` returns `None`.
pub struct SnapshotReader<'a> {
    reader: BitReader<'a>,
}

impl<'a> SnapshotReader<'a> {
    pub fn new(payload: &'a [u8]) -> Result<Self, SnapshotReadError> {
        let mut reader = BitReader::new(payload);
        let version = u8::de(&mut reader)?;
        if version != SNAPSHOT_FORMAT_VERSION {
            return Err(SnapshotReadError::UnsupportedVersion(version));
        }
        Ok(Self { reader })
    }

    /// The next entity header, or `None` at the payload terminator.
    pub fn next_entity(&mut self) -> Result<Option<EntityHeader>, SnapshotReadError> {
        if !self.reader.read_bit()? {
            return Ok(None);
        }

        let verbose = self.reader.read_bit()?;
        let net_id = UnsignedVariableInteger::<7>::de(&mut self.reader)?.get() as NetId;

        if verbose {
            let path = EntityPath::de(&mut self.reader)?;
            Ok(Some(EntityHeader::Verbose { net_id, path }))
        } else {
            Ok(Some(EntityHeader::Short { net_id }))
        }
    }

    /// The entity's input id, present iff the entity is a controller. Must be
    /// called exactly once after `next_entity`.
    pub fn input_id(&mut self) -> Result<Option<InputId>, SnapshotReadError> {
        if !self.reader.read_bit()? {
            return Ok(None);
        }
        let input_id = InputId::de(&mut self.reader)?;
        if input_id == InputId::MAX {
            return Err(SnapshotReadError::ReservedInputId);
        }
        Ok(Some(input_id))
    }

    /// The next field header of the current entity, or `None` at the
    /// end-of-entity sentinel.
    pub fn next_field(&mut self) -> Result<Option<FieldHeader>, SnapshotReadError> {
        if !self.reader.read_bit()? {
            return Ok(None);
        }

        let verbose = self.reader.read_bit()?;
        let net_id = UnsignedVariableInteger::<4>::de(&mut self.reader)?.get() as NetId;

        if verbose {
            let name = FieldName::de(&mut self.reader)?;
            Ok(Some(FieldHeader::Verbose { net_id, name }))
        } else {
            Ok(Some(FieldHeader::Short { net_id }))
        }
    }

    /// The encoded value following a field header.
    pub fn value_bytes(&mut self) -> Result<Vec<u8>, SnapshotReadError> {
        Ok(Vec::<u8>::de(&mut self.reader)?)
    }

    /// Consume the rest of the current entity block, values included.
    pub fn skip_entity(&mut self) -> Result<(), SnapshotReadError> {
        while self.next_field()?.is_some() {
            self.value_bytes()?;
        }
        Ok(())
    }
}
