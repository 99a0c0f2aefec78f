use log::warn;

use netsync_serde::{BitWrite, BitWriter, Serde, UnsignedVariableInteger};

use crate::{
    host::SyncValue,
    registry::record::EntityRecord,
    snapshot::{change_set::EntityChange, SNAPSHOT_FORMAT_VERSION},
    types::{EntityPath, InputId},
};

/// Which fields of an entity go into the payload.
#[derive(Clone, Copy)]
pub enum FieldSelection<'a> {
    /// Every enabled field, with verbose headers. Full-snapshot mode.
    All,
    /// Only the fields this change entry marked dirty; verbose headers only
    /// for fields the peers have never seen.
    Dirty(&'a EntityChange),
}

/// Encodes state payloads. The grammar is a flat sequence of entity blocks:
///
/// ```text
/// payload      := version:u8 (1 entity_block)* 0
/// entity_block := verbose:bit net_id [path] has_input:bit [input_id:u32]
///                 (1 field_block)* 0
/// field_block  := verbose:bit field_net_id [name] value_len value_bytes
/// ```
///
/// Headers are verbose (id + name) the first time a peer could see an
/// identifier, short (id only) afterwards. Values are length-prefixed opaque
/// byte strings, so a reader can skip what it cannot resolve.
pub struct SnapshotWriter {
    out: BitWriter,
}

impl SnapshotWriter {
    pub fn new() -> Self {
        let mut out = BitWriter::new();
        SNAPSHOT_FORMAT_VERSION.ser(&mut out);
        Self { out }
    }

    /// Continue from an already-encoded prefix (the shared global section).
    pub fn resume(prefix: BitWriter) -> Self {
        Self { out: prefix }
    }

    /// The current stream, to be cloned as a shared prefix.
    pub fn fork(&self) -> BitWriter {
        self.out.clone()
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.out.write_bit(false);
        self.out.to_bytes()
    }

    /// Append one entity block. `path` being `Some` selects the verbose
    /// header. Controllers must pass their `input_id`.
    pub fn write_entity<V: SyncValue>(
        &mut self,
        record: &EntityRecord<V>,
        path: Option<&EntityPath>,
        input_id: Option<InputId>,
        selection: FieldSelection,
    ) {
        self.out.write_bit(true);

        match path {
            Some(path) => {
                self.out.write_bit(true);
                UnsignedVariableInteger::<7>::new(record.net_id).ser(&mut self.out);
                path.ser(&mut self.out);
            }
            None => {
                self.out.write_bit(false);
                UnsignedVariableInteger::<7>::new(record.net_id).ser(&mut self.out);
            }
        }

        match input_id {
            Some(input_id) => {
                self.out.write_bit(true);
                input_id.ser(&mut self.out);
            }
            None => self.out.write_bit(false),
        }

        for field in &record.fields {
            if !field.enabled {
                continue;
            }

            let (include, verbose) = match selection {
                FieldSelection::All => (true, true),
                FieldSelection::Dirty(change) => (
                    change.dirty_fields.contains(&field.name),
                    change.unknown_fields.contains(&field.name),
                ),
            };
            if !include {
                continue;
            }

            let Some(value) = &field.last_seen else {
                warn!(
                    "field `{}` of {:?} has no pulled value yet, skipped",
                    field.name, record.host_entity
                );
                continue;
            };

            self.out.write_bit(true);
            self.out.write_bit(verbose);
            UnsignedVariableInteger::<4>::new(field.net_id).ser(&mut self.out);
            if verbose {
                field.name.ser(&mut self.out);
            }

            let mut value_writer = BitWriter::new();
            value.encode(&mut value_writer);
            value_writer.to_bytes().ser(&mut self.out);
        }

        self.out.write_bit(false);
    }
}

impl Default for SnapshotWriter {
    fn default() -> Self {
        Self::new()
    }
}
