use netsync_serde::{BitReader, BitWriter, Serde, SerdeErr, UnsignedVariableInteger};

use crate::types::{EntityPath, EpochId, NetId};

/// One doll state update: which controller it belongs to (id plus the path a
/// first-sight receiver resolves it with — epochs flow outside the snapshot
/// path, so the id alone may be unknown), the epoch counter, and the
/// host-encoded interpolation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpochPayload {
    pub net_id: NetId,
    pub path: EntityPath,
    pub epoch: EpochId,
    pub state: Vec<u8>,
}

impl EpochPayload {
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = BitWriter::new();
        UnsignedVariableInteger::<7>::new(self.net_id).ser(&mut writer);
        self.path.ser(&mut writer);
        self.epoch.ser(&mut writer);
        self.state.ser(&mut writer);
        writer.to_bytes()
    }

    pub fn decode(payload: &[u8]) -> Result<Self, SerdeErr> {
        let mut reader = BitReader::new(payload);
        let net_id = UnsignedVariableInteger::<7>::de(&mut reader)?.get() as NetId;
        let path = EntityPath::de(&mut reader)?;
        let epoch = EpochId::de(&mut reader)?;
        let state = Vec::<u8>::de(&mut reader)?;
        Ok(Self {
            net_id,
            path,
            epoch,
            state,
        })
    }
}
