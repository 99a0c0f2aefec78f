use crate::types::InputId;

/// One captured input, kept client-side until the server acknowledges having
/// checked it.
#[derive(Debug, Clone)]
pub struct InputFrame {
    pub input_id: InputId,
    pub buffer: Vec<u8>,
    /// Redundancy key: frames with equal similarity are collapsed in the
    /// outgoing packet.
    pub similarity: u64,
}

impl InputFrame {
    pub fn new(input_id: InputId, buffer: Vec<u8>) -> Self {
        let similarity = similarity_of(&buffer);
        Self {
            input_id,
            buffer,
            similarity,
        }
    }
}

/// FNV-1a over the captured input bytes. Identical inputs hash identically,
/// which is all the run-length elision needs.
pub fn similarity_of(buffer: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in buffer {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}
