use netsync_serde::{BitReader, BitWrite, BitWriter, Serde, UnsignedVariableInteger};

use crate::{
    inputs::{error::InputDecodeError, frame::InputFrame},
    types::InputId,
};

/// Pack a run of consecutive input frames into an unreliable payload.
///
/// The frames must be contiguous in input id (the player controller's history
/// always is). The wire format is run-length on similarity: a frame equal to
/// the previous one costs a single bit.
///
/// ```text
/// payload := first_id:u32 count (frame)*
/// frame   := dup:bit | 0 buffer_len buffer_bytes
/// ```
pub fn encode_input_packet(frames: &[InputFrame]) -> Vec<u8> {
    let mut writer = BitWriter::new();

    let first_id = frames.first().map(|frame| frame.input_id).unwrap_or(0);
    first_id.ser(&mut writer);
    UnsignedVariableInteger::<7>::new(frames.len() as u64).ser(&mut writer);

    let mut previous: Option<&InputFrame> = None;
    for frame in frames {
        let duplicate = previous.is_some_and(|prev| prev.similarity == frame.similarity);
        writer.write_bit(duplicate);
        if !duplicate {
            frame.buffer.ser(&mut writer);
        }
        previous = Some(frame);
    }

    writer.to_bytes()
}

/// Unpack an input payload into `(input_id, buffer)` pairs, oldest first.
pub fn decode_input_packet(payload: &[u8]) -> Result<Vec<(InputId, Vec<u8>)>, InputDecodeError> {
    let mut reader = BitReader::new(payload);

    let first_id = InputId::de(&mut reader)?;
    let count = UnsignedVariableInteger::<7>::de(&mut reader)?.get() as usize;
    if count == 0 {
        return Err(InputDecodeError::Empty);
    }
    if first_id == InputId::MAX || InputId::MAX - first_id < count as InputId {
        return Err(InputDecodeError::ReservedInputId);
    }

    let mut frames: Vec<(InputId, Vec<u8>)> = Vec::with_capacity(count);
    for offset in 0..count {
        let input_id = first_id + offset as InputId;
        let duplicate = reader.read_bit().map_err(InputDecodeError::from)?;
        let buffer = if duplicate {
            frames
                .last()
                .map(|(_, buffer)| buffer.clone())
                .ok_or(InputDecodeError::Empty)?
        } else {
            Vec::<u8>::de(&mut reader)?
        };
        frames.push((input_id, buffer));
    }

    Ok(frames)
}
