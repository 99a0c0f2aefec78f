use std::collections::VecDeque;

use log::{debug, warn};

use netsync_serde::{BitReader, BitWriter};
use netsync_shared::{
    decode_input_packet, EpochId, HostEntity, HostWorld, InputDecodeError, InputId, SyncValue,
};

struct QueuedInput {
    input_id: InputId,
    buffer: Vec<u8>,
}

/// The server side of one player's input pipeline: reorders redundant input
/// packets into a queue and feeds the simulation exactly one input per tick,
/// synthesizing ghost inputs where the real ones did not arrive in time.
pub struct ServerController {
    queue: VecDeque<QueuedInput>,
    /// `InputId::MAX` until the first input is consumed; such a controller is
    /// "not yet fetchable" and stays out of snapshots.
    current_input_id: InputId,
    /// The last real input applied, reused verbatim while the queue is dry.
    last_applied_buffer: Vec<u8>,
    ghost_input_count: u32,
    packet_missing: bool,
    epoch: EpochId,
}

impl ServerController {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            current_input_id: InputId::MAX,
            last_applied_buffer: Vec::new(),
            ghost_input_count: 0,
            packet_missing: false,
            epoch: 0,
        }
    }

    pub fn current_input_id(&self) -> InputId {
        self.current_input_id
    }

    pub fn inputs_count(&self) -> usize {
        self.queue.len()
    }

    pub fn ghost_input_count(&self) -> u32 {
        self.ghost_input_count
    }

    /// Whether this tick went without a usable fresh input. Consumed by the
    /// tick-rate controller once per tick.
    pub fn take_packet_missing(&mut self) -> bool {
        std::mem::take(&mut self.packet_missing)
    }

    /// Enqueue the frames of one redundant input packet. Frames at or below
    /// the consumed/enqueued watermark are expected redundancy and silently
    /// discarded.
    pub fn receive_inputs(
        &mut self,
        payload: &[u8],
        storage_cap: usize,
    ) -> Result<usize, InputDecodeError> {
        let frames = decode_input_packet(payload)?;

        let mut accepted = 0;
        for (input_id, buffer) in frames {
            if self.current_input_id != InputId::MAX && input_id <= self.current_input_id {
                continue;
            }
            if self
                .queue
                .back()
                .is_some_and(|back| input_id <= back.input_id)
            {
                continue;
            }
            if self.queue.len() >= storage_cap {
                warn!("input queue is full, discarding input {input_id}");
                break;
            }
            self.queue.push_back(QueuedInput { input_id, buffer });
            accepted += 1;
        }

        Ok(accepted)
    }

    /// Advance the controller by one tick. Returns false only while the
    /// controller has never seen an input.
    pub fn fetch_next_input<V: SyncValue>(
        &mut self,
        host: &mut dyn HostWorld<Value = V>,
        host_entity: HostEntity,
        delta: f32,
    ) -> bool {
        if self.current_input_id == InputId::MAX {
            // Startup: adopt whatever arrives first, no ghost fill before it.
            return match self.queue.pop_front() {
                Some(input) => {
                    self.current_input_id = input.input_id;
                    self.apply(host, host_entity, delta, &input.buffer);
                    self.last_applied_buffer = input.buffer;
                    self.packet_missing = false;
                    true
                }
                None => false,
            };
        }

        let expected = self.current_input_id + 1;

        while self
            .queue
            .front()
            .is_some_and(|front| front.input_id <= self.current_input_id)
        {
            self.queue.pop_front();
        }

        match self.queue.front().map(|front| front.input_id) {
            Some(front_id) if front_id == expected => {
                let input = self
                    .queue
                    .pop_front()
                    .expect("the queue front was just observed");
                self.current_input_id = expected;
                self.packet_missing = false;
                self.apply(host, host_entity, delta, &input.buffer);
                self.last_applied_buffer = input.buffer;
            }
            Some(front_id) => {
                // A later input is queued but `expected` never arrived: run a
                // ghost input under its id to keep the tick count aligned.
                debug!("input {expected} missing (next queued: {front_id}), ghost input used");
                self.current_input_id = expected;
                self.ghost_input_count += 1;
                self.packet_missing = true;
                self.apply(host, host_entity, delta, &[]);
            }
            None => {
                // Queue ran dry: repeat the previous input under the same id.
                self.packet_missing = true;
                let buffer = std::mem::take(&mut self.last_applied_buffer);
                self.apply(host, host_entity, delta, &buffer);
                self.last_applied_buffer = buffer;
            }
        }

        true
    }

    /// Advance the doll epoch and capture the state payload for it.
    pub fn collect_epoch<V: SyncValue>(
        &mut self,
        host: &mut dyn HostWorld<Value = V>,
        host_entity: HostEntity,
    ) -> (EpochId, Vec<u8>) {
        self.epoch += 1;
        let mut writer = BitWriter::new();
        host.collect_epoch_state(host_entity, &mut writer);
        (self.epoch, writer.to_bytes())
    }

    fn apply<V: SyncValue>(
        &self,
        host: &mut dyn HostWorld<Value = V>,
        host_entity: HostEntity,
        delta: f32,
        buffer: &[u8],
    ) {
        let mut reader = BitReader::new(buffer);
        host.apply_input(host_entity, delta, &mut reader);
    }
}

impl Default for ServerController {
    fn default() -> Self {
        Self::new()
    }
}
