use std::collections::VecDeque;

use log::warn;

use netsync_serde::{BitReader, BitWriter};
use netsync_shared::{
    encode_input_packet, HostEntity, HostWorld, InputFrame, InputId, RpcChannel, RpcEndpoint,
    RpcMethod, SyncConfig, SyncValue, MAX_ADDITIONAL_TICK_SPEED, SERVER_PEER_ID,
};

/// The local player's input pipeline: a sub-tick scheduler fed by the
/// server-steered tick speed, a bounded history of captured input frames, and
/// the redundant transmission of that history.
pub struct PlayerController {
    /// Id of the most recently captured input; `InputId::MAX` before any.
    current_input_id: InputId,
    /// Next id to hand out.
    input_buffers_counter: InputId,
    time_bank: f32,
    /// Set by the server via tick-speed updates, in iterations per second.
    tick_additional_speed: f32,
    frames: VecDeque<InputFrame>,
    has_new_input: bool,
}

impl PlayerController {
    pub fn new() -> Self {
        Self {
            current_input_id: InputId::MAX,
            input_buffers_counter: 1,
            time_bank: 0.0,
            tick_additional_speed: 0.0,
            frames: VecDeque::new(),
            has_new_input: false,
        }
    }

    pub fn current_input_id(&self) -> InputId {
        self.current_input_id
    }

    pub fn tick_additional_speed(&self) -> f32 {
        self.tick_additional_speed
    }

    pub fn set_tick_speed_quantized(&mut self, quantized: i8) {
        self.tick_additional_speed =
            (f32::from(quantized) / 100.0) * MAX_ADDITIONAL_TICK_SPEED;
    }

    pub fn has_new_input(&self) -> bool {
        self.has_new_input
    }

    pub fn clear_new_input(&mut self) {
        self.has_new_input = false;
    }

    pub fn pending_inputs(&self) -> usize {
        self.frames.len()
    }

    /// How many sub-ticks this frame should run, given the time bank and the
    /// pretended tick rate. The time is only pretended to advance faster, so
    /// every sub-tick still steps with the real `delta`.
    pub fn calculate_sub_ticks(&mut self, delta: f32, iterations_per_second: f32) -> u32 {
        let pretended_delta = 1.0 / (iterations_per_second + self.tick_additional_speed);

        self.time_bank += delta;
        let sub_ticks = (self.time_bank / pretended_delta).floor() as u32;
        self.time_bank -= sub_ticks as f32 * pretended_delta;
        sub_ticks
    }

    /// Capture a fresh input, apply it locally, and ship the recent history
    /// to the server.
    pub fn process<V: SyncValue>(
        &mut self,
        host: &mut dyn HostWorld<Value = V>,
        rpc: &mut dyn RpcEndpoint,
        host_entity: HostEntity,
        delta: f32,
        config: &SyncConfig,
    ) {
        if self.frames.len() >= config.player_input_storage_size {
            // The server stopped acknowledging inputs; collecting more would
            // only grow the rewind window.
            warn!("input history is full, no new input collected this sub-tick");
            self.has_new_input = false;
            return;
        }

        let mut writer = BitWriter::new();
        host.collect_input(host_entity, delta, &mut writer);
        let buffer = writer.to_bytes();

        self.current_input_id = self.input_buffers_counter;
        self.input_buffers_counter += 1;
        self.frames
            .push_back(InputFrame::new(self.current_input_id, buffer.clone()));
        self.has_new_input = true;

        let mut reader = BitReader::new(&buffer);
        host.apply_input(host_entity, delta, &mut reader);

        self.send_input_packet(rpc, config);
    }

    /// Re-apply the buffered input at `index` during a rewind replay.
    /// Returns whether further buffered inputs remain.
    pub fn process_instant<V: SyncValue>(
        &mut self,
        index: usize,
        host: &mut dyn HostWorld<Value = V>,
        host_entity: HostEntity,
        delta: f32,
    ) -> bool {
        let Some(frame) = self.frames.get(index) else {
            warn!("replay index {index} is out of the input history");
            return false;
        };

        let mut reader = BitReader::new(&frame.buffer);
        host.apply_input(host_entity, delta, &mut reader);

        index + 1 < self.frames.len()
    }

    /// Drop every frame the server has checked. Returns how many frames are
    /// left, which is exactly the number of replay sub-ticks a rewind takes.
    pub fn notify_input_checked(&mut self, checked_input_id: InputId) -> usize {
        while self
            .frames
            .front()
            .is_some_and(|frame| frame.input_id <= checked_input_id)
        {
            self.frames.pop_front();
        }
        self.frames.len()
    }

    pub fn last_known_input(&self) -> InputId {
        self.frames
            .back()
            .map(|frame| frame.input_id)
            .unwrap_or(self.current_input_id)
    }

    fn send_input_packet(&self, rpc: &mut dyn RpcEndpoint, config: &SyncConfig) {
        let start = self.frames.len().saturating_sub(config.max_redundant_inputs);
        let frames: Vec<InputFrame> = self.frames.iter().skip(start).cloned().collect();

        rpc.send(
            SERVER_PEER_ID,
            RpcChannel::Unreliable,
            RpcMethod::SendInputs,
            encode_input_packet(&frames),
        );
    }
}

impl Default for PlayerController {
    fn default() -> Self {
        Self::new()
    }
}
