use netsync_shared::{NetworkTracer, MIN_INPUT_BUFFER_SIZE};

/// Everything the server keeps per connected peer.
pub struct PeerState {
    pub tracer: NetworkTracer,
    /// Target depth of this peer's input buffer, steered by the outer
    /// tick-rate loop.
    pub optimal_buffer_size: f32,
    /// Current tick speed adjustment requested of the client, in iterations
    /// per second.
    pub tick_additional_speed: f32,
    /// Last quantized adjustment actually sent.
    pub tick_speed_quantized: i8,
    /// Seconds since the last tick-speed update went out.
    pub speed_notify_timer: f32,
    /// Broadcast on the next tick regardless of the state timer.
    pub force_notify_snapshot: bool,
    /// The next broadcast to this peer carries every enabled field with
    /// verbose headers.
    pub need_full_snapshot: bool,
}

impl PeerState {
    pub fn new(traced_frames: usize) -> Self {
        Self {
            tracer: NetworkTracer::new(traced_frames),
            optimal_buffer_size: MIN_INPUT_BUFFER_SIZE,
            tick_additional_speed: 0.0,
            tick_speed_quantized: 0,
            speed_notify_timer: 0.0,
            force_notify_snapshot: false,
            need_full_snapshot: false,
        }
    }
}
