/// The input buffer the server keeps per controller never shrinks below this,
/// no matter how clean the connection looks.
pub const MIN_INPUT_BUFFER_SIZE: f32 = 2.0;

/// Bound on the tick speed adjustment the server may ask of a client, in
/// iterations per second.
pub const MAX_ADDITIONAL_TICK_SPEED: f32 = 2.0;

/// Minimum change of the quantized tick speed (out of ±100) before a new
/// tick-speed update is worth a packet.
pub const TICK_SPEED_NOTIFY_THRESHOLD: i8 = 2;

/// Tunables of the synchronization engine. All fields have sensible defaults;
/// hosts override what they need before building the `Synchronizer`.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Period, in seconds, between forced server snapshot broadcasts.
    pub server_notify_state_interval: f32,
    /// Tolerance used by approximate value comparison.
    pub comparison_float_tolerance: f32,
    /// Sliding window size, in frames, of each `NetworkTracer`.
    ///
    /// This parameter depends a lot on the physics iterations per second; with
    /// 60 iterations per second, 1200 covers the latest 20 seconds. A smaller
    /// value makes the recovery mechanism too noisy, a bigger one too slow.
    pub network_traced_frames: usize,
    /// Max tolerance for missing inputs within the traced window; denominator
    /// of the outer tick-rate loop.
    pub missing_snapshots_max_tolerance: f32,
    /// Gain of the inner tick-rate loop (client tick acceleration).
    pub tick_acceleration: f32,
    /// Gain of the outer tick-rate loop (optimal buffer size acceleration).
    pub optimal_size_acceleration: f32,
    /// Maximum server-side input queue depth per controller. The server runs
    /// several frames behind the client; this bounds how many, to avoid
    /// introducing virtual lag.
    pub server_input_storage_size: usize,
    /// Maximum client-side input-frame history. With 60 iterations per second
    /// a good value is 300; too small and the client collects inputs
    /// intermittently, too large and it adds virtual delay.
    pub player_input_storage_size: usize,
    /// How many recent frames are packed into each outgoing input packet.
    /// Re-sending inputs is what survives the unreliable channel.
    pub max_redundant_inputs: usize,
    /// Minimum interval, in seconds, between tick-speed updates per peer.
    pub tick_speedup_notification_delay: f32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            server_notify_state_interval: 1.0,
            comparison_float_tolerance: 0.001,
            network_traced_frames: 1200,
            missing_snapshots_max_tolerance: 4.0,
            tick_acceleration: 2.0,
            optimal_size_acceleration: 2.5,
            server_input_storage_size: 30,
            player_input_storage_size: 300,
            max_redundant_inputs: 50,
            tick_speedup_notification_delay: 0.33,
        }
    }
}
