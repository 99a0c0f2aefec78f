use netsync_shared::{
    SyncConfig, MAX_ADDITIONAL_TICK_SPEED, MIN_INPUT_BUFFER_SIZE, TICK_SPEED_NOTIFY_THRESHOLD,
};

use crate::peer::PeerState;

/// One step of the per-peer tick-rate control loop. Returns the quantized
/// speed to notify the client of, when the change is worth a packet.
///
/// Two nested proportional loops. The outer one settles the optimal input
/// buffer depth: a bad connection needs a deeper buffer to absorb loss, a
/// clean one wants a shallow buffer to cut virtual lag. The inner one turns
/// the depth error into a client tick speed adjustment, damped so the speed
/// stops oscillating once the target holds still.
pub(crate) fn update_tick_rate(
    peer: &mut PeerState,
    inputs_count: usize,
    packet_missing: bool,
    config: &SyncConfig,
    delta: f32,
) -> Option<i8> {
    if packet_missing {
        peer.tracer.notify_missing_packet();
    } else {
        peer.tracer.notify_packet_arrived();
    }

    let miss_packets = peer.tracer.missing_packets() as f32;
    let inputs_count = inputs_count as f32;
    let storage_size = config.server_input_storage_size as f32;

    {
        let target_level = ((miss_packets - inputs_count)
            / config.missing_snapshots_max_tolerance)
            .clamp(-2.0, 2.0);
        peer.optimal_buffer_size += target_level * config.optimal_size_acceleration * delta;
        peer.optimal_buffer_size = peer
            .optimal_buffer_size
            .clamp(MIN_INPUT_BUFFER_SIZE, storage_size);
    }

    {
        let speed_level =
            ((peer.optimal_buffer_size - inputs_count) / storage_size).clamp(-1.0, 1.0);
        let acc = speed_level * config.tick_acceleration * delta;
        let damp = peer.tick_additional_speed * -0.9;

        // The damping is fully applied only when it points against `acc`:
        // oscillations around a steady target get cut, while movement toward
        // a fresh target stays fast.
        peer.tick_additional_speed += acc + damp * ((sgn(acc) * sgn(damp) + 1.0) / 2.0);
        peer.tick_additional_speed = peer
            .tick_additional_speed
            .clamp(-MAX_ADDITIONAL_TICK_SPEED, MAX_ADDITIONAL_TICK_SPEED);
    }

    let quantized =
        (100.0 * peer.tick_additional_speed / MAX_ADDITIONAL_TICK_SPEED).round() as i8;

    peer.speed_notify_timer += delta;
    let change = (i16::from(quantized) - i16::from(peer.tick_speed_quantized)).abs();
    if change >= i16::from(TICK_SPEED_NOTIFY_THRESHOLD)
        && peer.speed_notify_timer >= config.tick_speedup_notification_delay
    {
        peer.tick_speed_quantized = quantized;
        peer.speed_notify_timer = 0.0;
        return Some(quantized);
    }

    None
}

fn sgn(value: f32) -> f32 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}
