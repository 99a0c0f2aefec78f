use std::collections::VecDeque;

use netsync_shared::{EpochId, HostEntity, HostWorld, NetworkTracer, SyncValue};

/// How many epoch states a doll buffers before the oldest are dropped.
const EPOCH_BUFFER_CAP: usize = 64;

/// A remote player's controller as observed on a non-owning client.
///
/// Dolls never predict: they buffer `(epoch, state)` pairs from the server
/// and advance a blend factor between consecutive pairs each tick. Missing
/// epochs are tracked by the doll's own tracer.
pub struct DollController {
    tracer: NetworkTracer,
    epochs: VecDeque<(EpochId, Vec<u8>)>,
    /// Blend position between the two front epochs, in epoch units.
    advancing: f32,
}

impl DollController {
    pub fn new(traced_frames: usize) -> Self {
        Self {
            tracer: NetworkTracer::new(traced_frames),
            epochs: VecDeque::new(),
            advancing: 0.0,
        }
    }

    pub fn current_epoch(&self) -> Option<EpochId> {
        self.epochs.front().map(|(epoch, _)| *epoch)
    }

    pub fn missing_epochs(&self) -> usize {
        self.tracer.missing_packets()
    }

    pub fn receive_epoch(&mut self, epoch: EpochId, state: Vec<u8>) {
        if let Some((last, _)) = self.epochs.back() {
            if epoch <= *last {
                // late duplicate from the unreliable channel
                return;
            }
            for _ in (*last + 1)..epoch {
                self.tracer.notify_missing_packet();
            }
        }
        self.tracer.notify_packet_arrived();

        self.epochs.push_back((epoch, state));
        while self.epochs.len() > EPOCH_BUFFER_CAP {
            self.epochs.pop_front();
        }
    }

    /// Advance the blend and hand the surrounding epoch pair to the host.
    /// Returns the epoch currently blended from, once two states exist.
    pub fn next_epoch<V: SyncValue>(
        &mut self,
        delta: f32,
        host: &mut dyn HostWorld<Value = V>,
        host_entity: HostEntity,
    ) -> Option<EpochId> {
        if self.epochs.len() < 2 {
            return self.current_epoch();
        }

        self.advancing += delta * host.iterations_per_second();
        while self.advancing >= 1.0 && self.epochs.len() > 2 {
            self.epochs.pop_front();
            self.advancing -= 1.0;
        }

        let (from_epoch, from_state) = &self.epochs[0];
        let (_, to_state) = &self.epochs[1];
        host.apply_epoch_state(host_entity, self.advancing.min(1.0), from_state, to_state);
        Some(*from_epoch)
    }
}
