use netsync::{PeerId, RpcChannel, RpcEndpoint, RpcMethod};

/// One submitted transport call. `peer` is `None` for broadcasts.
#[derive(Debug, Clone)]
pub struct Outbound {
    pub peer: Option<PeerId>,
    pub channel: RpcChannel,
    pub method: RpcMethod,
    pub payload: Vec<u8>,
}

/// An RPC endpoint that just queues everything, for the exchange pump (and
/// for asserting on what went over the wire).
pub struct QueueRpc {
    pub outbound: Vec<Outbound>,
}

impl QueueRpc {
    pub fn new() -> Self {
        Self {
            outbound: Vec::new(),
        }
    }

    pub fn drain(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.outbound)
    }

    /// Take every message addressed to `peer` (or broadcast), leaving the
    /// rest queued.
    pub fn drain_for(&mut self, peer: PeerId) -> Vec<Outbound> {
        let mut taken = Vec::new();
        let mut kept = Vec::new();
        for message in self.outbound.drain(..) {
            if message.peer.is_none() || message.peer == Some(peer) {
                taken.push(message);
            } else {
                kept.push(message);
            }
        }
        self.outbound = kept;
        taken
    }

    pub fn count(&self, method: RpcMethod) -> usize {
        self.outbound
            .iter()
            .filter(|message| message.method == method)
            .count()
    }
}

impl Default for QueueRpc {
    fn default() -> Self {
        Self::new()
    }
}

impl RpcEndpoint for QueueRpc {
    fn send(&mut self, peer: PeerId, channel: RpcChannel, method: RpcMethod, payload: Vec<u8>) {
        self.outbound.push(Outbound {
            peer: Some(peer),
            channel,
            method,
            payload,
        });
    }

    fn broadcast(&mut self, channel: RpcChannel, method: RpcMethod, payload: Vec<u8>) {
        self.outbound.push(Outbound {
            peer: None,
            channel,
            method,
            payload,
        });
    }
}
