use netsync::{PeerId, RpcMethod, Synchronizer};

use crate::helpers::{rpc::Outbound, rpc::QueueRpc, test_value::TestValue, test_world::TestWorld};

/// A drop filter that lets everything through.
pub fn drop_nothing(_message: &Outbound) -> bool {
    false
}

/// Deliver everything a client submitted to the server synchronizer.
/// `drop` returns true for messages the "network" loses.
pub fn deliver_to_server(
    server: &mut Synchronizer<TestValue>,
    client_peer: PeerId,
    client_rpc: &mut QueueRpc,
    drop: &mut dyn FnMut(&Outbound) -> bool,
) {
    for message in client_rpc.drain() {
        if drop(&message) {
            continue;
        }
        match message.method {
            RpcMethod::SendInputs => server.receive_inputs(client_peer, &message.payload),
            RpcMethod::NotifyNeedFullSnapshot => server.notify_need_full_snapshot(client_peer),
            _ => {}
        }
    }
}

/// Deliver everything the server submitted for `client_peer` to that client.
pub fn deliver_to_client(
    client: &mut Synchronizer<TestValue>,
    client_world: &mut TestWorld,
    client_rpc: &mut QueueRpc,
    client_peer: PeerId,
    server_rpc: &mut QueueRpc,
    drop: &mut dyn FnMut(&Outbound) -> bool,
) {
    for message in server_rpc.drain_for(client_peer) {
        if drop(&message) {
            continue;
        }
        match message.method {
            RpcMethod::SendState => client.receive_state(client_world, client_rpc, &message.payload),
            RpcMethod::SendTickSpeed => client.receive_tick_speed(&message.payload),
            RpcMethod::DollSendEpoch => client.receive_doll_epoch(client_world, &message.payload),
            _ => {}
        }
    }
}
