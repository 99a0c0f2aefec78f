pub mod exchange;
pub mod rpc;
pub mod session;
pub mod test_value;
pub mod test_world;
