//! Control channel for callers of the bridge
//!
//! Clients send length-prefixed `NetworkCommand` frames and receive every
//! `NetworkResult` the engine posts, broadcasts included.

mod server;
mod session;

pub use server::ControlServer;
pub use session::ControlSession;
