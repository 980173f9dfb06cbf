//! Connection management for the daemon command socket
//!
//! This module handles:
//! - Persistent Unix or TCP connections with automatic reconnection
//! - NUL-terminated command frames out, reply lines in

mod manager;

pub use manager::{ConnectionConfig, ConnectionEvent, NetdConnection};
