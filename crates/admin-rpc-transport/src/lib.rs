//! Transport adapters for the admin dashboard RPC channel.
//!
//! Each adapter pumps a concrete connection into an `admin_rpc_core::Channel`:
//! - Line-delimited JSON over any async byte stream (TCP, pipes)
//! - WebSocket client (feature: client)
//! - WebSocket server upgrade via axum (feature: server)

pub mod lines;

#[cfg(feature = "client")]
pub mod connect;

#[cfg(feature = "server")]
pub mod websocket;

#[cfg(feature = "client")]
pub use connect::{ConnectError, connect};
