//! Session management for connected WebSocket clients
//!
//! This module handles:
//! - Allocating connection ids and tracking live reply channels
//! - Routing replies and acknowledgments back by connection id
//! - Pruning connections whose client has gone away

mod connection;
mod manager;

pub use connection::{ClientHandle, SendError};
pub use manager::ConnectionRegistry;
