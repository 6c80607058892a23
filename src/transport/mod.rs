//! Network transport for the controller
//!
//! This module handles:
//! - The WebSocket endpoint feeding the ingress dispatcher
//! - Writer tasks delivering replies and acks to each client
//! - The auxiliary HTTP endpoints that act on the LED state directly

mod http;
mod websocket;

pub use http::{router, AppState};
