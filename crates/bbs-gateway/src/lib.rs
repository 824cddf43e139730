//! # bbs-gateway
//!
//! The host's transport layer: an op-coded WebSocket gateway for streaming
//! clients and a stateless JSON/HTTP surface, both mounted on one router in
//! one process. The NotificationHub lives here and fans events out to
//! subscribed streaming connections.

pub mod connection;
pub mod handlers;
pub mod hub;
pub mod protocol;
pub mod rest;
pub mod server;

pub use server::{create_app, create_gateway_state, create_router, run, run_server, GatewayState};
