//! BoxMeOut Oracle Registry Server
//!
//! HTTP and WebSocket front end for the oracle registry: admin membership
//! calls, signed oracle attestations, consensus queries and the audit stream.

pub mod app_state;
pub mod config;
pub mod expiry;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod websocket;
