//! Wicket - minimal HTTP/1.1 server
//!
//! Request parsing, routing, middleware and graceful shutdown over raw
//! TCP streams.

pub mod app;
pub mod config;
pub mod http;
pub mod server;
