//! Standalone HTTP server.
//!
//! Binds a listener (port from the `port` environment variable, default 3000),
//! serves `GET /health` plus any routes merged in by the caller, and hands back
//! a [`ServerHandle`] owning the running server. Nothing is process-global, so
//! several servers can run side by side.
//!
//! The server includes graceful shutdown, either on request through the handle
//! or on SIGTERM/SIGINT.

mod server;
mod shutdown;

pub use server::{init, ServerBuilder, ServerError, ServerHandle};
