//! HTTP front end for the gatehouse login and session service.
//!
//! The binary in `main.rs` wires PostgreSQL-backed stores into the router
//! built here; tests build the same router over the in-memory stores.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
