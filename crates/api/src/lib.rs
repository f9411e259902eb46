//! HTTP API: routing, identity extraction, and the authorization gate.

pub mod app;
pub mod authz;
pub mod config;
pub mod identity;
pub mod registry;
