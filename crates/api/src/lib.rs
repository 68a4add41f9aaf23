//! HTTP API: authentication, role checks, and the routes that publish
//! domain events.

pub mod app;
pub mod authz;
pub mod config;
pub mod context;
pub mod middleware;
