//! HTTP boundary: configuration, session gate, and auth endpoints.

pub mod app;
pub mod authz;
pub mod config;
pub mod context;
pub mod middleware;
