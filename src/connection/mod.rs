//! Connection management for MongoDB
//!
//! This module provides connection management functionality including:
//! - Connection URI construction from saved records
//! - A registry of pooled clients keyed by connection id
//! - Idle eviction and explicit invalidation
//! - One-off connection tests

mod connector;
mod pool;
mod uri;

pub use connector::{Connector, MongoConnector, ServerDescription};
pub use pool::{ConnectionPool, PooledClientStatus, TestConnectionResult};
pub use uri::{ConnectionTarget, DEFAULT_PORT, build_connection_uri, sanitize_uri};

#[cfg(test)]
mod tests;
