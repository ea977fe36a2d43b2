//! MongoDB console library
//!
//! Core of a MongoDB console: a pool of clients keyed by saved connection id,
//! a parser for a practical subset of mongo shell syntax, and an executor
//! that renders results as MongoDB extended JSON.
//!
//! # Modules
//!
//! - `cli`: Command-line interface and argument parsing
//! - `codec`: Extended JSON decoding and encoding
//! - `config`: Configuration management
//! - `connection`: Pooled client registry
//! - `error`: Error types and handling
//! - `executor`: Command execution engine
//! - `parser`: Command parsing
//! - `store`: Saved connection records
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use mongo_console::{CommandInterpreter, ConnectionPool, config::Config};
//! use mongo_console::store::FileConnectionStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(None)?;
//!     let store = Arc::new(FileConnectionStore::new(config.store.connections_file.clone()));
//!     let pool = Arc::new(ConnectionPool::new(store, config.pool));
//!
//!     let interpreter = CommandInterpreter::new(pool.clone());
//!     let result = interpreter
//!         .interpret_and_execute("local", "test", "db.users.countDocuments({})")
//!         .await?;
//!     println!("{}", result.to_json());
//!
//!     pool.close_all_connections().await;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod codec;
pub mod config;
pub mod connection;
pub mod error;
pub mod executor;
pub mod parser;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use connection::ConnectionPool;
pub use error::{MongoConsoleError, Result};
pub use executor::{CommandInterpreter, ExecutionResult};
pub use parser::{ParsedCommand, Parser};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
