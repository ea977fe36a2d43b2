//! Error handling for the console core.
//!
//! Two families of failure exist:
//! - Infrastructure faults (missing connection record, failed connect) are
//!   surfaced as [`MongoConsoleError`] through the crate [`Result`] alias.
//! - Command faults (invalid JSON arguments, server command errors) are data,
//!   carried in an `ExecutionResult` so the console input stays live.
//!
//! The `mongo` submodule turns driver errors into structured, sanitized
//! information usable in both paths.

pub mod kinds;
pub mod mongo;

pub use kinds::{
    ConfigError, ConnectionError, ExecutionError, MongoConsoleError, ParseError, Result,
};
pub use mongo::{ErrorDetails, ErrorInfo};
