//! Execution context
//!
//! This module provides the ExecutionContext handed to executors for a
//! single invocation: the pooled client and the database the caller selected.

use mongodb::bson::Document;
use mongodb::{Client, Collection, Database};

/// Client and database for one command execution
#[derive(Clone, Debug)]
pub struct ExecutionContext {
    /// Pooled client for the connection
    client: Client,

    /// Database selected by the caller
    database: String,
}

impl ExecutionContext {
    /// Create a new execution context
    ///
    /// # Arguments
    /// * `client` - Pooled client
    /// * `database` - Database selected by the caller
    pub fn new(client: Client, database: impl Into<String>) -> Self {
        Self {
            client,
            database: database.into(),
        }
    }

    /// Get current database name
    pub fn get_current_database(&self) -> &str {
        &self.database
    }

    /// Get database handle
    pub fn get_database(&self) -> Database {
        self.client.database(&self.database)
    }

    /// Get collection handle in the current database
    pub fn get_collection(&self, name: &str) -> Collection<Document> {
        self.get_database().collection(name)
    }

    /// Get client handle
    pub fn get_client(&self) -> &Client {
        &self.client
    }
}
