//! Admin executor for administrative commands
//!
//! This module provides the AdminExecutor which handles MongoDB administrative operations:
//! - Server: list databases, raw database commands
//! - Database management: collection names, stats, create collection, drop database
//! - Collection management: indexes, collection stats, drop

use mongodb::IndexModel;
use mongodb::bson::{self, Bson, Document, doc};
use mongodb::options::IndexOptions;
use serde_json::json;
use tracing::{debug, info};

use crate::error::{ExecutionError, Result};

use super::context::ExecutionContext;
use super::plan::Operation;
use super::result::{ExecutionResult, ResultData};

/// Executor for administrative commands
pub struct AdminExecutor {
    /// Execution context
    context: ExecutionContext,
}

impl AdminExecutor {
    /// Create a new admin executor
    ///
    /// # Arguments
    /// * `context` - Execution context
    pub fn new(context: ExecutionContext) -> Self {
        Self { context }
    }

    /// Execute an administrative command
    ///
    /// # Arguments
    /// * `op` - Operation to execute
    ///
    /// # Returns
    /// * `Result<ExecutionResult>` - Execution result or error
    pub async fn execute(&self, op: Operation) -> Result<ExecutionResult> {
        match op {
            Operation::ListDatabases => self.list_databases().await,
            Operation::ListCollectionNames => self.list_collection_names().await,
            Operation::DatabaseStats => self.run_command(doc! { "dbStats": 1 }).await,
            Operation::CreateCollection { name } => self.create_collection(name).await,
            Operation::DropDatabase => self.drop_database().await,
            Operation::RunCommand(command) => self.run_command(command).await,
            Operation::GetIndexes { collection } => self.list_indexes(&collection).await,
            Operation::CollectionStats { collection } => {
                self.run_command(doc! { "collStats": collection }).await
            }
            Operation::DropCollection { collection } => self.drop_collection(collection).await,
            Operation::CreateIndex {
                collection,
                keys,
                options,
            } => self.create_index(&collection, keys, options).await,
            Operation::DropIndex { collection, name } => {
                self.drop_index(&collection, name).await
            }
            other => Err(ExecutionError::InvalidParameters(format!(
                "not an administrative operation: {other:?}"
            ))
            .into()),
        }
    }

    /// List databases on the server
    ///
    /// # Returns
    /// * `Result<ExecutionResult>` - The `listDatabases` reply (`databases`, `totalSize`, ...)
    async fn list_databases(&self) -> Result<ExecutionResult> {
        info!("Listing databases");

        let reply = self
            .context
            .get_client()
            .database("admin")
            .run_command(doc! { "listDatabases": 1 })
            .await?;

        Ok(ExecutionResult::from_data(ResultData::Document(reply)))
    }

    /// List collection names in the current database, sorted
    async fn list_collection_names(&self) -> Result<ExecutionResult> {
        let db_name = self.context.get_current_database();
        info!("Listing collections in database '{}'", db_name);

        let mut names = self.context.get_database().list_collection_names().await?;
        names.sort();

        debug!("Found {} collections", names.len());
        Ok(ExecutionResult::from_data(ResultData::List(names)))
    }

    /// Create a collection in the current database
    async fn create_collection(&self, name: String) -> Result<ExecutionResult> {
        info!(
            "Creating collection '{}' in database '{}'",
            name,
            self.context.get_current_database()
        );

        self.context.get_database().create_collection(&name).await?;

        Ok(ExecutionResult::from_data(ResultData::Json(
            json!({ "ok": 1, "collection": name }),
        )))
    }

    /// Drop the current database
    async fn drop_database(&self) -> Result<ExecutionResult> {
        let db_name = self.context.get_current_database().to_string();
        info!("Dropping database '{}'", db_name);

        self.context.get_database().drop().await?;

        Ok(ExecutionResult::from_data(ResultData::Json(
            json!({ "ok": 1, "dropped": db_name }),
        )))
    }

    /// Run a command document against the current database
    ///
    /// # Arguments
    /// * `command` - Command document, first key names the command
    ///
    /// # Returns
    /// * `Result<ExecutionResult>` - Server reply
    async fn run_command(&self, command: Document) -> Result<ExecutionResult> {
        debug!(
            "Running command {:?} on database '{}'",
            command.keys().next(),
            self.context.get_current_database()
        );

        let reply = self.context.get_database().run_command(command).await?;
        Ok(ExecutionResult::from_data(ResultData::Document(reply)))
    }

    /// List indexes on a collection
    ///
    /// Uses the `listIndexes` command so index specs come back exactly as the
    /// server stores them. A collection holds at most 64 indexes, which always
    /// fit in the first batch.
    ///
    /// # Arguments
    /// * `collection` - Collection name
    ///
    /// # Returns
    /// * `Result<ExecutionResult>` - Index specification documents
    async fn list_indexes(&self, collection: &str) -> Result<ExecutionResult> {
        info!(
            "Listing indexes for collection '{}' in database '{}'",
            collection,
            self.context.get_current_database()
        );

        let db = self.context.get_database();
        let reply = db.run_command(doc! { "listIndexes": collection }).await?;
        let first_batch = reply
            .get_document("cursor")
            .and_then(|cursor| cursor.get_array("firstBatch"))
            .map_err(|e| {
                ExecutionError::QueryFailed(format!("Unexpected listIndexes reply: {e}"))
            })?;

        let indexes: Vec<Document> = first_batch
            .iter()
            .filter_map(|spec| match spec {
                Bson::Document(doc) => Some(doc.clone()),
                _ => None,
            })
            .collect();

        debug!("Found {} indexes", indexes.len());
        Ok(ExecutionResult::from_data(ResultData::Documents(indexes)))
    }

    /// Parse index options from a document
    ///
    /// # Arguments
    /// * `options_doc` - Options document to parse
    ///
    /// # Returns
    /// * `Result<Option<IndexOptions>>` - Parsed options or error
    fn parse_index_options(options_doc: Option<Document>) -> Result<Option<IndexOptions>> {
        match options_doc {
            Some(opts) => {
                let index_opts = bson::from_document(opts).map_err(|e| {
                    ExecutionError::InvalidParameters(format!("Invalid index options: {e}"))
                })?;
                Ok(Some(index_opts))
            }
            None => Ok(None),
        }
    }

    /// Create an index on a collection
    ///
    /// # Arguments
    /// * `collection` - Collection name
    /// * `keys` - Index keys document
    /// * `options` - Optional index options
    ///
    /// # Returns
    /// * `Result<ExecutionResult>` - Name of the created index
    async fn create_index(
        &self,
        collection: &str,
        keys: Document,
        options: Option<Document>,
    ) -> Result<ExecutionResult> {
        debug!(
            "Creating index on collection '{}' with keys: {:?}",
            collection, keys
        );

        let index_options = Self::parse_index_options(options)?;
        let model = IndexModel::builder()
            .keys(keys)
            .options(index_options)
            .build();

        let result = self
            .context
            .get_collection(collection)
            .create_index(model)
            .await?;

        info!("Created index '{}'", result.index_name);
        Ok(ExecutionResult::from_data(ResultData::Text(
            result.index_name,
        )))
    }

    /// Drop an index by name
    async fn drop_index(&self, collection: &str, name: String) -> Result<ExecutionResult> {
        info!("Dropping index '{}' on collection '{}'", name, collection);

        self.context
            .get_collection(collection)
            .drop_index(name.as_str())
            .await?;

        Ok(ExecutionResult::from_data(ResultData::Json(
            json!({ "ok": 1, "dropped": name }),
        )))
    }

    /// Drop a collection
    async fn drop_collection(&self, collection: String) -> Result<ExecutionResult> {
        info!(
            "Dropping collection '{}' in database '{}'",
            collection,
            self.context.get_current_database()
        );

        self.context.get_collection(&collection).drop().await?;

        Ok(ExecutionResult::from_data(ResultData::Json(
            json!({ "ok": 1, "dropped": collection }),
        )))
    }
}
