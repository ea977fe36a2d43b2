//! Query executor for CRUD operations
//!
//! This module provides the QueryExecutor which handles collection-scope
//! data operations:
//! - Read: find, findOne, countDocuments, distinct
//! - Write: insertOne, insertMany, updateOne, updateMany, deleteOne, deleteMany
//! - Aggregate: aggregate
//!
//! The module is organized into sub-modules by operation type:
//! - `read`: Read operations
//! - `write`: Write operations
//! - `aggregate`: Aggregation operations

use crate::error::{ExecutionError, Result};

use super::context::ExecutionContext;
use super::plan::Operation;
use super::result::ExecutionResult;

// Sub-modules
mod aggregate;
mod read;
mod write;

/// Query executor for CRUD operations
pub struct QueryExecutor {
    /// Execution context
    context: ExecutionContext,
}

impl QueryExecutor {
    /// Create a new query executor
    ///
    /// # Arguments
    /// * `context` - Execution context
    pub fn new(context: ExecutionContext) -> Self {
        Self { context }
    }

    /// Whether this executor handles the operation
    pub fn handles(op: &Operation) -> bool {
        matches!(
            op,
            Operation::Find { .. }
                | Operation::FindOne { .. }
                | Operation::CountDocuments { .. }
                | Operation::Distinct { .. }
                | Operation::InsertOne { .. }
                | Operation::InsertMany { .. }
                | Operation::UpdateOne { .. }
                | Operation::UpdateMany { .. }
                | Operation::DeleteOne { .. }
                | Operation::DeleteMany { .. }
                | Operation::Aggregate { .. }
        )
    }

    /// Execute a data operation
    ///
    /// # Arguments
    /// * `op` - Operation to execute
    ///
    /// # Returns
    /// * `Result<ExecutionResult>` - Execution result or error
    pub async fn execute(&self, op: Operation) -> Result<ExecutionResult> {
        match op {
            Operation::Find {
                collection,
                filter,
                projection,
                sort,
                limit,
                skip,
            } => {
                self.execute_find(&collection, filter, projection, sort, limit, skip)
                    .await
            }
            Operation::FindOne {
                collection,
                filter,
                projection,
            } => self.execute_find_one(&collection, filter, projection).await,
            Operation::CountDocuments { collection, filter } => {
                self.execute_count(&collection, filter).await
            }
            Operation::Distinct {
                collection,
                field,
                filter,
            } => self.execute_distinct(&collection, &field, filter).await,
            Operation::InsertOne {
                collection,
                document,
            } => self.execute_insert_one(&collection, document).await,
            Operation::InsertMany {
                collection,
                documents,
            } => self.execute_insert_many(&collection, documents).await,
            Operation::UpdateOne {
                collection,
                filter,
                update,
            } => self.execute_update(&collection, filter, update, false).await,
            Operation::UpdateMany {
                collection,
                filter,
                update,
            } => self.execute_update(&collection, filter, update, true).await,
            Operation::DeleteOne { collection, filter } => {
                self.execute_delete(&collection, filter, false).await
            }
            Operation::DeleteMany { collection, filter } => {
                self.execute_delete(&collection, filter, true).await
            }
            Operation::Aggregate {
                collection,
                pipeline,
            } => self.execute_aggregate(&collection, pipeline).await,
            other => Err(ExecutionError::InvalidParameters(format!(
                "not a collection data operation: {other:?}"
            ))
            .into()),
        }
    }
}
