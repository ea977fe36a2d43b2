//! Write operations for query executor
//!
//! This module contains all write operations including:
//! - insertOne, insertMany
//! - updateOne, updateMany
//! - deleteOne, deleteMany

use mongodb::bson::{Bson, Document};
use mongodb::options::UpdateModifications;
use tracing::{debug, info};

use crate::error::Result;

use super::super::plan::UpdateSpec;
use super::super::result::{ExecutionResult, ResultData};

impl From<UpdateSpec> for UpdateModifications {
    fn from(spec: UpdateSpec) -> Self {
        match spec {
            UpdateSpec::Document(doc) => UpdateModifications::Document(doc),
            UpdateSpec::Pipeline(stages) => UpdateModifications::Pipeline(stages),
        }
    }
}

/// Write operations implementation
impl super::QueryExecutor {
    /// Execute insertOne command
    ///
    /// # Arguments
    /// * `collection` - Collection name
    /// * `document` - Document to insert
    ///
    /// # Returns
    /// * `Result<ExecutionResult>` - Insert result
    pub(super) async fn execute_insert_one(
        &self,
        collection: &str,
        document: Document,
    ) -> Result<ExecutionResult> {
        debug!("Executing insertOne on collection '{}'", collection);

        let result = self
            .context
            .get_collection(collection)
            .insert_one(document)
            .await?;

        Ok(ExecutionResult::from_data(ResultData::InsertOne {
            inserted_id: result.inserted_id,
        }))
    }

    /// Execute insertMany command
    ///
    /// The driver reports ids keyed by input position; they are returned in
    /// that order.
    ///
    /// # Arguments
    /// * `collection` - Collection name
    /// * `documents` - Documents to insert
    ///
    /// # Returns
    /// * `Result<ExecutionResult>` - Insert result
    pub(super) async fn execute_insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<ExecutionResult> {
        info!(
            "Executing insertMany on collection '{}' with {} documents",
            collection,
            documents.len()
        );

        let result = self
            .context
            .get_collection(collection)
            .insert_many(documents)
            .await?;

        let mut indexed: Vec<(usize, Bson)> = result.inserted_ids.into_iter().collect();
        indexed.sort_by_key(|(index, _)| *index);
        let inserted_ids = indexed.into_iter().map(|(_, id)| id).collect();

        Ok(ExecutionResult::from_data(ResultData::InsertMany {
            inserted_ids,
        }))
    }

    /// Execute updateOne or updateMany
    ///
    /// # Arguments
    /// * `collection` - Collection name
    /// * `filter` - Query filter
    /// * `update` - Operator document or pipeline
    /// * `many` - Update every match instead of the first
    pub(super) async fn execute_update(
        &self,
        collection: &str,
        filter: Document,
        update: UpdateSpec,
        many: bool,
    ) -> Result<ExecutionResult> {
        debug!(
            "Executing {} on collection '{}' with filter: {:?}",
            if many { "updateMany" } else { "updateOne" },
            collection,
            filter
        );

        let coll = self.context.get_collection(collection);
        let result = if many {
            coll.update_many(filter, update).await?
        } else {
            coll.update_one(filter, update).await?
        };

        Ok(ExecutionResult::from_data(ResultData::Update {
            matched: result.matched_count,
            modified: result.modified_count,
            upserted_id: result.upserted_id,
        }))
    }

    /// Execute deleteOne or deleteMany
    pub(super) async fn execute_delete(
        &self,
        collection: &str,
        filter: Document,
        many: bool,
    ) -> Result<ExecutionResult> {
        debug!(
            "Executing {} on collection '{}' with filter: {:?}",
            if many { "deleteMany" } else { "deleteOne" },
            collection,
            filter
        );

        let coll = self.context.get_collection(collection);
        let result = if many {
            coll.delete_many(filter).await?
        } else {
            coll.delete_one(filter).await?
        };

        Ok(ExecutionResult::from_data(ResultData::Delete {
            deleted: result.deleted_count,
        }))
    }
}
