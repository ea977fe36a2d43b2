//! Read operations for query executor
//!
//! This module contains all read operations including:
//! - find, findOne
//! - countDocuments
//! - distinct

use futures::stream::TryStreamExt;
use mongodb::bson::Document;
use mongodb::options::{FindOneOptions, FindOptions};
use tracing::debug;

use crate::error::Result;

use super::super::result::{ExecutionResult, ResultData};

/// Read operations implementation
impl super::QueryExecutor {
    /// Execute find command
    ///
    /// The cursor is drained completely; no default batch limit applies.
    ///
    /// # Arguments
    /// * `collection` - Collection name
    /// * `filter` - Query filter
    /// * `projection` - Optional projection
    /// * `sort` - Optional sort specification
    /// * `limit` - Optional limit
    /// * `skip` - Optional skip
    ///
    /// # Returns
    /// * `Result<ExecutionResult>` - Matching documents
    pub(super) async fn execute_find(
        &self,
        collection: &str,
        filter: Document,
        projection: Option<Document>,
        sort: Option<Document>,
        limit: Option<i64>,
        skip: Option<u64>,
    ) -> Result<ExecutionResult> {
        debug!(
            "Executing find on collection '{}' with filter: {:?}",
            collection, filter
        );

        let coll = self.context.get_collection(collection);

        let mut find_options = FindOptions::default();
        find_options.projection = projection;
        find_options.sort = sort;
        find_options.limit = limit;
        find_options.skip = skip;

        let cursor = coll.find(filter).with_options(find_options).await?;
        let documents: Vec<Document> = cursor.try_collect().await?;

        debug!("find returned {} documents", documents.len());
        Ok(ExecutionResult::from_data(ResultData::Documents(documents)))
    }

    /// Execute findOne command
    ///
    /// # Returns
    /// * `Result<ExecutionResult>` - The first match, or `null` data when none matches
    pub(super) async fn execute_find_one(
        &self,
        collection: &str,
        filter: Document,
        projection: Option<Document>,
    ) -> Result<ExecutionResult> {
        debug!(
            "Executing findOne on collection '{}' with filter: {:?}",
            collection, filter
        );

        let coll = self.context.get_collection(collection);

        let mut options = FindOneOptions::default();
        options.projection = projection;

        let data = match coll.find_one(filter).with_options(options).await? {
            Some(document) => ResultData::Document(document),
            None => ResultData::None,
        };
        Ok(ExecutionResult::from_data(data))
    }

    /// Execute countDocuments command
    pub(super) async fn execute_count(
        &self,
        collection: &str,
        filter: Document,
    ) -> Result<ExecutionResult> {
        debug!(
            "Executing countDocuments on collection '{}' with filter: {:?}",
            collection, filter
        );

        let count = self
            .context
            .get_collection(collection)
            .count_documents(filter)
            .await?;
        Ok(ExecutionResult::from_data(ResultData::Count(count)))
    }

    /// Execute distinct command
    ///
    /// # Arguments
    /// * `collection` - Collection name
    /// * `field` - Field whose distinct values are returned
    /// * `filter` - Query filter
    pub(super) async fn execute_distinct(
        &self,
        collection: &str,
        field: &str,
        filter: Document,
    ) -> Result<ExecutionResult> {
        debug!(
            "Executing distinct '{}' on collection '{}' with filter: {:?}",
            field, collection, filter
        );

        let values = self
            .context
            .get_collection(collection)
            .distinct(field, filter)
            .await?;
        Ok(ExecutionResult::from_data(ResultData::Values(values)))
    }
}
