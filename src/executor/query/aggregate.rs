//! Aggregate operations for query executor

use futures::stream::TryStreamExt;
use mongodb::bson::Document;
use tracing::info;

use crate::error::Result;

use super::super::result::{ExecutionResult, ResultData};

/// Aggregate operations implementation
impl super::QueryExecutor {
    /// Execute an aggregation pipeline and drain the cursor
    pub(super) async fn execute_aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> Result<ExecutionResult> {
        info!(
            "Executing aggregate on collection '{}' with {} pipeline stages",
            collection,
            pipeline.len()
        );

        let cursor = self
            .context
            .get_collection(collection)
            .aggregate(pipeline)
            .await?;
        let documents: Vec<Document> = cursor.try_collect().await?;

        Ok(ExecutionResult::from_data(ResultData::Documents(documents)))
    }
}
