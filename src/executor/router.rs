//! Command router for dispatching operations to executors
//!
//! This module provides the CommandRouter which dispatches planned
//! operations to the appropriate executor:
//! - Collection data operations → QueryExecutor
//! - Database, index and server operations → AdminExecutor
//!
//! Failures raised by the server while a command runs are folded into the
//! returned [`ExecutionResult`]; only infrastructure faults leave as `Err`.

use std::time::Instant;
use tracing::{debug, warn};

use crate::error::mongo::extract_error_info;
use crate::error::{MongoConsoleError, Result};

use super::admin::AdminExecutor;
use super::context::ExecutionContext;
use super::plan::Operation;
use super::query::QueryExecutor;
use super::result::ExecutionResult;

/// Command router that dispatches operations to appropriate executors
pub struct CommandRouter {
    /// Execution context
    context: ExecutionContext,
}

impl CommandRouter {
    /// Create a new command router
    ///
    /// # Arguments
    /// * `context` - Execution context
    pub fn new(context: ExecutionContext) -> Self {
        Self { context }
    }

    /// Route an operation to the appropriate executor
    ///
    /// # Arguments
    /// * `op` - Operation with decoded arguments
    ///
    /// # Returns
    /// * `Result<ExecutionResult>` - Execution result; command errors are data
    pub async fn route(&self, op: Operation) -> Result<ExecutionResult> {
        debug!("Routing operation: {:?}", op);

        let start = Instant::now();

        let result = if QueryExecutor::handles(&op) {
            QueryExecutor::new(self.context.clone()).execute(op).await
        } else {
            AdminExecutor::new(self.context.clone()).execute(op).await
        };

        let elapsed = start.elapsed().as_millis() as u64;
        debug!("Command executed in {}ms", elapsed);

        let mut result = into_data_error(result)?;
        result.stats.execution_time_ms = elapsed;
        Ok(result)
    }
}

/// Fold command-level failures into a failed result
fn into_data_error(result: Result<ExecutionResult>) -> Result<ExecutionResult> {
    match result {
        Ok(result) => Ok(result),
        Err(MongoConsoleError::MongoDb(e)) => {
            let info = extract_error_info(&e);
            warn!("Command failed on server: {}", info.display_message());
            Ok(ExecutionResult::error(info.display_message()))
        }
        Err(e @ (MongoConsoleError::Execution(_) | MongoConsoleError::Parse(_))) => {
            Ok(ExecutionResult::error(e.to_string()))
        }
        Err(e) => Err(e),
    }
}
