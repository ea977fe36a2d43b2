//! Command execution engine
//!
//! This module turns parsed console commands into MongoDB operations:
//! - `plan`: decodes JSON arguments into typed operations before any I/O
//! - `query`: executor for collection data operations
//! - `admin`: executor for database, index and server commands
//! - `router`: dispatches operations and folds server errors into results
//! - `interpreter`: the per-invocation entry point tying it together
//! - `result`: result types and their JSON rendering

mod admin;
mod context;
mod interpreter;
mod plan;
mod query;
mod result;
mod router;

pub use context::ExecutionContext;
pub use interpreter::CommandInterpreter;
pub use plan::{Operation, Plan, UpdateSpec, plan};
pub use result::{ExecutionResult, ExecutionStats, ResultData};
pub use router::CommandRouter;
