//! Command interpreter
//!
//! Entry point for running one line of console input against a pooled
//! connection. Each call is independent: the caller supplies the connection
//! id and database every time and keeps any "current database" state itself.

use std::sync::Arc;

use tracing::{debug, info};

use crate::connection::ConnectionPool;
use crate::error::Result;
use crate::parser::Parser;

use super::context::ExecutionContext;
use super::plan::{Plan, plan};
use super::result::ExecutionResult;
use super::router::CommandRouter;

/// Parses console input and executes it through the connection pool
#[derive(Clone)]
pub struct CommandInterpreter {
    /// Pool the clients are borrowed from
    pool: Arc<ConnectionPool>,

    /// Stateless command parser
    parser: Parser,
}

impl CommandInterpreter {
    /// Create a new interpreter over a connection pool
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self {
            pool,
            parser: Parser::new(),
        }
    }

    /// Pool used by this interpreter
    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }

    /// Interpret one line of input and execute it
    ///
    /// Arguments are decoded before a client is requested, so malformed JSON
    /// and unknown commands never open a connection. `use <name>` is answered
    /// without contacting the server.
    ///
    /// # Arguments
    /// * `connection_id` - Id of the stored connection record
    /// * `database` - Database the command runs against
    /// * `input` - Raw console input
    ///
    /// # Returns
    /// * `Ok(ExecutionResult)` - Success or a command-level failure as data
    /// * `Err` - The connection record is missing or the connection failed
    pub async fn interpret_and_execute(
        &self,
        connection_id: &str,
        database: &str,
        input: &str,
    ) -> Result<ExecutionResult> {
        let command = self.parser.parse(input);

        let operation = match plan(command) {
            Plan::Respond(result) => return Ok(result),
            Plan::Execute(operation) => operation,
        };

        let client = self.pool.get_client(connection_id).await?;
        info!(
            "Executing on connection '{}' database '{}'",
            connection_id, database
        );

        let router = CommandRouter::new(ExecutionContext::new(client, database));
        let result = router.route(operation).await?;

        debug!(
            "Result: success={}, returned={}, elapsed={}ms",
            result.success, result.stats.documents_returned, result.stats.execution_time_ms
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;
    use crate::store::MemoryConnectionStore;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    fn interpreter() -> CommandInterpreter {
        let store = Arc::new(MemoryConnectionStore::new(Vec::new()));
        CommandInterpreter::new(Arc::new(ConnectionPool::new(store, PoolConfig::default())))
    }

    #[tokio::test]
    async fn test_use_answers_without_connection() {
        let result = assert_ok!(
            interpreter()
                .interpret_and_execute("missing", "test", "use analytics")
                .await
        );
        assert_eq!(
            result.to_json(),
            json!({ "message": "switched to db analytics", "database": "analytics" })
        );
    }

    #[tokio::test]
    async fn test_invalid_json_is_data() {
        let result = interpreter()
            .interpret_and_execute("missing", "test", "db.users.find({name: 'x'})")
            .await
            .unwrap();
        assert!(!result.success);
        let message = result.error.unwrap();
        assert!(message.starts_with("Invalid filter JSON: "), "{message}");
    }

    #[tokio::test]
    async fn test_unknown_command_lists_supported_forms() {
        let result = interpreter()
            .interpret_and_execute("missing", "test", "db.users.mapReduce()")
            .await
            .unwrap();
        let body = result.to_json();
        assert_eq!(body["error"], "Unknown command: db.users.mapReduce()");
        assert!(body["supportedCommands"].as_array().is_some_and(|c| !c.is_empty()));
    }

    #[tokio::test]
    async fn test_missing_connection_propagates() {
        let interpreter = interpreter();
        let err = assert_err!(
            interpreter
                .interpret_and_execute("missing", "test", "db.users.find({})")
                .await
        );
        assert!(err.is_not_found());
        assert!(interpreter.pool().is_empty());
    }
}
