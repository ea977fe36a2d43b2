//! Command parser for the console
//!
//! Recognizes a fixed, ordered list of shell-style forms. This is not a
//! JavaScript parser: anything outside the list is reported as an unknown
//! command, never evaluated.
//!
//! # Architecture
//!
//! - `command`: Command type definitions ([`ParsedCommand`] and friends)
//! - `db_operation`: Parser for `db.` call syntax
//! - `shell_commands`: Parser for `show` and `use`
//! - `scanner`: Bracket- and string-aware argument scanning
//!
//! # Examples
//!
//! ```
//! use mongo_console::parser::{CollectionMethod, ParsedCommand, Parser};
//!
//! let parser = Parser::new();
//!
//! match parser.parse(r#"db.users.find({"age": {"$gt": 18}}).limit(5)"#) {
//!     ParsedCommand::NamedMethodCall(call) => {
//!         assert_eq!(call.collection, "users");
//!         assert_eq!(call.method, CollectionMethod::Find);
//!     }
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

mod command;
mod db_operation;
mod scanner;
mod shell_commands;

// Re-export public API
pub use command::*;
pub use scanner::unquote;
pub use shell_commands::ShellCommandParser;

use db_operation::DbOperationParser;
use tracing::debug;

/// Forms listed back to the user when a command is not recognized
pub const SUPPORTED_COMMANDS: &[&str] = &[
    "show dbs | show databases",
    "show collections",
    "use <database>",
    "db.getCollectionNames()",
    "db.stats()",
    "db.createCollection('name')",
    "db.dropDatabase()",
    "db.<collection>.find([filter[, projection]])[.limit(n)][.skip(n)][.sort(spec)]",
    "db.<collection>.findOne([filter[, projection]])",
    "db.<collection>.countDocuments([filter]) | .count([filter])",
    "db.<collection>.distinct('field'[, filter])",
    "db.<collection>.insertOne(doc)",
    "db.<collection>.insert(doc | [docs])",
    "db.<collection>.insertMany([docs])",
    "db.<collection>.updateOne(filter, update)",
    "db.<collection>.updateMany(filter, update)",
    "db.<collection>.deleteOne(filter)",
    "db.<collection>.deleteMany(filter) | .remove(filter)",
    "db.<collection>.aggregate([pipeline])",
    "db.<collection>.createIndex(keys[, options])",
    "db.<collection>.dropIndex('name')",
    "db.<collection>.getIndexes()",
    "db.<collection>.stats()",
    "db.<collection>.drop()",
    "{ <raw database command> }",
];

/// Parser for console commands
///
/// Stateless; one instance can be shared across tasks.
#[derive(Debug, Clone, Copy, Default)]
pub struct Parser;

impl Parser {
    /// Create a new parser instance
    pub fn new() -> Self {
        Self
    }

    /// Parse an input string into a [`ParsedCommand`]
    ///
    /// Forms are tried in order and the first match wins:
    /// 1. introspection (`show dbs`, `show collections`, `db.getCollectionNames()`, `db.stats()`)
    /// 2. collection reads and writes (`db.<coll>.<method>(...)`)
    /// 3. database scope (`use <name>`, `db.createCollection(...)`, `db.dropDatabase()`)
    /// 4. raw command documents (input starting with `{`)
    ///
    /// # Arguments
    ///
    /// * `input` - The input string to parse
    ///
    /// # Returns
    ///
    /// * `ParsedCommand` - Never fails; unrecognized input is `ParsedCommand::Unknown`
    pub fn parse(&self, input: &str) -> ParsedCommand {
        let trimmed = input.trim().trim_end_matches(';').trim_end();

        let parsed = ShellCommandParser::parse_show(trimmed)
            .map(ParsedCommand::ShellDirective)
            .or_else(|| DbOperationParser::parse_introspection(trimmed))
            .or_else(|| DbOperationParser::parse_collection_call(trimmed))
            .or_else(|| ShellCommandParser::parse_use(trimmed).map(ParsedCommand::ShellDirective))
            .or_else(|| DbOperationParser::parse_database_call(trimmed))
            .or_else(|| {
                trimmed
                    .starts_with('{')
                    .then(|| ParsedCommand::RawCommandDocument(trimmed.to_string()))
            })
            .unwrap_or_else(|| ParsedCommand::Unknown(trimmed.to_string()));

        debug!("Parsed command: {:?}", parsed);
        parsed
    }
}
