use std::{fmt, io};

use crate::error::mongo::format_mongodb_error;

/// Crate-wide `Result` type using [`MongoConsoleError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, MongoConsoleError>;

/// Top-level error type for the console core.
///
/// Only infrastructure faults travel through this type. Command-level
/// failures (bad JSON, server-side command errors) are returned to callers
/// as data inside an `ExecutionResult`.
#[derive(Debug)]
pub enum MongoConsoleError {
    /// Connection-related errors.
    Connection(ConnectionError),

    /// Command parsing errors.
    Parse(ParseError),

    /// Command execution errors.
    Execution(ExecutionError),

    /// Configuration errors, including missing connection records.
    Config(ConfigError),

    /// I/O errors.
    Io(io::Error),

    /// MongoDB driver errors.
    MongoDb(mongodb::error::Error),

    /// Generic error with a free-form message.
    Generic(String),
}

/// Connection-specific errors.
///
/// Messages carried here are always sanitized: they never contain the raw
/// connection URI or credentials.
#[derive(Debug)]
pub enum ConnectionError {
    /// Failed to establish a connection (network, DNS, TLS, ...).
    ConnectionFailed(String),

    /// The server rejected the supplied credentials.
    AuthenticationFailed(String),

    /// Connection or server selection timed out.
    Timeout,

    /// Invalid connection URI.
    InvalidUri(String),
}

/// Parsing-specific errors.
#[derive(Debug)]
pub enum ParseError {
    /// Argument text is not valid JSON.
    InvalidJson { kind: String, message: String },

    /// Invalid argument for a recognized command.
    InvalidArgument(String),
}

/// Execution-specific errors.
#[derive(Debug)]
pub enum ExecutionError {
    /// Query execution failed.
    QueryFailed(String),

    /// Invalid operation parameters.
    InvalidParameters(String),
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// No connection record exists for the requested id.
    NotFound(String),

    /// Config or store file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Missing required field.
    MissingField(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },
}

impl MongoConsoleError {
    /// True when the error means the connection record does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, MongoConsoleError::Config(ConfigError::NotFound(_)))
    }

    /// True when the error came from establishing a connection.
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, MongoConsoleError::Connection(_))
    }
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for MongoConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MongoConsoleError::Connection(e) => write!(f, "Connection error: {e}"),
            MongoConsoleError::Parse(e) => write!(f, "{e}"),
            MongoConsoleError::Execution(e) => write!(f, "Execution error: {e}"),
            MongoConsoleError::Config(e) => write!(f, "Configuration error: {e}"),
            MongoConsoleError::Io(e) => write!(f, "I/O error: {e}"),
            MongoConsoleError::MongoDb(e) => format_mongodb_error(f, e),
            MongoConsoleError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::ConnectionFailed(msg) => write!(f, "Failed to connect: {msg}"),
            ConnectionError::AuthenticationFailed(msg) => {
                write!(f, "Authentication failed: {msg}")
            }
            ConnectionError::Timeout => write!(f, "Connection timeout"),
            ConnectionError::InvalidUri(msg) => write!(f, "Invalid connection URI: {msg}"),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidJson { kind, message } => {
                write!(f, "Invalid {kind} JSON: {message}")
            }
            ParseError::InvalidArgument(msg) => write!(f, "Invalid argument: {msg}"),
        }
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionError::QueryFailed(msg) => write!(f, "Query failed: {msg}"),
            ExecutionError::InvalidParameters(msg) => write!(f, "Invalid parameters: {msg}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NotFound(id) => write!(f, "Connection not found: {id}"),
            ConfigError::FileNotFound(path) => write!(f, "File not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::MissingField(field) => write!(f, "Missing required field: {field}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
        }
    }
}

impl std::error::Error for MongoConsoleError {}
impl std::error::Error for ConnectionError {}
impl std::error::Error for ParseError {}
impl std::error::Error for ExecutionError {}
impl std::error::Error for ConfigError {}

/* ========================= Conversions to MongoConsoleError ========================= */

impl From<io::Error> for MongoConsoleError {
    fn from(err: io::Error) -> Self {
        MongoConsoleError::Io(err)
    }
}

impl From<mongodb::error::Error> for MongoConsoleError {
    fn from(err: mongodb::error::Error) -> Self {
        MongoConsoleError::MongoDb(err)
    }
}

impl From<ConnectionError> for MongoConsoleError {
    fn from(err: ConnectionError) -> Self {
        MongoConsoleError::Connection(err)
    }
}

impl From<ParseError> for MongoConsoleError {
    fn from(err: ParseError) -> Self {
        MongoConsoleError::Parse(err)
    }
}

impl From<ExecutionError> for MongoConsoleError {
    fn from(err: ExecutionError) -> Self {
        MongoConsoleError::Execution(err)
    }
}

impl From<ConfigError> for MongoConsoleError {
    fn from(err: ConfigError) -> Self {
        MongoConsoleError::Config(err)
    }
}

impl From<String> for MongoConsoleError {
    fn from(msg: String) -> Self {
        MongoConsoleError::Generic(msg)
    }
}

impl From<&str> for MongoConsoleError {
    fn from(msg: &str) -> Self {
        MongoConsoleError::Generic(msg.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err: MongoConsoleError = ConfigError::NotFound("abc".to_string()).into();
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "Configuration error: Connection not found: abc"
        );
    }

    #[test]
    fn test_invalid_json_display() {
        let err = ParseError::InvalidJson {
            kind: "filter".to_string(),
            message: "expected value at line 1 column 2".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid filter JSON: expected value at line 1 column 2"
        );
    }

    #[test]
    fn test_connection_failure_classification() {
        let err: MongoConsoleError = ConnectionError::Timeout.into();
        assert!(err.is_connection_failure());
        assert!(!err.is_not_found());
    }
}
