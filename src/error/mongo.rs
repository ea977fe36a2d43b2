use std::fmt;

use mongodb::bson::{Bson, Document};
use serde::{Deserialize, Serialize};

use super::kinds::ConnectionError;

/// Server error codes that mean the credentials were rejected.
///
/// 18 is `AuthenticationFailed`, 13 is `Unauthorized` and 8000 is the code
/// Atlas uses for its own authentication failures.
pub const AUTH_ERROR_CODES: [i32; 3] = [18, 13, 8000];

/// Structured error information extracted from MongoDB errors.
///
/// This is intended to be serialized to JSON and consumed by other
/// components (e.g. logging, APIs).
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub(crate) error_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) details: Option<ErrorDetails>,
}

/// Additional error details extracted from MongoDB error details document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) collection: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) index: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) key: Option<Document>,
}

impl ErrorInfo {
    /// Human-readable message suitable for returning to the console user.
    pub fn display_message(&self) -> String {
        match (&self.name, &self.message) {
            (Some(name), Some(msg)) => format!("{name}: {msg}"),
            (None, Some(msg)) => msg.clone(),
            (Some(name), None) => name.clone(),
            (None, None) => "Unknown MongoDB error".to_string(),
        }
    }
}

/// Format MongoDB error messages as JSON wrapped in an `error` field.
///
/// Used by the parent module's `Display` implementation for
/// `MongoConsoleError::MongoDb`.
pub fn format_mongodb_error(
    f: &mut fmt::Formatter<'_>,
    error: &mongodb::error::Error,
) -> fmt::Result {
    let info = extract_error_info(error);
    let wrapper = serde_json::json!({ "error": info });
    let json_output = serde_json::to_string(&wrapper).map_err(|_| fmt::Error)?;
    write!(f, "{json_output}")
}

/// Extract structured information from a MongoDB error using the driver API.
///
/// This avoids string parsing where possible by using the driver's typed error
/// structures directly.
pub fn extract_error_info(error: &mongodb::error::Error) -> ErrorInfo {
    use mongodb::error::{ErrorKind, WriteFailure};

    let mut info = ErrorInfo::default();

    match error.kind.as_ref() {
        ErrorKind::Write(write_failure) => {
            info.error_type = Some("mongo.write_error".to_string());

            match write_failure {
                WriteFailure::WriteError(write_error) => {
                    info.code = Some(write_error.code);
                    info.message = Some(write_error.message.clone());
                    info.name = get_error_name(write_error.code);
                    info.details = Some(extract_from_details_and_message(
                        &write_error.details,
                        &write_error.message,
                    ));
                }
                WriteFailure::WriteConcernError(wc_error) => {
                    info.code = Some(wc_error.code);
                    info.message = Some(wc_error.message.clone());
                    info.name = get_error_name(wc_error.code);
                }
                _ => {}
            }
        }
        ErrorKind::Command(command_error) => {
            info.error_type = Some("mongo.command_error".to_string());
            info.code = Some(command_error.code);
            info.message = Some(command_error.message.clone());
            info.name = get_error_name(command_error.code)
                .or_else(|| Some(command_error.code_name.clone()).filter(|n| !n.is_empty()));
        }
        ErrorKind::InsertMany(insert_error) => {
            info.error_type = Some("mongo.insert_many_error".to_string());

            if let Some(first_error) = insert_error.write_errors.as_ref().and_then(|e| e.first())
            {
                info.code = Some(first_error.code);
                info.message = Some(first_error.message.clone());
                info.name = get_error_name(first_error.code);
                info.details = Some(extract_from_details_and_message(
                    &first_error.details,
                    &first_error.message,
                ));
            } else if let Some(wc_error) = &insert_error.write_concern_error {
                info.code = Some(wc_error.code);
                info.message = Some(wc_error.message.clone());
                info.name = get_error_name(wc_error.code);
            }
        }
        ErrorKind::Authentication { message, .. } => {
            info.error_type = Some("mongo.authentication_error".to_string());
            info.message = Some(message.clone());
        }
        ErrorKind::InvalidArgument { message, .. } => {
            info.error_type = Some("mongo.invalid_argument".to_string());
            info.message = Some(message.clone());
        }
        ErrorKind::ServerSelection { message, .. } => {
            info.error_type = Some("mongo.server_selection_error".to_string());
            info.message = Some(message.clone());
        }
        ErrorKind::DnsResolve { message, .. } => {
            info.error_type = Some("mongo.dns_error".to_string());
            info.message = Some(message.clone());
        }
        ErrorKind::Io(io_error) => {
            info.error_type = Some("mongo.io_error".to_string());
            info.message = Some(io_error.to_string());
        }
        _ => {
            info.message = Some(error.to_string());
        }
    }

    if let Some(code) = info.code {
        if code == 11000 || code == 11001 {
            info.message = Some("Duplicate key error".to_string());
        }
    }

    info
}

/// Whether a driver error means the server rejected the credentials.
pub fn is_authentication_failure(error: &mongodb::error::Error) -> bool {
    use mongodb::error::ErrorKind;

    match error.kind.as_ref() {
        ErrorKind::Authentication { .. } => true,
        ErrorKind::Command(command_error) => is_auth_code(command_error.code),
        _ => false,
    }
}

/// Whether a server error code is one of the authentication failure codes.
pub fn is_auth_code(code: i32) -> bool {
    AUTH_ERROR_CODES.contains(&code)
}

/// Whether a driver error is a timeout rather than a refused connection.
pub fn is_timeout(error: &mongodb::error::Error) -> bool {
    use mongodb::error::ErrorKind;

    match error.kind.as_ref() {
        ErrorKind::Io(io_error) => io_error.kind() == std::io::ErrorKind::TimedOut,
        _ => false,
    }
}

/// Classify a failure to establish a connection.
///
/// Every secret (raw URI, password) is scrubbed from the driver message
/// before it is stored, so the result is safe to log and to return to
/// callers.
pub fn classify_connect_error(error: &mongodb::error::Error, secrets: &[&str]) -> ConnectionError {
    if is_timeout(error) {
        return ConnectionError::Timeout;
    }

    let message = scrub_secrets(&extract_error_info(error).display_message(), secrets);

    if is_authentication_failure(error) {
        ConnectionError::AuthenticationFailed(message)
    } else {
        ConnectionError::ConnectionFailed(message)
    }
}

/// Replace every non-empty secret in `message` with `***`.
pub fn scrub_secrets(message: &str, secrets: &[&str]) -> String {
    secrets
        .iter()
        .filter(|s| !s.is_empty())
        .fold(message.to_string(), |acc, secret| acc.replace(secret, "***"))
}

/// Get a human-readable error name from a MongoDB error code.
fn get_error_name(code: i32) -> Option<String> {
    let name = match code {
        11000 | 11001 => "DuplicateKey",
        13 => "Unauthorized",
        18 => "AuthenticationFailed",
        26 => "NamespaceNotFound",
        27 => "IndexNotFound",
        48 => "NamespaceExists",
        50 => "MaxTimeMSExpired",
        59 => "CommandNotFound",
        85 => "IndexOptionsConflict",
        86 => "IndexKeySpecsConflict",
        121 => "DocumentValidationFailure",
        _ => return None,
    };

    Some(name.to_string())
}

/// Extract error details from an optional BSON document and a message string.
///
/// The BSON document is preferred; if it does not contain the necessary
/// information, a best-effort extraction from the message string is attempted.
fn extract_from_details_and_message(
    error_details: &Option<Document>,
    message: &str,
) -> ErrorDetails {
    let mut details = ErrorDetails {
        collection: None,
        index: None,
        key: None,
    };

    if let Some(doc) = error_details {
        if let Some(Bson::String(ns)) = doc.get("namespace").or_else(|| doc.get("ns")) {
            details.collection = Some(ns.clone());
        }

        if let Some(Bson::String(idx)) = doc.get("index").or_else(|| doc.get("indexName")) {
            details.index = Some(idx.clone());
        }

        if let Some(Bson::Document(key_doc)) =
            doc.get("keyPattern").or_else(|| doc.get("keyValue"))
        {
            details.key = Some(key_doc.clone());
        }
    }

    if details.collection.is_none() {
        details.collection = word_after(message, "collection: ");
    }

    if details.index.is_none() {
        details.index = word_after(message, "index: ");
    }

    details
}

/// The whitespace-delimited word following `marker` in `message`.
fn word_after(message: &str, marker: &str) -> Option<String> {
    let start = message.find(marker)? + marker.len();
    let rest = &message[start..];
    let end = rest.find(' ')?;
    Some(rest[..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn test_auth_codes() {
        assert!(is_auth_code(18));
        assert!(is_auth_code(13));
        assert!(is_auth_code(8000));
        assert!(!is_auth_code(11000));
        assert!(!is_auth_code(6));
    }

    #[test]
    fn test_scrub_secrets() {
        let msg = "failed to connect to mongodb://bob:hunter2@db:27017 (hunter2)";
        let scrubbed = scrub_secrets(msg, &["mongodb://bob:hunter2@db:27017", "hunter2"]);
        assert_eq!(scrubbed, "failed to connect to *** (***)");
    }

    #[test]
    fn test_scrub_ignores_empty_secret() {
        assert_eq!(scrub_secrets("plain", &[""]), "plain");
    }

    #[test]
    fn test_error_name_lookup() {
        assert_eq!(get_error_name(11000).as_deref(), Some("DuplicateKey"));
        assert_eq!(get_error_name(27).as_deref(), Some("IndexNotFound"));
        assert_eq!(get_error_name(424242), None);
    }

    #[test]
    fn test_details_from_document() {
        let details = extract_from_details_and_message(
            &Some(doc! { "ns": "app.users", "indexName": "email_1", "keyValue": { "email": "a" } }),
            "",
        );
        assert_eq!(details.collection.as_deref(), Some("app.users"));
        assert_eq!(details.index.as_deref(), Some("email_1"));
        assert_eq!(details.key, Some(doc! { "email": "a" }));
    }

    #[test]
    fn test_details_from_message_fallback() {
        let details = extract_from_details_and_message(
            &None,
            "E11000 duplicate key error collection: app.users index: email_1 dup key",
        );
        assert_eq!(details.collection.as_deref(), Some("app.users"));
        assert_eq!(details.index.as_deref(), Some("email_1"));
    }

    #[test]
    fn test_display_message() {
        let info = ErrorInfo {
            name: Some("NamespaceNotFound".to_string()),
            message: Some("ns not found".to_string()),
            ..Default::default()
        };
        assert_eq!(info.display_message(), "NamespaceNotFound: ns not found");
        assert_eq!(ErrorInfo::default().display_message(), "Unknown MongoDB error");
    }
}
