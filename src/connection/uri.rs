//! Connection URI construction and sanitization

use crate::error::Result;
use crate::store::ConnectionRecord;

/// Default MongoDB port
pub const DEFAULT_PORT: u16 = 27017;

/// Everything needed to open a client for one saved connection.
///
/// The URI doubles as the fingerprint of the record: when a record is
/// edited so that its URI changes, a client built from the old URI is stale.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    /// Connection id the target was built for
    pub connection_id: String,

    /// Full connection URI, including credentials
    pub uri: String,

    /// Strings that must never appear in logs or error messages
    secrets: Vec<String>,
}

impl ConnectionTarget {
    /// Build the target for a connection record
    pub fn from_record(record: &ConnectionRecord) -> Result<Self> {
        record.validate()?;
        let uri = build_connection_uri(record);

        let mut secrets = vec![uri.clone()];
        if let Some(password) = record.password.as_deref().filter(|p| !p.is_empty()) {
            secrets.push(password.to_string());
            secrets.push(urlencoding::encode(password).into_owned());
        }
        if let Some(password) = extract_uri_password(&uri) {
            secrets.push(password);
        }

        Ok(Self {
            connection_id: record.id.clone(),
            uri,
            secrets,
        })
    }

    /// Secrets to scrub from driver messages
    pub fn secrets(&self) -> Vec<&str> {
        self.secrets.iter().map(String::as_str).collect()
    }

    /// URI with credentials hidden, safe for display
    pub fn sanitized_uri(&self) -> String {
        sanitize_uri(&self.uri)
    }
}

impl std::fmt::Debug for ConnectionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionTarget")
            .field("connection_id", &self.connection_id)
            .field("uri", &self.sanitized_uri())
            .finish()
    }
}

/// Build the connection URI for a record
///
/// An explicit `uri` is used verbatim. Otherwise the URI is assembled as
/// `mongodb://[user:pass@]host:port[/?authSource=db]` with credentials
/// percent-encoded, followed by the record's extra options.
///
/// # Examples
/// ```
/// use mongo_console::connection::build_connection_uri;
/// use mongo_console::store::ConnectionRecord;
///
/// let record = ConnectionRecord::with_host("local", "localhost", 27017);
/// assert_eq!(build_connection_uri(&record), "mongodb://localhost:27017");
/// ```
pub fn build_connection_uri(record: &ConnectionRecord) -> String {
    if let Some(uri) = record.uri.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        return uri.to_string();
    }

    let mut uri = String::from("mongodb://");

    let username = record.username.as_deref().filter(|u| !u.is_empty());
    if let Some(username) = username {
        uri.push_str(&urlencoding::encode(username));
        if let Some(password) = record.password.as_deref().filter(|p| !p.is_empty()) {
            uri.push(':');
            uri.push_str(&urlencoding::encode(password));
        }
        uri.push('@');
    }

    uri.push_str(record.host.as_deref().unwrap_or("localhost").trim());
    uri.push(':');
    uri.push_str(&record.port.unwrap_or(DEFAULT_PORT).to_string());

    let mut params: Vec<String> = Vec::new();
    if username.is_some() {
        if let Some(auth_db) = record.auth_database.as_deref().filter(|d| !d.is_empty()) {
            params.push(format!("authSource={}", urlencoding::encode(auth_db)));
        }
    }
    for (key, value) in &record.options {
        params.push(format!(
            "{}={}",
            urlencoding::encode(key),
            urlencoding::encode(value)
        ));
    }

    if !params.is_empty() {
        uri.push_str("/?");
        uri.push_str(&params.join("&"));
    }

    uri
}

/// Sanitize URI by hiding credentials
///
/// Everything between the scheme and the last `@` of the authority is
/// replaced by `***`.
pub fn sanitize_uri(uri: &str) -> String {
    let Some(proto_end) = uri.find("://") else {
        return if uri.contains('@') {
            "***".to_string()
        } else {
            uri.to_string()
        };
    };

    let rest = &uri[proto_end + 3..];
    let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
    match rest[..authority_end].rfind('@') {
        Some(at) => format!("{}***{}", &uri[..proto_end + 3], &rest[at..]),
        None => uri.to_string(),
    }
}

/// Password embedded in a URI authority, both raw and decoded.
fn extract_uri_password(uri: &str) -> Option<String> {
    let rest = &uri[uri.find("://")? + 3..];
    let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
    let userinfo = &rest[..rest[..authority_end].rfind('@')?];
    let (_, password) = userinfo.split_once(':')?;
    (!password.is_empty()).then(|| password.to_string())
}
