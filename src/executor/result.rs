//! Execution result types
//!
//! This module defines the data structures for representing command execution results:
//! - ExecutionResult: Overall result of a command execution
//! - ResultData: Various types of data that can be returned
//! - ExecutionStats: Statistics about the execution
//!
//! [`ExecutionResult::to_json`] renders results in the shapes a Node.js
//! driver user would expect, with BSON values in extended JSON.

use mongodb::bson::{Bson, Document};
use serde_json::{Map, Value as JsonValue, json};

use crate::codec::{encode, encode_document, encode_documents};

/// Result of command execution
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    /// Success status
    pub success: bool,

    /// Result data (documents, stats, etc.)
    pub data: ResultData,

    /// Execution statistics
    pub stats: ExecutionStats,

    /// Error message if failed
    pub error: Option<String>,
}

/// Data returned from command execution
#[derive(Debug, Clone, PartialEq)]
pub enum ResultData {
    /// List of documents
    Documents(Vec<Document>),

    /// Single document
    Document(Document),

    /// Insert one result
    InsertOne { inserted_id: Bson },

    /// Insert many result, ids in insertion order
    InsertMany { inserted_ids: Vec<Bson> },

    /// Update result
    Update {
        matched: u64,
        modified: u64,
        upserted_id: Option<Bson>,
    },

    /// Delete result
    Delete { deleted: u64 },

    /// Count result
    Count(u64),

    /// Distinct values
    Values(Vec<Bson>),

    /// List of names
    List(Vec<String>),

    /// Plain string, such as a created index name
    Text(String),

    /// Pre-rendered JSON
    Json(JsonValue),

    /// No data
    None,
}

/// Execution statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionStats {
    /// Execution time in milliseconds
    pub execution_time_ms: u64,

    /// Number of documents returned
    pub documents_returned: usize,

    /// Number of documents affected
    pub documents_affected: Option<u64>,
}

impl ExecutionResult {
    /// Create a successful result
    pub fn success(data: ResultData, stats: ExecutionStats) -> Self {
        Self {
            success: true,
            data,
            stats,
            error: None,
        }
    }

    /// Create a successful result, deriving statistics from the data
    pub fn from_data(data: ResultData) -> Self {
        let stats = ExecutionStats {
            execution_time_ms: 0,
            documents_returned: data.documents_returned(),
            documents_affected: data.documents_affected(),
        };
        Self::success(data, stats)
    }

    /// Create a failed result
    pub fn error(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: ResultData::None,
            stats: ExecutionStats::default(),
            error: Some(error.into()),
        }
    }

    /// Create a failed result carrying extra fields next to `error`
    pub fn error_with(error: impl Into<String>, extra: JsonValue) -> Self {
        Self {
            data: ResultData::Json(extra),
            ..Self::error(error)
        }
    }

    /// Render the result as JSON
    ///
    /// Failures become `{"error": message, ...extra}`.
    pub fn to_json(&self) -> JsonValue {
        let Some(error) = &self.error else {
            return self.data.to_json();
        };

        let mut body = Map::new();
        body.insert("error".to_string(), JsonValue::String(error.clone()));
        if let ResultData::Json(JsonValue::Object(extra)) = &self.data {
            for (key, value) in extra {
                body.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
        JsonValue::Object(body)
    }
}

impl ResultData {
    /// Render the data in its Node.js driver shape
    pub fn to_json(&self) -> JsonValue {
        match self {
            ResultData::Documents(docs) => encode_documents(docs),
            ResultData::Document(doc) => encode_document(doc),
            ResultData::InsertOne { inserted_id } => json!({
                "acknowledged": true,
                "insertedId": encode(inserted_id),
            }),
            ResultData::InsertMany { inserted_ids } => {
                let ids: Map<String, JsonValue> = inserted_ids
                    .iter()
                    .enumerate()
                    .map(|(i, id)| (i.to_string(), encode(id)))
                    .collect();
                json!({
                    "acknowledged": true,
                    "insertedCount": inserted_ids.len(),
                    "insertedIds": ids,
                })
            }
            ResultData::Update {
                matched,
                modified,
                upserted_id,
            } => json!({
                "acknowledged": true,
                "matchedCount": matched,
                "modifiedCount": modified,
                "upsertedId": upserted_id.as_ref().map(encode),
            }),
            ResultData::Delete { deleted } => json!({
                "acknowledged": true,
                "deletedCount": deleted,
            }),
            ResultData::Count(n) => json!(n),
            ResultData::Values(values) => JsonValue::Array(values.iter().map(encode).collect()),
            ResultData::List(items) => json!(items),
            ResultData::Text(text) => JsonValue::String(text.clone()),
            ResultData::Json(value) => value.clone(),
            ResultData::None => JsonValue::Null,
        }
    }

    fn documents_returned(&self) -> usize {
        match self {
            ResultData::Documents(docs) => docs.len(),
            ResultData::Document(_) => 1,
            ResultData::Values(values) => values.len(),
            ResultData::List(items) => items.len(),
            _ => 0,
        }
    }

    fn documents_affected(&self) -> Option<u64> {
        match self {
            ResultData::InsertOne { .. } => Some(1),
            ResultData::InsertMany { inserted_ids } => Some(inserted_ids.len() as u64),
            ResultData::Update { modified, .. } => Some(*modified),
            ResultData::Delete { deleted } => Some(*deleted),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{doc, oid::ObjectId};

    #[test]
    fn test_insert_many_shape() {
        let a = ObjectId::parse_str("65a4f1c2e4b0a1b2c3d4e5f6").unwrap();
        let data = ResultData::InsertMany {
            inserted_ids: vec![Bson::ObjectId(a), Bson::Int32(7)],
        };
        assert_eq!(
            data.to_json(),
            json!({
                "acknowledged": true,
                "insertedCount": 2,
                "insertedIds": { "0": { "$oid": "65a4f1c2e4b0a1b2c3d4e5f6" }, "1": 7 },
            })
        );
    }

    #[test]
    fn test_update_shape() {
        let data = ResultData::Update {
            matched: 3,
            modified: 2,
            upserted_id: None,
        };
        assert_eq!(
            data.to_json(),
            json!({ "acknowledged": true, "matchedCount": 3, "modifiedCount": 2, "upsertedId": null })
        );
    }

    #[test]
    fn test_find_one_without_match_is_null() {
        assert_eq!(ExecutionResult::from_data(ResultData::None).to_json(), JsonValue::Null);
    }

    #[test]
    fn test_documents_and_stats() {
        let result = ExecutionResult::from_data(ResultData::Documents(vec![
            doc! { "n": 1 },
            doc! { "n": 2_i64 },
        ]));
        assert!(result.success);
        assert_eq!(result.stats.documents_returned, 2);
        assert_eq!(
            result.to_json(),
            json!([{ "n": 1 }, { "n": { "$numberLong": "2" } }])
        );
    }

    #[test]
    fn test_error_shape() {
        let result = ExecutionResult::error("Invalid filter JSON: expected value");
        assert!(!result.success);
        assert_eq!(
            result.to_json(),
            json!({ "error": "Invalid filter JSON: expected value" })
        );
    }

    #[test]
    fn test_error_with_extra_fields() {
        let result = ExecutionResult::error_with(
            "Unknown command",
            json!({ "supportedCommands": ["show dbs"], "error": "ignored" }),
        );
        assert_eq!(
            result.to_json(),
            json!({ "error": "Unknown command", "supportedCommands": ["show dbs"] })
        );
    }
}
