//! Extended JSON codec shared by the pool and the interpreter
//!
//! Plain JSON cannot carry ObjectIds, dates, 64-bit integers, decimals or
//! binary data. Both directions use sentinel wrappers for those:
//!
//! | BSON       | JSON                                              |
//! |------------|---------------------------------------------------|
//! | ObjectId   | `{"$oid": "<24 hex>"}`                            |
//! | DateTime   | `{"$date": "<ISO 8601>"}`                         |
//! | Int64      | `{"$numberLong": "<digits>"}`                     |
//! | Decimal128 | `{"$numberDecimal": "<decimal>"}`                 |
//! | Binary     | `{"$binary": {"base64": "...", "subType": "00"}}` |
//!
//! Encoding a decoded value preserves the value, not the text: dates come
//! back with millisecond precision (`.000Z`) and a numeric `$numberLong`
//! comes back as a string.

mod converter;
mod decoder;
mod helpers;

pub use converter::{BsonJsonConverter, ExtendedJsonEncoder};
pub use decoder::{decode, decode_document};
pub use helpers::{datetime_to_iso_string, parse_date_string};

use mongodb::bson::{Bson, Document};
use serde_json::Value as JsonValue;

/// Encode a BSON value as extended JSON
pub fn encode(value: &Bson) -> JsonValue {
    ExtendedJsonEncoder.convert_to_json(value)
}

/// Encode a BSON document as an extended JSON object
pub fn encode_document(doc: &Document) -> JsonValue {
    ExtendedJsonEncoder.convert_document_to_json(doc)
}

/// Encode a list of documents as a JSON array
pub fn encode_documents(docs: &[Document]) -> JsonValue {
    JsonValue::Array(docs.iter().map(encode_document).collect())
}
