//! BSON to extended JSON conversion
//!
//! Values with no native JSON counterpart are written as sentinel wrappers
//! (`$oid`, `$date`, `$numberLong`, `$numberDecimal`, `$binary`) so a client
//! can send them back unchanged.

use mongodb::bson::{Binary, Bson, DateTime, Decimal128, Document, oid::ObjectId};
use serde_json::{Map, Value as JsonValue, json};

use super::helpers::{binary_subtype_to_u8, binary_to_base64, datetime_to_iso_string};

/// Trait for JSON conversion
pub trait BsonJsonConverter {
    fn convert_object_id(&self, oid: &ObjectId) -> JsonValue;
    fn convert_datetime(&self, dt: &DateTime) -> JsonValue;
    fn convert_int64(&self, n: i64) -> JsonValue;
    fn convert_decimal128(&self, d: &Decimal128) -> JsonValue;
    fn convert_binary(&self, bin: &Binary) -> JsonValue;

    /// Convert BSON array to JSON array
    fn convert_array(&self, arr: &[Bson]) -> JsonValue {
        JsonValue::Array(arr.iter().map(|v| self.convert_to_json(v)).collect())
    }

    /// Convert BSON document to JSON object, keeping field order
    fn convert_document_to_json(&self, doc: &Document) -> JsonValue {
        let map: Map<String, JsonValue> = doc
            .iter()
            .map(|(k, v)| (k.clone(), self.convert_to_json(v)))
            .collect();
        JsonValue::Object(map)
    }

    /// Convert BSON value to JSON (provided implementation)
    fn convert_to_json(&self, value: &Bson) -> JsonValue {
        match value {
            Bson::String(s) => JsonValue::String(s.clone()),
            Bson::Int32(n) => JsonValue::Number((*n).into()),
            Bson::Boolean(b) => JsonValue::Bool(*b),
            Bson::Null => JsonValue::Null,
            Bson::Int64(n) => self.convert_int64(*n),
            Bson::ObjectId(oid) => self.convert_object_id(oid),
            Bson::DateTime(dt) => self.convert_datetime(dt),
            Bson::Decimal128(d) => self.convert_decimal128(d),
            Bson::Binary(bin) => self.convert_binary(bin),
            Bson::Array(arr) => self.convert_array(arr),
            Bson::Document(doc) => self.convert_document_to_json(doc),
            other => other.clone().into_relaxed_extjson(),
        }
    }
}

/// Encoder producing the console's extended JSON dialect
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtendedJsonEncoder;

impl BsonJsonConverter for ExtendedJsonEncoder {
    fn convert_object_id(&self, oid: &ObjectId) -> JsonValue {
        json!({ "$oid": oid.to_hex() })
    }

    fn convert_datetime(&self, dt: &DateTime) -> JsonValue {
        match datetime_to_iso_string(dt) {
            Some(iso) => json!({ "$date": iso }),
            None => json!({ "$date": { "$numberLong": dt.timestamp_millis().to_string() } }),
        }
    }

    fn convert_int64(&self, n: i64) -> JsonValue {
        json!({ "$numberLong": n.to_string() })
    }

    fn convert_decimal128(&self, d: &Decimal128) -> JsonValue {
        json!({ "$numberDecimal": d.to_string() })
    }

    fn convert_binary(&self, bin: &Binary) -> JsonValue {
        json!({
            "$binary": {
                "base64": binary_to_base64(bin),
                "subType": format!("{:02x}", binary_subtype_to_u8(bin.subtype)),
            }
        })
    }
}
