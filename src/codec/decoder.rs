//! Extended JSON to BSON conversion

use mongodb::bson::{Bson, DateTime, Document, oid::ObjectId};
use serde_json::{Map, Number, Value as JsonValue};

use super::helpers::{binary_from_base64, parse_date_string};

/// Decode a JSON tree into BSON, resolving sentinel wrappers
///
/// Total over valid JSON: a wrapper whose payload cannot be parsed (for
/// example `{"$oid": "xyz"}`) is kept as a plain sub-document.
pub fn decode(value: &JsonValue) -> Bson {
    match value {
        JsonValue::Null => Bson::Null,
        JsonValue::Bool(b) => Bson::Boolean(*b),
        JsonValue::Number(n) => decode_number(n),
        JsonValue::String(s) => Bson::String(s.clone()),
        JsonValue::Array(items) => Bson::Array(items.iter().map(decode).collect()),
        JsonValue::Object(map) => decode_wrapper(map).unwrap_or_else(|| Bson::Document(decode_map(map))),
    }
}

/// Decode a JSON object into a BSON document
///
/// # Returns
/// `None` when `value` is not an object, or is a wrapper that decodes to a
/// non-document value
pub fn decode_document(value: &JsonValue) -> Option<Document> {
    match decode(value) {
        Bson::Document(doc) => Some(doc),
        _ => None,
    }
}

fn decode_map(map: &Map<String, JsonValue>) -> Document {
    map.iter().map(|(k, v)| (k.clone(), decode(v))).collect()
}

fn decode_number(n: &Number) -> Bson {
    if let Some(i) = n.as_i64() {
        return match i32::try_from(i) {
            Ok(small) => Bson::Int32(small),
            Err(_) => Bson::Int64(i),
        };
    }
    Bson::Double(n.as_f64().unwrap_or(f64::NAN))
}

/// Resolve a sentinel wrapper, or `None` if `map` is not a valid one.
fn decode_wrapper(map: &Map<String, JsonValue>) -> Option<Bson> {
    let mut entries = map.iter();
    let (key, payload) = entries.next()?;

    if map.len() == 2 && key == "$binary" {
        // Legacy form: {"$binary": "<base64>", "$type": "<hex>"}
        let subtype = map.get("$type")?.as_str()?;
        return binary_from_base64(payload.as_str()?, subtype).map(Bson::Binary);
    }
    if map.len() != 1 {
        return None;
    }

    match key.as_str() {
        "$oid" => ObjectId::parse_str(payload.as_str()?).ok().map(Bson::ObjectId),
        "$date" => decode_date(payload).map(Bson::DateTime),
        "$numberLong" => decode_long(payload).map(Bson::Int64),
        "$numberDecimal" => {
            let mut wrapper = Map::new();
            wrapper.insert(key.clone(), JsonValue::String(payload.as_str()?.to_string()));
            match Bson::try_from(JsonValue::Object(wrapper)) {
                Ok(decimal @ Bson::Decimal128(_)) => Some(decimal),
                _ => None,
            }
        }
        "$binary" => {
            let body = payload.as_object()?;
            let base64 = body.get("base64")?.as_str()?;
            let subtype = body.get("subType")?.as_str()?;
            binary_from_base64(base64, subtype).map(Bson::Binary)
        }
        _ => None,
    }
}

fn decode_date(payload: &JsonValue) -> Option<DateTime> {
    match payload {
        JsonValue::String(s) => parse_date_string(s),
        JsonValue::Number(n) => n.as_i64().map(DateTime::from_millis),
        JsonValue::Object(body) if body.len() == 1 => {
            decode_long(body.get("$numberLong")?).map(DateTime::from_millis)
        }
        _ => None,
    }
}

fn decode_long(payload: &JsonValue) -> Option<i64> {
    match payload {
        JsonValue::String(s) => s.trim().parse().ok(),
        JsonValue::Number(n) => n.as_i64(),
        _ => None,
    }
}
