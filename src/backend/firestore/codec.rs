//! Conversion between alerts and Firestore REST documents
//!
//! Firestore's JSON form wraps every value in a single-key object naming its
//! type, e.g. `{"integerValue": "42"}`. Integers travel as decimal strings.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

use crate::alerts::{Alert, ID_FIELD};
use crate::backend::BackendError;

/// A Firestore document as returned by the REST API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name, `projects/{p}/databases/{d}/documents/{collection}/{id}`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub fields: BTreeMap<String, FirestoreValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

impl Document {
    /// Document id: the last segment of the resource name
    pub fn id(&self) -> Option<&str> {
        self.name.rsplit('/').next().filter(|id| !id.is_empty())
    }
}

/// A typed Firestore value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FirestoreValue {
    NullValue(()),
    BooleanValue(bool),
    IntegerValue(String),
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(LatLng),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<FirestoreValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, FirestoreValue>,
}

/// Encode a JSON value as a Firestore value
pub fn encode_value(value: &Value) -> FirestoreValue {
    match value {
        Value::Null => FirestoreValue::NullValue(()),
        Value::Bool(b) => FirestoreValue::BooleanValue(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => FirestoreValue::IntegerValue(i.to_string()),
            // u64 above i64::MAX and floats both land here
            None => FirestoreValue::DoubleValue(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => FirestoreValue::StringValue(s.clone()),
        Value::Array(items) => FirestoreValue::ArrayValue(ArrayValue {
            values: items.iter().map(encode_value).collect(),
        }),
        Value::Object(map) => FirestoreValue::MapValue(MapValue {
            fields: encode_fields(map),
        }),
    }
}

/// Decode a Firestore value into JSON
pub fn decode_value(value: FirestoreValue) -> Result<Value, BackendError> {
    let json = match value {
        FirestoreValue::NullValue(()) => Value::Null,
        FirestoreValue::BooleanValue(b) => Value::Bool(b),
        FirestoreValue::IntegerValue(s) => {
            let i: i64 = s
                .parse()
                .map_err(|_| BackendError::Decode(format!("invalid integerValue '{}'", s)))?;
            Value::from(i)
        }
        // NaN and infinities have no JSON form
        FirestoreValue::DoubleValue(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        FirestoreValue::TimestampValue(s)
        | FirestoreValue::StringValue(s)
        | FirestoreValue::BytesValue(s)
        | FirestoreValue::ReferenceValue(s) => Value::String(s),
        FirestoreValue::GeoPointValue(point) => serde_json::json!({
            "latitude": point.latitude,
            "longitude": point.longitude,
        }),
        FirestoreValue::ArrayValue(array) => Value::Array(
            array
                .values
                .into_iter()
                .map(decode_value)
                .collect::<Result<_, _>>()?,
        ),
        FirestoreValue::MapValue(map) => Value::Object(decode_fields(map.fields)?),
    };
    Ok(json)
}

fn encode_fields(map: &Map<String, Value>) -> BTreeMap<String, FirestoreValue> {
    map.iter()
        .map(|(k, v)| (k.clone(), encode_value(v)))
        .collect()
}

fn decode_fields(
    fields: BTreeMap<String, FirestoreValue>,
) -> Result<Map<String, Value>, BackendError> {
    fields
        .into_iter()
        .map(|(k, v)| Ok((k, decode_value(v)?)))
        .collect()
}

/// Build the document body for an alert. The id is not a field; it goes in
/// the document name.
pub fn alert_to_document(alert: &Alert) -> Document {
    Document {
        fields: alert
            .fields
            .iter()
            .filter(|(k, _)| k.as_str() != ID_FIELD)
            .map(|(k, v)| (k.clone(), encode_value(v)))
            .collect(),
        ..Default::default()
    }
}

pub fn document_to_alert(document: Document) -> Result<Alert, BackendError> {
    let id = document
        .id()
        .ok_or_else(|| BackendError::Decode("document without a name".to_string()))?
        .to_string();

    // A stored `id` field would shadow the document id in the JSON form
    let mut fields = document.fields;
    if fields.remove(ID_FIELD).is_some() {
        tracing::debug!(alert_id = %id, "Dropped stored id field from document");
    }

    Ok(Alert {
        id: Some(id),
        fields: decode_fields(fields)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_scalars() {
        let encoded = serde_json::to_value(encode_value(&json!(null))).unwrap();
        assert_eq!(encoded, json!({"nullValue": null}));

        let encoded = serde_json::to_value(encode_value(&json!(true))).unwrap();
        assert_eq!(encoded, json!({"booleanValue": true}));

        let encoded = serde_json::to_value(encode_value(&json!(42))).unwrap();
        assert_eq!(encoded, json!({"integerValue": "42"}));

        let encoded = serde_json::to_value(encode_value(&json!(1.5))).unwrap();
        assert_eq!(encoded, json!({"doubleValue": 1.5}));

        let encoded = serde_json::to_value(encode_value(&json!("low stock"))).unwrap();
        assert_eq!(encoded, json!({"stringValue": "low stock"}));
    }

    #[test]
    fn test_encode_nested() {
        let encoded = serde_json::to_value(encode_value(&json!({
            "tags": ["a", 1],
            "empty": [],
            "where": {"aisle": 3}
        })))
        .unwrap();

        assert_eq!(
            encoded,
            json!({"mapValue": {"fields": {
                "empty": {"arrayValue": {}},
                "tags": {"arrayValue": {"values": [
                    {"stringValue": "a"},
                    {"integerValue": "1"}
                ]}},
                "where": {"mapValue": {"fields": {"aisle": {"integerValue": "3"}}}}
            }}})
        );
    }

    #[test]
    fn test_decode_extra_kinds() {
        let value: FirestoreValue =
            serde_json::from_value(json!({"timestampValue": "2020-05-01T12:00:00Z"})).unwrap();
        assert_eq!(decode_value(value).unwrap(), json!("2020-05-01T12:00:00Z"));

        let value: FirestoreValue = serde_json::from_value(
            json!({"geoPointValue": {"latitude": 37.4, "longitude": -122.1}}),
        )
        .unwrap();
        assert_eq!(
            decode_value(value).unwrap(),
            json!({"latitude": 37.4, "longitude": -122.1})
        );

        let value: FirestoreValue = serde_json::from_value(
            json!({"referenceValue": "projects/p/databases/(default)/documents/items/sku-1"}),
        )
        .unwrap();
        assert_eq!(
            decode_value(value).unwrap(),
            json!("projects/p/databases/(default)/documents/items/sku-1")
        );

        // Empty arrays and maps come back without their inner member
        let value: FirestoreValue = serde_json::from_value(json!({"arrayValue": {}})).unwrap();
        assert_eq!(decode_value(value).unwrap(), json!([]));
        let value: FirestoreValue = serde_json::from_value(json!({"mapValue": {}})).unwrap();
        assert_eq!(decode_value(value).unwrap(), json!({}));
    }

    #[test]
    fn test_decode_bad_integer() {
        let err = decode_value(FirestoreValue::IntegerValue("forty".to_string())).unwrap_err();
        assert!(matches!(err, BackendError::Decode(_)));
    }

    #[test]
    fn test_document_to_alert() {
        let document: Document = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/alerts/abc123",
            "fields": {
                "item_id": {"stringValue": "sku-1"},
                "threshold": {"integerValue": "5"}
            },
            "createTime": "2020-05-01T12:00:00.000000Z",
            "updateTime": "2020-05-01T12:00:00.000000Z"
        }))
        .unwrap();

        let alert = document_to_alert(document).unwrap();
        assert_eq!(alert.id(), Some("abc123"));
        assert_eq!(alert.field("item_id"), Some(&json!("sku-1")));
        assert_eq!(alert.field("threshold"), Some(&json!(5)));
    }

    #[test]
    fn test_stored_id_field_does_not_shadow_document_id() {
        let document: Document = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/alerts/doc1",
            "fields": {
                "id": {"stringValue": "legacy"},
                "item_id": {"stringValue": "x"}
            }
        }))
        .unwrap();

        let alert = document_to_alert(document).unwrap();
        assert_eq!(alert.id(), Some("doc1"));
        assert_eq!(alert.field("id"), None);

        let serialized = serde_json::to_string(&alert).unwrap();
        assert_eq!(serialized.matches("\"id\"").count(), 1);
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&serialized).unwrap(),
            json!({"id": "doc1", "item_id": "x"})
        );
    }

    #[test]
    fn test_alert_to_document_skips_id_field() {
        let mut alert = Alert::new().with_field("item_id", "sku-1");
        alert.fields.insert("id".to_string(), json!("stray"));

        let body = serde_json::to_value(alert_to_document(&alert)).unwrap();
        assert_eq!(body, json!({"fields": {"item_id": {"stringValue": "sku-1"}}}));
    }

    #[test]
    fn test_document_without_name() {
        let err = document_to_alert(Document::default()).unwrap_err();
        assert!(matches!(err, BackendError::Decode(_)));
    }

    #[test]
    fn test_alert_to_document_drops_id() {
        let alert = Alert::new().with_id("abc").with_field("item_id", "sku-1");
        let body = serde_json::to_value(alert_to_document(&alert)).unwrap();
        assert_eq!(
            body,
            json!({"fields": {"item_id": {"stringValue": "sku-1"}}})
        );
    }
}
