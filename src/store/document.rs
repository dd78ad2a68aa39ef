use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use super::errors::StoreError;

// ============================================================================
// Documents - the unit of storage
// ============================================================================
//
// A document is a JSON object addressed by collection + id and carrying a
// version that the store bumps on every write. Transactions remember the
// version they observed for every key they read; a commit whose observed
// versions no longer match is a conflict.
//
// ============================================================================

pub mod collections {
    pub const ORDERS: &str = "orders";
    pub const DELIVERIES: &str = "deliveries";
    pub const COUNTERS: &str = "counters";
}

/// Top-level fields of a document.
pub type Fields = Map<String, Value>;

/// Observed version per key; 0 means the document did not exist.
pub type ReadSet = BTreeMap<DocumentKey, u64>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentKey {
    pub collection: String,
    pub id: String,
}

impl DocumentKey {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }

    pub fn order(id: &str) -> Self {
        Self::new(collections::ORDERS, id)
    }

    pub fn delivery(id: &str) -> Self {
        Self::new(collections::DELIVERIES, id)
    }

    pub fn order_counter() -> Self {
        Self::new(collections::COUNTERS, "orders")
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VersionedDocument {
    pub version: u64,
    pub data: Fields,
}

impl VersionedDocument {
    pub fn decode<D: DeserializeOwned>(&self) -> Result<D, StoreError> {
        Ok(serde_json::from_value(Value::Object(self.data.clone()))?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Replace the document, or merge top-level fields into it when `merge` is set
    Set { fields: Fields, merge: bool },
    /// Overwrite top-level fields of an existing document
    Update { fields: Fields },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Write {
    pub key: DocumentKey,
    pub op: WriteOp,
}

/// Serializes a record or patch into document fields.
pub fn encode<D: Serialize>(doc: &D) -> Result<Fields, StoreError> {
    match serde_json::to_value(doc)? {
        Value::Object(fields) => Ok(fields),
        _ => Err(StoreError::NotAnObject),
    }
}

/// Computes the document that results from applying `op` on top of `current`.
pub fn apply_write(
    key: &DocumentKey,
    current: Option<&VersionedDocument>,
    op: &WriteOp,
) -> Result<VersionedDocument, StoreError> {
    let version = current.map_or(0, |doc| doc.version) + 1;

    let data = match (op, current) {
        (WriteOp::Set { fields, merge: false }, _) | (WriteOp::Set { fields, merge: true }, None) => {
            fields.clone()
        }
        (WriteOp::Set { fields, merge: true }, Some(doc))
        | (WriteOp::Update { fields }, Some(doc)) => {
            let mut data = doc.data.clone();
            data.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
            data
        }
        (WriteOp::Update { .. }, None) => return Err(StoreError::DocumentMissing(key.clone())),
    };

    Ok(VersionedDocument { version, data })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_key_display() {
        assert_eq!(DocumentKey::order_counter().to_string(), "counters/orders");
        assert_eq!(DocumentKey::order("abc").to_string(), "orders/abc");
    }

    #[test]
    fn test_set_without_merge_replaces() {
        let key = DocumentKey::order("o1");
        let current = VersionedDocument {
            version: 3,
            data: fields(json!({"a": 1, "b": 2})),
        };

        let next = apply_write(
            &key,
            Some(&current),
            &WriteOp::Set { fields: fields(json!({"a": 5})), merge: false },
        )
        .unwrap();

        assert_eq!(next.version, 4);
        assert_eq!(Value::Object(next.data), json!({"a": 5}));
    }

    #[test]
    fn test_set_with_merge_keeps_other_fields() {
        let key = DocumentKey::order_counter();
        let current = VersionedDocument {
            version: 1,
            data: fields(json!({"current": 7, "label": "orders"})),
        };

        let next = apply_write(
            &key,
            Some(&current),
            &WriteOp::Set { fields: fields(json!({"current": 8})), merge: true },
        )
        .unwrap();

        assert_eq!(Value::Object(next.data), json!({"current": 8, "label": "orders"}));
    }

    #[test]
    fn test_update_on_missing_document_fails() {
        let key = DocumentKey::delivery("d1");
        let result = apply_write(
            &key,
            None,
            &WriteOp::Update { fields: fields(json!({"status": "busy"})) },
        );

        assert!(matches!(result, Err(StoreError::DocumentMissing(k)) if k == key));
    }

    #[test]
    fn test_encode_rejects_non_objects() {
        assert!(matches!(encode(&42), Err(StoreError::NotAnObject)));
        assert!(encode(&json!({"x": 1})).is_ok());
    }
}
