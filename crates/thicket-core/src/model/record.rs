//! Stored records and the partial drafts callers hand to `add`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::id_set::IdSet;
use crate::error::{Result, StoreError};
use crate::uid::ROOT_UID;

/// Keys of the fixed record schema. Payload fields share the same JSON
/// object, so they may not use these names.
pub const RESERVED_FIELDS: [&str; 4] = ["name", "uid", "children", "parents"];

#[must_use]
pub fn is_reserved_field(key: &str) -> bool {
    RESERVED_FIELDS.contains(&key)
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// A record held by the store.
///
/// `name` and the payload fields belong to the caller and may be edited
/// through [`Hierarchy::get_mut`](crate::store::Hierarchy::get_mut). The
/// identifier and both relationship lists are owned by the store: the
/// identifier never changes once assigned, and the lists only change through
/// the store's linking operations so that both sides of every link agree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    uid: String,
    #[serde(default)]
    children: IdSet,
    #[serde(default)]
    parents: IdSet,
    /// Caller-defined payload, opaque to the store. Never holds a
    /// [`RESERVED_FIELDS`] key.
    #[serde(flatten)]
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub(crate) fn new(
        name: String,
        uid: String,
        children: IdSet,
        parents: IdSet,
        fields: BTreeMap<String, Value>,
    ) -> Self {
        Self {
            name,
            uid,
            children,
            parents,
            fields,
        }
    }

    /// The synthetic root record.
    pub(crate) fn root() -> Self {
        Self::new(
            ROOT_UID.to_string(),
            ROOT_UID.to_string(),
            IdSet::new(),
            IdSet::new(),
            BTreeMap::new(),
        )
    }

    #[must_use]
    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Identifiers of this record's children.
    #[must_use]
    pub const fn children(&self) -> &IdSet {
        &self.children
    }

    /// Identifiers of this record's parents. May include the root sentinel.
    #[must_use]
    pub const fn parents(&self) -> &IdSet {
        &self.parents
    }

    /// Returns true if this is the synthetic root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.uid == ROOT_UID
    }

    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    #[must_use]
    pub const fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    /// Set a payload field, returning the previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ReservedField`] if `key` is one of
    /// [`RESERVED_FIELDS`]; the record is left unchanged.
    pub fn set_field(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Option<Value>> {
        let key = key.into();
        if is_reserved_field(&key) {
            return Err(StoreError::ReservedField(key));
        }
        Ok(self.fields.insert(key, value.into()))
    }

    pub fn remove_field(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    pub(crate) const fn children_mut(&mut self) -> &mut IdSet {
        &mut self.children
    }

    pub(crate) const fn parents_mut(&mut self) -> &mut IdSet {
        &mut self.parents
    }
}

// ---------------------------------------------------------------------------
// Draft
// ---------------------------------------------------------------------------

/// A partial record accepted by `add`.
///
/// Only `name` is required, and that is checked by the store rather than
/// the type so that drafts parsed from JSON report a proper validation
/// error. A `uid` is a request, not a guarantee: it is replaced when it is
/// already taken or equals the root sentinel. Relationship lists, when
/// present, are kept as-is and assumed to be consistent with the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<IdSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parents: Option<IdSet>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl Draft {
    /// A draft carrying only a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_children<S: Into<String>>(mut self, ids: impl IntoIterator<Item = S>) -> Self {
        self.children = Some(ids.into_iter().collect());
        self
    }

    #[must_use]
    pub fn with_parents<S: Into<String>>(mut self, ids: impl IntoIterator<Item = S>) -> Self {
        self.parents = Some(ids.into_iter().collect());
        self
    }

    /// Values of the named payload fields, in the order given.
    ///
    /// Missing and `null` fields are skipped. Strings are used verbatim,
    /// any other JSON value by its compact JSON text.
    #[must_use]
    pub fn disambiguation_values(&self, keys: &[String]) -> Vec<String> {
        keys.iter()
            .filter_map(|key| match self.fields.get(key) {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(other) => Some(other.to_string()),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_serializes_payload_flat() {
        let mut record = Record::new(
            "log".into(),
            "log".into(),
            IdSet::new(),
            ["root"].into_iter().collect(),
            BTreeMap::new(),
        );
        record.set_field("type", "function").expect("free key");

        let value = serde_json::to_value(&record).expect("serialize");
        assert_eq!(
            value,
            json!({
                "name": "log",
                "uid": "log",
                "children": [],
                "parents": ["root"],
                "type": "function",
            })
        );
    }

    #[test]
    fn record_round_trips_through_json() {
        let json = json!({
            "name": "a",
            "uid": "a",
            "children": ["b"],
            "parents": ["root"],
            "size": 3,
        });
        let record: Record = serde_json::from_value(json).expect("deserialize");
        assert_eq!(record.uid(), "a");
        assert!(record.children().contains("b"));
        assert_eq!(record.field("size"), Some(&json!(3)));
    }

    #[test]
    fn set_field_refuses_schema_keys() {
        let mut record = Record::root();
        for key in RESERVED_FIELDS {
            let err = record.set_field(key, "x").expect_err("reserved");
            assert!(matches!(err, StoreError::ReservedField(ref k) if k == key));
        }
        assert!(record.fields().is_empty());
        assert_eq!(record.name, ROOT_UID);
    }

    #[test]
    fn root_record_is_root() {
        let root = Record::root();
        assert!(root.is_root());
        assert_eq!(root.uid(), ROOT_UID);
    }

    #[test]
    fn draft_parses_without_relationship_lists() {
        let draft: Draft = serde_json::from_value(json!({"name": "x", "kind": "dir"}))
            .expect("deserialize");
        assert_eq!(draft.name.as_deref(), Some("x"));
        assert!(draft.children.is_none());
        assert!(draft.parents.is_none());
        assert_eq!(draft.fields.get("kind"), Some(&json!("dir")));
    }

    #[test]
    fn disambiguation_values_skip_missing_and_null() {
        let draft = Draft::named("log")
            .with_field("type", "function")
            .with_field("arity", 2)
            .with_field("owner", Value::Null);
        let keys = vec![
            "type".to_string(),
            "missing".to_string(),
            "owner".to_string(),
            "arity".to_string(),
        ];
        assert_eq!(draft.disambiguation_values(&keys), vec!["function", "2"]);
    }
}
