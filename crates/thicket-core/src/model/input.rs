//! Boundary types: what callers pass to the store and what `resolve` hands
//! back.
//!
//! - [`AddInput`]: a bare name, a [`Draft`], or a batch of either.
//! - [`Target`]: the root, an identifier, or a batch of targets.
//! - [`Resolved`]: stored records, shaped like the [`Target`] that asked
//!   for them.

use super::record::{Draft, Record};
use crate::uid::ROOT_UID;

/// Input accepted by `Hierarchy::add`.
#[derive(Debug, Clone, PartialEq)]
pub enum AddInput {
    /// A bare name, wrapped into a minimal record.
    Name(String),
    /// A partial record.
    Draft(Draft),
    /// Several inputs, processed in order.
    Batch(Vec<AddInput>),
}

impl AddInput {
    /// Flatten nested batches into drafts, in order.
    pub(crate) fn into_drafts(self) -> Vec<Draft> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into(self, out: &mut Vec<Draft>) {
        match self {
            Self::Name(name) => out.push(Draft::named(name)),
            Self::Draft(draft) => out.push(draft),
            Self::Batch(items) => {
                for item in items {
                    item.flatten_into(out);
                }
            }
        }
    }
}

impl From<&str> for AddInput {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for AddInput {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<Draft> for AddInput {
    fn from(draft: Draft) -> Self {
        Self::Draft(draft)
    }
}

impl<T: Into<Self>> From<Vec<T>> for AddInput {
    fn from(items: Vec<T>) -> Self {
        Self::Batch(items.into_iter().map(Into::into).collect())
    }
}

/// A reference to stored records, accepted by `remove` and `resolve`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Root,
    Uid(String),
    Batch(Vec<Target>),
}

impl Target {
    /// Build a target from an identifier, mapping the sentinel to [`Target::Root`].
    #[must_use]
    pub fn uid(uid: impl Into<String>) -> Self {
        let uid = uid.into();
        if uid == ROOT_UID {
            Self::Root
        } else {
            Self::Uid(uid)
        }
    }

    /// The identifiers named by this target, batches flattened, in order.
    #[must_use]
    pub fn uids(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_uids(&mut out);
        out
    }

    fn collect_uids<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Root => out.push(ROOT_UID),
            Self::Uid(uid) => out.push(uid),
            Self::Batch(items) => {
                for item in items {
                    item.collect_uids(out);
                }
            }
        }
    }
}

impl From<&str> for Target {
    fn from(uid: &str) -> Self {
        Self::uid(uid)
    }
}

impl From<String> for Target {
    fn from(uid: String) -> Self {
        Self::uid(uid)
    }
}

impl From<&String> for Target {
    fn from(uid: &String) -> Self {
        Self::uid(uid.as_str())
    }
}

impl From<&Record> for Target {
    fn from(record: &Record) -> Self {
        Self::uid(record.uid())
    }
}

impl<T: Into<Self>> From<Vec<T>> for Target {
    fn from(items: Vec<T>) -> Self {
        Self::Batch(items.into_iter().map(Into::into).collect())
    }
}

/// Result of `Hierarchy::resolve`.
///
/// A scalar target yields [`Resolved::One`], empty when nothing matched. A
/// batch yields [`Resolved::Many`] with unmatched identifiers dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved<'a> {
    One(Option<&'a Record>),
    Many(Vec<&'a Record>),
}

impl<'a> Resolved<'a> {
    /// The single record, if this is a scalar result that matched.
    #[must_use]
    pub const fn one(&self) -> Option<&'a Record> {
        match self {
            Self::One(record) => *record,
            Self::Many(_) => None,
        }
    }

    /// All matched records, regardless of shape.
    #[must_use]
    pub fn into_vec(self) -> Vec<&'a Record> {
        match self {
            Self::One(record) => record.into_iter().collect(),
            Self::Many(records) => records,
        }
    }

    #[must_use]
    pub const fn is_many(&self) -> bool {
        matches!(self, Self::Many(_))
    }

    /// Returns true when nothing matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::One(record) => record.is_none(),
            Self::Many(records) => records.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_batches_flatten_in_order() {
        let input = AddInput::Batch(vec![
            AddInput::from("a"),
            AddInput::from(vec!["b", "c"]),
            AddInput::from(Draft::named("d")),
        ]);
        let names: Vec<_> = input
            .into_drafts()
            .into_iter()
            .map(|d| d.name.unwrap_or_default())
            .collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn sentinel_string_becomes_root_target() {
        assert_eq!(Target::from("root"), Target::Root);
        assert_eq!(Target::from("rooted"), Target::Uid("rooted".into()));
    }

    #[test]
    fn target_uids_flatten() {
        let target = Target::from(vec!["a", "root", "b"]);
        assert_eq!(target.uids(), vec!["a", "root", "b"]);
    }
}
