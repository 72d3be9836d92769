use serde::{Deserialize, Deserializer, Serialize};

/// Insertion-ordered set of record identifiers.
///
/// Relationship lists hold identifiers, never records, which is what lets one
/// record sit under several parents without being copied. Order carries no
/// meaning but is kept stable so snapshots and listings are reproducible.
///
/// Set semantics:
/// - `insert` is a union: inserting a present identifier changes nothing.
/// - `remove` of an absent identifier changes nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct IdSet {
    ids: Vec<String>,
}

impl IdSet {
    /// Create an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self { ids: Vec::new() }
    }

    /// Insert an identifier. Returns `true` if it was not already present.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.contains(&id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    /// Remove an identifier. Returns `true` if it was present.
    pub fn remove(&mut self, id: &str) -> bool {
        match self.ids.iter().position(|existing| existing == id) {
            Some(pos) => {
                self.ids.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Returns true if the set contains `id`.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|existing| existing == id)
    }

    /// Union another set into this one.
    pub fn merge(&mut self, other: &Self) {
        for id in &other.ids {
            self.insert(id.clone());
        }
    }

    /// Remove every identifier.
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Move the contents out, leaving this set empty.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Owned copy of the identifiers, for iterating while mutating the store.
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        self.ids.clone()
    }
}

impl<S: Into<String>> FromIterator<S> for IdSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<S: Into<String>> Extend<S> for IdSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for id in iter {
            self.insert(id);
        }
    }
}

// Lists read from snapshots or caller drafts may repeat identifiers.
impl<'de> Deserialize<'de> for IdSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let ids = Vec::<String>::deserialize(deserializer)?;
        Ok(ids.into_iter().collect())
    }
}
