//! The hierarchy store: an identifier index plus a synthetic root.
//!
//! [`Hierarchy`] owns every record. Records reference each other only by
//! identifier, through two lists per record (`children` and `parents`), so a
//! record may sit under several parents without being copied.
//!
//! # Invariants
//!
//! After every public call returns:
//!
//! - Every parent listed by a record is the root or an indexed record, and
//!   lists that record among its children.
//! - Every child listed by a record is indexed and lists that record among
//!   its parents.
//! - Index keys equal record identifiers and never equal the root sentinel.
//! - Identifiers never change once assigned.
//!
//! [`Hierarchy::check`] verifies the relationship invariants and reports
//! each breach as a [`Violation`].
//!
//! # Failure model
//!
//! Only `add` can fail, and only on validation. A failing item inside a
//! batch stops the batch; earlier items stay committed (no rollback).
//! Linking, unlinking and removing records that do not resolve are silent
//! no-ops: the `bool` return says whether anything was attempted and never
//! signals an error. Cycles are allowed; traversals guard against them.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::model::record::is_reserved_field;
use crate::model::{AddInput, Draft, IdSet, Record, Resolved, Target};
use crate::uid::{self, ROOT_UID};

// ---------------------------------------------------------------------------
// Violation
// ---------------------------------------------------------------------------

/// One breach of the store's relationship invariants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// A record is stored under the root sentinel.
    SentinelIndexed,
    /// An index key differs from the identifier of the record stored there.
    KeyMismatch { key: String, uid: String },
    /// The root lists a parent.
    RootHasParents { parents: Vec<String> },
    /// A record lists a parent that does not exist.
    DanglingParent { record: String, parent: String },
    /// A record lists a child that does not exist.
    DanglingChild { record: String, child: String },
    /// A record lists a parent that does not list it back as a child.
    AsymmetricParent { record: String, parent: String },
    /// A record lists a child that does not list it back as a parent.
    AsymmetricChild { record: String, child: String },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SentinelIndexed => write!(f, "a record is indexed under '{ROOT_UID}'"),
            Self::KeyMismatch { key, uid } => {
                write!(f, "index key '{key}' holds record '{uid}'")
            }
            Self::RootHasParents { parents } => {
                write!(f, "root lists parents: {}", parents.join(", "))
            }
            Self::DanglingParent { record, parent } => {
                write!(f, "'{record}' lists missing parent '{parent}'")
            }
            Self::DanglingChild { record, child } => {
                write!(f, "'{record}' lists missing child '{child}'")
            }
            Self::AsymmetricParent { record, parent } => {
                write!(f, "'{record}' lists parent '{parent}', which does not list it as a child")
            }
            Self::AsymmetricChild { record, child } => {
                write!(f, "'{record}' lists child '{child}', which does not list it as a parent")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Hierarchy
// ---------------------------------------------------------------------------

/// An indexed, multi-parent hierarchy of records.
#[derive(Debug, Clone)]
pub struct Hierarchy {
    index: HashMap<String, Record>,
    root: Record,
    config: StoreConfig,
}

impl Default for Hierarchy {
    fn default() -> Self {
        Self::new()
    }
}

impl Hierarchy {
    /// Create an empty store with no disambiguation fields.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    #[must_use]
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            index: HashMap::new(),
            root: Record::root(),
            config,
        }
    }

    /// Assemble a store from already-validated parts. Used by snapshot loading.
    pub(crate) fn from_parts(
        index: HashMap<String, Record>,
        root: Record,
        config: StoreConfig,
    ) -> Self {
        Self {
            index,
            root,
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The synthetic root record.
    #[must_use]
    pub const fn root(&self) -> &Record {
        &self.root
    }

    /// Number of indexed records. The root is not counted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns true if `uid` names the root or an indexed record.
    #[must_use]
    pub fn contains(&self, uid: &str) -> bool {
        uid == ROOT_UID || self.index.contains_key(uid)
    }

    /// Look up a record by identifier. The sentinel yields the root.
    #[must_use]
    pub fn get(&self, uid: &str) -> Option<&Record> {
        if uid == ROOT_UID {
            Some(&self.root)
        } else {
            self.index.get(uid)
        }
    }

    /// Mutable access to a stored record's name and payload.
    pub fn get_mut(&mut self, uid: &str) -> Option<&mut Record> {
        if uid == ROOT_UID {
            Some(&mut self.root)
        } else {
            self.index.get_mut(uid)
        }
    }

    fn is_taken(&self, candidate: &str) -> bool {
        candidate == ROOT_UID || self.index.contains_key(candidate)
    }

    // -----------------------------------------------------------------------
    // Identifier generation
    // -----------------------------------------------------------------------

    /// Derive a free identifier for `name` against the current index.
    ///
    /// Reads only; nothing is reserved until a record is inserted.
    pub fn generate_uid<S: AsRef<str>>(&self, name: &str, values: &[S]) -> String {
        uid::generate(name, values, |candidate| self.is_taken(candidate))
    }

    // -----------------------------------------------------------------------
    // Add
    // -----------------------------------------------------------------------

    /// Add one record, a bare name, or a batch of either.
    ///
    /// Each record gets an identifier (its requested one when that is free),
    /// is indexed, and is linked under `parent` (the root when `None`)
    /// without clearing parents it already lists. A `parent` that does not
    /// resolve leaves the record unlinked.
    ///
    /// Returns the assigned identifiers in input order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for the first record without a
    /// name. Records before it in the batch remain in the store.
    pub fn add(&mut self, input: impl Into<AddInput>, parent: Option<&str>) -> Result<Vec<String>> {
        let parent = parent.unwrap_or(ROOT_UID);
        let drafts = input.into().into_drafts();
        let mut added = Vec::with_capacity(drafts.len());

        for (position, draft) in drafts.into_iter().enumerate() {
            let uid = self.insert_draft(position, draft)?;
            if !self.add_parent(&uid, parent, false) {
                warn!(uid = %uid, parent, "parent does not resolve; record left unlinked");
            }
            debug!(uid = %uid, parent, "record added");
            added.push(uid);
        }

        Ok(added)
    }

    fn insert_draft(&mut self, position: usize, draft: Draft) -> Result<String> {
        if draft.name.as_deref().is_none_or(str::is_empty) {
            return Err(StoreError::Validation {
                position,
                reason: "name is required".to_string(),
            });
        }
        if let Some(key) = draft.fields.keys().find(|key| is_reserved_field(key)) {
            return Err(StoreError::Validation {
                position,
                reason: format!("field '{key}' is reserved"),
            });
        }

        let uid = match draft.uid.as_deref() {
            Some(requested) if !requested.is_empty() && !self.is_taken(requested) => {
                requested.to_string()
            }
            _ => {
                let values = draft.disambiguation_values(&self.config.disambiguate);
                self.generate_uid(draft.name.as_deref().unwrap_or_default(), &values)
            }
        };

        let Draft {
            name,
            children,
            parents,
            fields,
            ..
        } = draft;
        let record = Record::new(
            name.unwrap_or_default(),
            uid.clone(),
            children.unwrap_or_default(),
            parents.unwrap_or_default(),
            fields,
        );
        self.index.insert(uid.clone(), record);
        Ok(uid)
    }

    // -----------------------------------------------------------------------
    // Linking primitive
    // -----------------------------------------------------------------------

    /// Link `child` under `parent`.
    ///
    /// With `clear_existing`, the child is first detached from every current
    /// parent. Linking an existing pair changes nothing. Returns `false`
    /// (and does nothing) when either side does not resolve or when `child`
    /// is the root.
    pub fn add_parent(&mut self, child: &str, parent: &str, clear_existing: bool) -> bool {
        if child == ROOT_UID || !self.index.contains_key(child) || !self.contains(parent) {
            return false;
        }

        if clear_existing {
            self.detach_from_parents(child);
        }
        self.link(child, parent);
        debug!(child, parent, clear_existing, "linked");
        true
    }

    /// Unlink `child` from `parent`, whether or not they were linked.
    ///
    /// Returns `false` (and does nothing) when either side does not resolve.
    pub fn remove_parent(&mut self, child: &str, parent: &str) -> bool {
        if !self.contains(child) || !self.contains(parent) {
            return false;
        }

        if let Some(record) = self.get_mut(parent) {
            record.children_mut().remove(child);
        }
        if let Some(record) = self.get_mut(child) {
            record.parents_mut().remove(parent);
        }
        debug!(child, parent, "unlinked");
        true
    }

    /// Add both halves of a link. Both sides must exist.
    fn link(&mut self, child: &str, parent: &str) {
        if let Some(record) = self.get_mut(parent) {
            record.children_mut().insert(child);
        }
        if let Some(record) = self.get_mut(child) {
            record.parents_mut().insert(parent);
        }
    }

    /// Remove `child` from each parent's children and empty its parent list.
    /// Returns the former parents.
    fn detach_from_parents(&mut self, child: &str) -> IdSet {
        let former = match self.get_mut(child) {
            Some(record) => record.parents_mut().take(),
            None => return IdSet::new(),
        };
        for parent in former.iter() {
            if let Some(record) = self.get_mut(parent) {
                record.children_mut().remove(child);
            }
        }
        former
    }

    // -----------------------------------------------------------------------
    // Remove
    // -----------------------------------------------------------------------

    /// Remove records and either their descendants or their ties to them.
    ///
    /// Each target is detached from its parents first. Then each of its
    /// children is either removed recursively (`promote_orphans == false`)
    /// or relinked under the target's former parents (`true`), keeping the
    /// child's other parents. Targets that do not resolve, and the root,
    /// are skipped.
    ///
    /// A promoted child left with no parent at all (its only parent was a
    /// target that itself had none) is attached under the root rather than
    /// left unreachable. This goes one step past relinking to former
    /// parents and is intentional.
    ///
    /// Cascading removal walks an explicit stack, so chain depth is bounded
    /// only by memory.
    ///
    /// Returns the identifiers that were deleted, in deletion order
    /// (children before their parents).
    pub fn remove(&mut self, target: impl Into<Target>, promote_orphans: bool) -> Vec<String> {
        let target = target.into();
        let mut removed = Vec::new();
        for uid in target.uids() {
            if promote_orphans {
                self.remove_promoting(uid, &mut removed);
            } else {
                self.remove_cascading(uid, &mut removed);
            }
        }
        removed
    }

    fn child_ids(&self, uid: &str) -> Vec<String> {
        self.index
            .get(uid)
            .map(|record| record.children().to_vec())
            .unwrap_or_default()
    }

    fn delete(&mut self, uid: String, promote_orphans: bool, removed: &mut Vec<String>) {
        self.index.remove(&uid);
        debug!(uid = %uid, promote_orphans, "record removed");
        removed.push(uid);
    }

    fn remove_promoting(&mut self, uid: &str, removed: &mut Vec<String>) {
        if !self.index.contains_key(uid) {
            return;
        }

        // Parents are captured before the children are looked at, so
        // promotion targets the removed record's own former parents.
        let former_parents = self.detach_from_parents(uid);
        for child in &self.child_ids(uid) {
            self.promote(child, uid, &former_parents);
        }
        self.delete(uid.to_string(), true, removed);
    }

    /// Post-order removal of `uid` and everything below it. Each record is
    /// detached from its parents when first reached, before its children are
    /// read, so a cycle back to a record already on the stack is cut rather
    /// than followed.
    fn remove_cascading(&mut self, uid: &str, removed: &mut Vec<String>) {
        struct Frame {
            uid: String,
            children: Vec<String>,
            next: usize,
        }

        if !self.index.contains_key(uid) {
            return;
        }
        self.detach_from_parents(uid);
        let mut stack = vec![Frame {
            uid: uid.to_string(),
            children: self.child_ids(uid),
            next: 0,
        }];

        while let Some(frame) = stack.last_mut() {
            if let Some(child) = frame.children.get(frame.next).cloned() {
                frame.next += 1;
                if self.index.contains_key(&child) {
                    self.detach_from_parents(&child);
                    let children = self.child_ids(&child);
                    stack.push(Frame {
                        uid: child,
                        children,
                        next: 0,
                    });
                }
            } else if let Some(done) = stack.pop() {
                self.delete(done.uid, false, removed);
            }
        }
    }

    fn promote(&mut self, child: &str, removed_uid: &str, former_parents: &IdSet) {
        let Some(record) = self.index.get_mut(child) else {
            return;
        };
        record.parents_mut().remove(removed_uid);

        for parent in former_parents.iter() {
            if parent != removed_uid && parent != child && self.contains(parent) {
                self.link(child, parent);
            }
        }

        let orphaned = self
            .index
            .get(child)
            .is_some_and(|record| record.parents().is_empty());
        if orphaned {
            self.link(child, ROOT_UID);
        }
    }

    // -----------------------------------------------------------------------
    // Resolution and traversal
    // -----------------------------------------------------------------------

    /// Resolve a target into stored records, keeping its shape.
    ///
    /// A scalar target gives [`Resolved::One`], empty if nothing matched. A
    /// batch gives [`Resolved::Many`] with unmatched identifiers dropped.
    pub fn resolve(&self, target: impl Into<Target>) -> Resolved<'_> {
        match target.into() {
            Target::Root => Resolved::One(Some(&self.root)),
            Target::Uid(uid) => Resolved::One(self.get(&uid)),
            batch @ Target::Batch(_) => {
                Resolved::Many(batch.uids().into_iter().filter_map(|uid| self.get(uid)).collect())
            }
        }
    }

    /// Direct children of `uid`, dropping identifiers that no longer exist.
    #[must_use]
    pub fn children_of(&self, uid: &str) -> Vec<&Record> {
        self.get(uid)
            .map(|record| self.lookup_all(record.children()))
            .unwrap_or_default()
    }

    /// Direct parents of `uid`, dropping identifiers that no longer exist.
    /// The sentinel resolves to the root record.
    #[must_use]
    pub fn parents_of(&self, uid: &str) -> Vec<&Record> {
        self.get(uid)
            .map(|record| self.lookup_all(record.parents()))
            .unwrap_or_default()
    }

    fn lookup_all(&self, ids: &IdSet) -> Vec<&Record> {
        ids.iter().filter_map(|id| self.get(id)).collect()
    }

    /// Every record reachable through children links, breadth-first,
    /// excluding `uid` itself.
    #[must_use]
    pub fn descendants(&self, uid: &str) -> Vec<&Record> {
        self.walk(uid, Record::children)
    }

    /// Every record reachable through parent links, breadth-first,
    /// excluding `uid` itself. Includes the root when reachable.
    #[must_use]
    pub fn ancestors(&self, uid: &str) -> Vec<&Record> {
        self.walk(uid, Record::parents)
    }

    fn walk(&self, start: &str, edges: fn(&Record) -> &IdSet) -> Vec<&Record> {
        let Some(first) = self.get(start) else {
            return Vec::new();
        };

        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(first.uid());
        let mut queue: VecDeque<&Record> = VecDeque::new();
        queue.push_back(first);
        let mut out = Vec::new();

        while let Some(current) = queue.pop_front() {
            for next_uid in edges(current).iter() {
                if !visited.insert(next_uid) {
                    continue;
                }
                if let Some(next) = self.get(next_uid) {
                    out.push(next);
                    queue.push_back(next);
                }
            }
        }

        out
    }

    // -----------------------------------------------------------------------
    // Query boundary
    // -----------------------------------------------------------------------

    /// All indexed records, ordered by identifier. The root is not included.
    #[must_use]
    pub fn all(&self) -> Vec<&Record> {
        let mut records: Vec<&Record> = self.index.values().collect();
        records.sort_by(|a, b| a.uid().cmp(b.uid()));
        records
    }

    /// Indexed records matching `predicate`, ordered by identifier.
    pub fn filter<P>(&self, mut predicate: P) -> Vec<&Record>
    where
        P: FnMut(&Record) -> bool,
    {
        self.all().into_iter().filter(|r| predicate(r)).collect()
    }

    /// The first record (by identifier order) matching `predicate`.
    pub fn find<P>(&self, mut predicate: P) -> Option<&Record>
    where
        P: FnMut(&Record) -> bool,
    {
        self.all().into_iter().find(|r| predicate(r))
    }

    /// Records whose payload field `key` equals `value`. The key `name`
    /// matches the record name.
    #[must_use]
    pub fn find_by_field(&self, key: &str, value: &Value) -> Vec<&Record> {
        self.filter(|record| {
            if key == "name" {
                value.as_str() == Some(record.name.as_str())
            } else {
                record.field(key) == Some(value)
            }
        })
    }

    // -----------------------------------------------------------------------
    // Verification
    // -----------------------------------------------------------------------

    /// Check every relationship invariant. An empty result means the store
    /// is consistent.
    #[must_use]
    pub fn check(&self) -> Vec<Violation> {
        let mut violations = Vec::new();

        if self.index.contains_key(ROOT_UID) {
            violations.push(Violation::SentinelIndexed);
        }
        if !self.root.parents().is_empty() {
            violations.push(Violation::RootHasParents {
                parents: self.root.parents().to_vec(),
            });
        }

        let mut records: Vec<(&str, &Record)> = self
            .index
            .iter()
            .map(|(key, record)| (key.as_str(), record))
            .collect();
        records.sort_by(|a, b| a.0.cmp(b.0));

        for (key, record) in &records {
            if *key != record.uid() {
                violations.push(Violation::KeyMismatch {
                    key: (*key).to_string(),
                    uid: record.uid().to_string(),
                });
            }
        }

        for record in std::iter::once(&self.root).chain(records.iter().map(|(_, r)| *r)) {
            let uid = record.uid();
            for parent in record.parents().iter() {
                match self.get(parent) {
                    None => violations.push(Violation::DanglingParent {
                        record: uid.to_string(),
                        parent: parent.to_string(),
                    }),
                    Some(p) if !p.children().contains(uid) => {
                        violations.push(Violation::AsymmetricParent {
                            record: uid.to_string(),
                            parent: parent.to_string(),
                        });
                    }
                    Some(_) => {}
                }
            }
            for child in record.children().iter() {
                match self.index.get(child) {
                    None => violations.push(Violation::DanglingChild {
                        record: uid.to_string(),
                        child: child.to_string(),
                    }),
                    Some(c) if !c.parents().contains(uid) => {
                        violations.push(Violation::AsymmetricChild {
                            record: uid.to_string(),
                            child: child.to_string(),
                        });
                    }
                    Some(_) => {}
                }
            }
        }

        violations
    }

    /// Iterate indexed records in no particular order.
    pub(crate) fn records(&self) -> impl Iterator<Item = &Record> {
        self.index.values()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
