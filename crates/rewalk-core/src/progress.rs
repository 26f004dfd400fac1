//! Progress entries and the progress stack.
//!
//! The progress stack records the chain of directories that are currently
//! open, from the walk root down to the directory being processed. Each
//! entry carries the children of its directory that have not been fully
//! handled yet. Entries refer to each other only through [`Locator`] values,
//! so the whole stack serializes as plain data.

use compact_str::CompactString;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::error::WalkError;
use crate::locator::Locator;

/// Identifier assigned to a directory by the directory handler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId {
    /// Numeric id in the caller's persistence layer.
    pub id: u64,
    /// Path prefix associated with the id.
    pub prefix: CompactString,
}

impl ResourceId {
    /// Create a new resource id.
    pub fn new(id: u64, prefix: impl Into<CompactString>) -> Self {
        Self {
            id,
            prefix: prefix.into(),
        }
    }
}

/// One open directory and its not-yet-handled children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEntry {
    id: u64,
    prefix: CompactString,
    locator: Locator,
    #[serde(default)]
    pending: IndexSet<Locator>,
}

impl ProgressEntry {
    /// Create an entry for a directory with its full child list.
    pub fn new(
        locator: Locator,
        resource_id: ResourceId,
        children: impl IntoIterator<Item = Locator>,
    ) -> Self {
        Self {
            id: resource_id.id,
            prefix: resource_id.prefix,
            locator,
            pending: children.into_iter().collect(),
        }
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The resource id the directory handler assigned to this directory.
    pub fn resource_id(&self) -> ResourceId {
        ResourceId::new(self.id, self.prefix.clone())
    }

    /// Children not yet handled, in enumeration order.
    pub fn pending(&self) -> impl ExactSizeIterator<Item = &Locator> {
        self.pending.iter()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Check whether a child is still pending.
    pub fn contains_child(&self, child: &Locator) -> bool {
        self.pending.contains(child)
    }

    /// Mark a child as handled. Returns `false` if it was not pending.
    pub fn remove_child(&mut self, child: &Locator) -> bool {
        self.pending.shift_remove(child)
    }

    /// Check whether every child has been handled.
    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Ordered record of open directories, root first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressStack {
    entries: Vec<ProgressEntry>,
}

impl ProgressStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a stack from root-first entries.
    pub fn from_entries(entries: Vec<ProgressEntry>) -> Result<Self, WalkError> {
        let mut stack = Self::new();
        for entry in entries {
            stack.push(entry)?;
        }
        Ok(stack)
    }

    /// Open a directory. Fails if its locator is already on the stack.
    pub fn push(&mut self, entry: ProgressEntry) -> Result<(), WalkError> {
        if self.position(entry.locator()).is_some() {
            return Err(WalkError::DuplicateEntry {
                locator: entry.locator,
            });
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Close the most recently opened directory.
    pub fn pop(&mut self) -> Option<ProgressEntry> {
        self.entries.pop()
    }

    /// The directory currently being processed.
    pub fn peek(&self) -> Option<&ProgressEntry> {
        self.entries.last()
    }

    pub fn peek_mut(&mut self) -> Option<&mut ProgressEntry> {
        self.entries.last_mut()
    }

    /// The entry at a given depth (root = 0).
    pub fn get(&self, depth: usize) -> Option<&ProgressEntry> {
        self.entries.get(depth)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry deeper than `len`, returning how many were removed.
    pub fn truncate(&mut self, len: usize) -> usize {
        let removed = self.entries.len().saturating_sub(len);
        self.entries.truncate(len);
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterate entries from the root towards the current directory.
    pub fn iter(&self) -> std::slice::Iter<'_, ProgressEntry> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[ProgressEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<ProgressEntry> {
        self.entries
    }

    /// Depth of the entry for a directory, if it is open.
    pub fn position(&self, locator: &Locator) -> Option<usize> {
        self.entries.iter().position(|e| e.locator() == locator)
    }

    /// Check whether the entry at `depth` still has `child` pending.
    pub fn contains_child_at(&self, depth: usize, child: &Locator) -> bool {
        self.get(depth).is_some_and(|e| e.contains_child(child))
    }

    /// Mark a child of the current directory as handled.
    pub fn remove_child_from_top(&mut self, child: &Locator) -> bool {
        self.peek_mut().is_some_and(|e| e.remove_child(child))
    }
}

impl<'a> IntoIterator for &'a ProgressStack {
    type Item = &'a ProgressEntry;
    type IntoIter = std::slice::Iter<'a, ProgressEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(path: &str) -> Locator {
        Locator::from_path(path)
    }

    fn entry(path: &str, children: &[&str]) -> ProgressEntry {
        ProgressEntry::new(
            loc(path),
            ResourceId::new(7, path),
            children.iter().copied().map(loc),
        )
    }

    #[test]
    fn test_entry_pending_children() {
        let mut e = entry("/r", &["/r/a", "/r/b", "/r/c"]);
        assert_eq!(e.pending_len(), 3);
        assert!(e.contains_child(&loc("/r/b")));

        assert!(e.remove_child(&loc("/r/b")));
        assert!(!e.remove_child(&loc("/r/b")));
        assert!(!e.contains_child(&loc("/r/b")));

        let order: Vec<_> = e.pending().cloned().collect();
        assert_eq!(order, vec![loc("/r/a"), loc("/r/c")]);

        e.remove_child(&loc("/r/a"));
        e.remove_child(&loc("/r/c"));
        assert!(e.is_complete());
    }

    #[test]
    fn test_entry_resource_id() {
        let e = entry("/r", &[]);
        assert_eq!(e.id(), 7);
        assert_eq!(e.prefix(), "/r");
        assert_eq!(e.resource_id(), ResourceId::new(7, "/r"));
    }

    #[test]
    fn test_stack_discipline() {
        let mut stack = ProgressStack::new();
        assert!(stack.is_empty());

        stack.push(entry("/r", &["/r/a"])).unwrap();
        stack.push(entry("/r/a", &["/r/a/x"])).unwrap();
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.peek().unwrap().locator(), &loc("/r/a"));
        assert_eq!(stack.get(0).unwrap().locator(), &loc("/r"));

        assert!(stack.contains_child_at(0, &loc("/r/a")));
        assert!(stack.remove_child_from_top(&loc("/r/a/x")));
        assert!(stack.peek().unwrap().is_complete());

        let popped = stack.pop().unwrap();
        assert_eq!(popped.locator(), &loc("/r/a"));
        assert_eq!(stack.peek().unwrap().locator(), &loc("/r"));
    }

    #[test]
    fn test_stack_rejects_duplicates() {
        let mut stack = ProgressStack::new();
        stack.push(entry("/r", &[])).unwrap();
        let err = stack.push(entry("/r", &[])).unwrap_err();
        assert!(matches!(err, WalkError::DuplicateEntry { .. }));
        assert_eq!(stack.len(), 1);

        assert!(ProgressStack::from_entries(vec![entry("/r", &[]), entry("/r", &[])]).is_err());
    }

    #[test]
    fn test_truncate_reports_removed() {
        let mut stack = ProgressStack::from_entries(vec![
            entry("/r", &[]),
            entry("/r/a", &[]),
            entry("/r/a/b", &[]),
        ])
        .unwrap();

        assert_eq!(stack.truncate(1), 2);
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.truncate(5), 0);
    }

    #[test]
    fn test_stack_serializes_root_first() {
        let stack =
            ProgressStack::from_entries(vec![entry("/r", &["/r/b"]), entry("/r/a", &["/r/a/y"])])
                .unwrap();
        let json = serde_json::to_value(&stack).unwrap();
        let array = json.as_array().unwrap();
        assert_eq!(array.len(), 2);
        assert_eq!(array[0]["locator"], "file:///r");
        assert_eq!(array[1]["pending"][0], "file:///r/a/y");
        assert_eq!(array[0]["id"], 7);

        let back: ProgressStack = serde_json::from_value(json).unwrap();
        assert_eq!(back, stack);
    }
}
