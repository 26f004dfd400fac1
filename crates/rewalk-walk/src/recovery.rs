//! Recovery planning for resumed walks.
//!
//! A resumed walk replays the tree from the root without invoking handlers
//! until it reaches the first location the interrupted walk had not
//! finished. The [`RecoveryRoad`] is the recorded chain of open directories,
//! root first, that guides this fast-forward.

use rewalk_core::{Locator, ProgressEntry, ProgressStack};

/// What to do with a location met while fast-forwarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoadDecision {
    /// The directory is on the road; keep fast-forwarding through it.
    Follow,
    /// The location was pending when progress was recorded; resume here.
    Resume,
    /// The location was finished in the interrupted walk.
    Skip,
    /// The walk root is not the recorded root.
    Diverged,
}

/// Root-first copy of a recorded progress stack.
#[derive(Debug, Clone)]
pub struct RecoveryRoad {
    entries: Vec<ProgressEntry>,
}

impl RecoveryRoad {
    /// Plan a recovery from recorded progress. An empty stack means there is
    /// nothing to recover and yields `None`.
    pub fn plan(progress: &ProgressStack) -> Option<Self> {
        if progress.is_empty() {
            return None;
        }
        Some(Self {
            entries: progress.iter().cloned().collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The recorded entry at a depth.
    pub fn entry(&self, depth: usize) -> Option<&ProgressEntry> {
        self.entries.get(depth)
    }

    /// The deepest recorded directory.
    pub fn destination(&self) -> Option<&Locator> {
        self.entries.last().map(ProgressEntry::locator)
    }

    /// Check whether a directory at `depth` is the recorded one.
    pub fn is_on_road(&self, depth: usize, locator: &Locator) -> bool {
        self.entry(depth).is_some_and(|e| e.locator() == locator)
    }

    /// Check whether a location at `depth` was pending in its recorded
    /// parent. The root has no parent, so this is always false at depth 0.
    pub fn is_pending(&self, depth: usize, locator: &Locator) -> bool {
        depth
            .checked_sub(1)
            .and_then(|parent| self.entry(parent))
            .is_some_and(|e| e.contains_child(locator))
    }

    /// Decide how to treat a directory at `depth`.
    pub fn decide_directory(&self, depth: usize, locator: &Locator) -> RoadDecision {
        if self.is_on_road(depth, locator) {
            RoadDecision::Follow
        } else if depth == 0 {
            RoadDecision::Diverged
        } else if self.is_pending(depth, locator) {
            RoadDecision::Resume
        } else {
            RoadDecision::Skip
        }
    }

    /// Decide how to treat a file at `depth`.
    pub fn decide_file(&self, depth: usize, locator: &Locator) -> RoadDecision {
        if self.is_pending(depth, locator) {
            RoadDecision::Resume
        } else {
            RoadDecision::Skip
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rewalk_core::ResourceId;

    fn loc(path: &str) -> Locator {
        Locator::from_path(path)
    }

    // root: pending {a, b}; a: pending {y}
    fn road() -> RecoveryRoad {
        let stack = ProgressStack::from_entries(vec![
            ProgressEntry::new(
                loc("/root"),
                ResourceId::new(1, "/root"),
                [loc("/root/a"), loc("/root/b")],
            ),
            ProgressEntry::new(loc("/root/a"), ResourceId::new(2, "/root/a"), [loc("/root/a/y")]),
        ])
        .unwrap();
        RecoveryRoad::plan(&stack).unwrap()
    }

    #[test]
    fn test_empty_progress_has_no_road() {
        assert!(RecoveryRoad::plan(&ProgressStack::new()).is_none());
    }

    #[test]
    fn test_road_is_root_first() {
        let road = road();
        assert_eq!(road.len(), 2);
        assert_eq!(road.entry(0).unwrap().locator(), &loc("/root"));
        assert_eq!(road.destination(), Some(&loc("/root/a")));
    }

    #[test]
    fn test_directory_decisions() {
        let road = road();
        assert_eq!(road.decide_directory(0, &loc("/root")), RoadDecision::Follow);
        assert_eq!(road.decide_directory(0, &loc("/other")), RoadDecision::Diverged);
        assert_eq!(road.decide_directory(1, &loc("/root/a")), RoadDecision::Follow);
        assert_eq!(road.decide_directory(1, &loc("/root/b")), RoadDecision::Resume);
        assert_eq!(road.decide_directory(1, &loc("/root/done")), RoadDecision::Skip);
        assert_eq!(road.decide_directory(2, &loc("/root/a/y")), RoadDecision::Resume);
    }

    #[test]
    fn test_file_decisions() {
        let road = road();
        assert_eq!(road.decide_file(2, &loc("/root/a/x")), RoadDecision::Skip);
        assert_eq!(road.decide_file(2, &loc("/root/a/y")), RoadDecision::Resume);
        assert_eq!(road.decide_file(1, &loc("/root/b")), RoadDecision::Resume);
        // No parent at the root.
        assert_eq!(road.decide_file(0, &loc("/root")), RoadDecision::Skip);
    }

    #[test]
    fn test_directory_replaced_by_file_is_resumed() {
        // "/root/a" was an open directory; a file with that name is still
        // pending in the root's entry.
        let road = road();
        assert_eq!(road.decide_file(1, &loc("/root/a")), RoadDecision::Resume);
    }
}
