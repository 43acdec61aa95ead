use crate::types::Project;

pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Bounded undo/redo history of full-document snapshots.
///
/// Every entry is a deep copy of the whole [`Project`] — no operation replay
/// or diffing — trading memory for guaranteed correctness: restoring a
/// snapshot cannot half-apply. When `past` exceeds capacity the oldest entry
/// is discarded; overflow never fails.
#[derive(Debug, Clone)]
pub struct History {
    past: Vec<Project>,
    future: Vec<Project>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            past: Vec::new(),
            future: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Record the pre-mutation state of a committed edit. Clears the redo
    /// side: a fresh edit invalidates any undone branch.
    pub fn record(&mut self, before: Project) {
        self.future.clear();
        self.past.push(before);
        if self.past.len() > self.capacity {
            self.past.remove(0);
        }
    }

    /// Pop the most recent snapshot, parking `current` on the redo side.
    /// `None` when there is nothing to undo.
    pub fn undo(&mut self, current: Project) -> Option<Project> {
        let restored = self.past.pop()?;
        self.future.push(current);
        Some(restored)
    }

    /// Mirror of [`undo`](Self::undo).
    pub fn redo(&mut self, current: Project) -> Option<Project> {
        let restored = self.future.pop()?;
        self.past.push(current);
        Some(restored)
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn past_len(&self) -> usize {
        self.past.len()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{preset_1080p, Project};

    fn titled(title: &str) -> Project {
        Project::new(title, preset_1080p())
    }

    #[test]
    fn undo_redo_round_trip() {
        let mut history = History::new(10);
        let v1 = titled("v1");
        let v2 = titled("v2");

        history.record(v1.clone());
        let restored = history.undo(v2.clone()).unwrap();
        assert_eq!(restored, v1);

        let forward = history.redo(restored).unwrap();
        assert_eq!(forward, v2);
    }

    #[test]
    fn undo_on_empty_is_none() {
        let mut history = History::new(10);
        assert!(history.undo(titled("current")).is_none());
        assert!(history.redo(titled("current")).is_none());
    }

    #[test]
    fn record_clears_redo_branch() {
        let mut history = History::new(10);
        history.record(titled("v1"));
        history.undo(titled("v2")).unwrap();
        assert!(history.can_redo());

        history.record(titled("v1b"));
        assert!(!history.can_redo());
    }

    #[test]
    fn capacity_bound_discards_oldest() {
        let capacity = 5;
        let mut history = History::new(capacity);
        for i in 0..capacity + 5 {
            history.record(titled(&format!("v{i}")));
            assert!(history.past_len() <= capacity);
        }
        assert_eq!(history.past_len(), capacity);

        // The surviving oldest entry is v5, not v0.
        let mut current = titled("current");
        let mut last = None;
        while let Some(p) = history.undo(current) {
            current = p.clone();
            last = Some(p);
        }
        assert_eq!(last.unwrap().title, "v5");
    }

    #[test]
    fn zero_capacity_is_clamped_to_one() {
        let mut history = History::new(0);
        history.record(titled("v1"));
        history.record(titled("v2"));
        assert_eq!(history.past_len(), 1);
    }
}
