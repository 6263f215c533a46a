use std::collections::BTreeSet;

use crate::tracking::domain::subject_state::SubjectId;

/// Free-list allocator for subject handles.
///
/// Always hands out the lowest free handle (starting at 1) so on-screen
/// labels stay small when people come and go.
#[derive(Debug)]
pub struct HandleArena {
    next: SubjectId,
    free: BTreeSet<SubjectId>,
}

impl HandleArena {
    pub fn new() -> Self {
        Self {
            next: 1,
            free: BTreeSet::new(),
        }
    }

    pub fn allocate(&mut self) -> SubjectId {
        if let Some(id) = self.free.pop_first() {
            return id;
        }
        let id = self.next;
        self.next += 1;
        id
    }

    /// Returns a handle to the pool. Unknown or already-free handles are
    /// ignored.
    pub fn release(&mut self, id: SubjectId) {
        if id == 0 || id >= self.next {
            return;
        }
        self.free.insert(id);
    }

    pub fn in_use(&self) -> usize {
        (self.next as usize - 1) - self.free.len()
    }
}

impl Default for HandleArena {
    fn default() -> Self {
        Self::new()
    }
}
