/// Identifier for one asynchronous capture or upload attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

#[derive(Debug, Default, Clone)]
pub struct TaskSeq {
    next: u64,
}

impl TaskSeq {
    pub fn next_id(&mut self) -> TaskId {
        let id = TaskId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }
}

/// Tracks the single task whose completion is still wanted.
#[derive(Debug, Default, Clone)]
pub struct TaskSlot {
    active: Option<TaskId>,
}

impl TaskSlot {
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn is_active(&self, id: TaskId) -> bool {
        self.active == Some(id)
    }

    pub fn start(&mut self, id: TaskId) {
        self.active = Some(id);
    }

    /// Clears the slot if `id` is the active task. False means stale.
    pub fn finish_if_active(&mut self, id: TaskId) -> bool {
        let ok = self.is_active(id);
        if ok {
            self.active = None;
        }
        ok
    }

    pub fn clear(&mut self) {
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic() {
        let mut seq = TaskSeq::default();
        let a = seq.next_id();
        let b = seq.next_id();
        assert!(b > a);
    }

    #[test]
    fn test_only_active_task_finishes() {
        let mut seq = TaskSeq::default();
        let mut slot = TaskSlot::default();
        let old = seq.next_id();
        let new = seq.next_id();
        slot.start(old);
        slot.start(new);

        assert!(!slot.finish_if_active(old));
        assert!(slot.is_running());
        assert!(slot.finish_if_active(new));
        assert!(!slot.is_running());
    }
}
