use std::collections::VecDeque;

use log::warn;

use crate::{snapshot::snapshot::Snapshot, types::InputId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Appended,
    /// Same input id as the newest entry; the entry was updated in place.
    Replaced,
    /// Older than the newest entry, or carrying the sentinel id. Dropped.
    Rejected,
}

/// A deque of snapshots kept strictly increasing in input id.
pub struct SnapshotQueue<V> {
    snapshots: VecDeque<Snapshot<V>>,
}

impl<V: Clone> SnapshotQueue<V> {
    pub fn new() -> Self {
        Self {
            snapshots: VecDeque::new(),
        }
    }

    pub fn insert(&mut self, snapshot: Snapshot<V>) -> InsertOutcome {
        if snapshot.input_id == InputId::MAX {
            return InsertOutcome::Rejected;
        }

        if let Some(back) = self.snapshots.back_mut() {
            if snapshot.input_id == back.input_id {
                *back = snapshot;
                return InsertOutcome::Replaced;
            }
            if snapshot.input_id < back.input_id {
                warn!(
                    "snapshot with input id {} arrived after {}, dropped",
                    snapshot.input_id, back.input_id
                );
                return InsertOutcome::Rejected;
            }
        }

        self.snapshots.push_back(snapshot);
        InsertOutcome::Appended
    }

    /// Drop every snapshot older than `input_id`.
    pub fn drop_below(&mut self, input_id: InputId) {
        while self
            .snapshots
            .front()
            .is_some_and(|snapshot| snapshot.input_id < input_id)
        {
            self.snapshots.pop_front();
        }
    }

    pub fn contains(&self, input_id: InputId) -> bool {
        self.snapshots
            .iter()
            .any(|snapshot| snapshot.input_id == input_id)
    }

    pub fn front(&self) -> Option<&Snapshot<V>> {
        self.snapshots.front()
    }

    pub fn pop_front(&mut self) -> Option<Snapshot<V>> {
        self.snapshots.pop_front()
    }

    pub fn back_mut(&mut self) -> Option<&mut Snapshot<V>> {
        self.snapshots.back_mut()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Snapshot<V>> {
        self.snapshots.get_mut(index)
    }

    /// Input ids, newest first.
    pub fn ids_newest_first(&self) -> impl Iterator<Item = InputId> + '_ {
        self.snapshots.iter().rev().map(|snapshot| snapshot.input_id)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}

impl<V: Clone> Default for SnapshotQueue<V> {
    fn default() -> Self {
        Self::new()
    }
}
