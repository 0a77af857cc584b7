//! Priority queue of entries awaiting semantic analysis.
//!
//! Owned by the analysis thread, which is its only consumer. An entry is
//! queued at most once; queueing it again at a higher priority moves it up.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use super::entry::EntryId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Priority {
    /// Live edits in an open buffer.
    High,
    /// Discovery, disk changes and dependency fan-out.
    Normal,
    Low,
}

impl Priority {
    const ALL: [Priority; 3] = [Priority::High, Priority::Normal, Priority::Low];

    fn tier(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Default)]
pub(crate) struct AnalysisQueue {
    tiers: [VecDeque<EntryId>; 3],
    queued: FxHashMap<EntryId, Priority>,
}

impl AnalysisQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `entry`; returns false when it was already queued.
    pub fn push(&mut self, entry: EntryId, priority: Priority) -> bool {
        match self.queued.get(&entry).copied() {
            None => {
                self.queued.insert(entry, priority);
                self.tiers[priority.tier()].push_back(entry);
                true
            }
            Some(current) if priority < current => {
                self.tiers[current.tier()].retain(|e| *e != entry);
                self.tiers[priority.tier()].push_back(entry);
                self.queued.insert(entry, priority);
                false
            }
            Some(_) => false,
        }
    }

    /// Next entry: highest priority first, FIFO within a priority.
    pub fn pop(&mut self) -> Option<EntryId> {
        for priority in Priority::ALL {
            if let Some(entry) = self.tiers[priority.tier()].pop_front() {
                self.queued.remove(&entry);
                return Some(entry);
            }
        }
        None
    }

    /// Drop `entry` if queued; returns whether it was.
    pub fn remove(&mut self, entry: EntryId) -> bool {
        match self.queued.remove(&entry) {
            Some(priority) => {
                self.tiers[priority.tier()].retain(|e| *e != entry);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.queued.len()
    }
}
