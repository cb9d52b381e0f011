//! Reorder buffer for results that complete out of order.
//!
//! Positions are handed out in discovery order; results are inserted in
//! completion order and read back in position order.

use crate::report::{CheckEntry, Counts};
use crate::target::TargetError;
use crate::verify::Outcome;

/// Arena of result slots indexed by source position.
#[derive(Debug)]
pub struct Slots<T> {
    slots: Vec<Option<T>>,
}

impl<T> Default for Slots<T> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<T> Slots<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next position.
    pub fn reserve(&mut self) -> usize {
        self.slots.push(None);
        self.slots.len() - 1
    }

    /// Fill `position`, growing the arena if it was never reserved.
    pub fn insert(&mut self, position: usize, value: T) {
        if position >= self.slots.len() {
            self.slots.resize_with(position + 1, || None);
        }
        self.slots[position] = Some(value);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Values in position order; `None` for slots that were never filled.
    pub fn into_ordered(self) -> impl Iterator<Item = Option<T>> {
        self.slots.into_iter()
    }
}

/// Collects the outcomes of one manifest and keeps running counts.
#[derive(Debug, Default)]
pub struct CheckAggregator {
    targets: Vec<String>,
    outcomes: Slots<Outcome>,
    counts: Counts,
}

impl CheckAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the position of the next manifest line.
    pub fn reserve(&mut self, target: impl Into<String>) -> usize {
        self.targets.push(target.into());
        self.outcomes.reserve()
    }

    pub fn insert(&mut self, position: usize, outcome: Outcome) {
        self.counts.record(&outcome);
        self.outcomes.insert(position, outcome);
    }

    pub fn counts(&self) -> &Counts {
        &self.counts
    }

    /// Entries in manifest order. A slot whose task never reported becomes
    /// an I/O failure for that target.
    pub fn finish(self) -> (Vec<CheckEntry>, Counts) {
        let CheckAggregator {
            targets,
            outcomes,
            mut counts,
        } = self;
        let mut entries = Vec::with_capacity(targets.len());
        for (target, outcome) in targets.into_iter().zip(outcomes.into_ordered()) {
            let outcome = outcome.unwrap_or_else(|| {
                let lost = Outcome::OtherIoError(TargetError::other("verification task failed"));
                counts.record(&lost);
                lost
            });
            entries.push(CheckEntry { target, outcome });
        }
        (entries, counts)
    }
}
