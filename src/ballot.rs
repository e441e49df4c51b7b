//! The monotone ballot-number allocator (component A).
//!
//! A process-wide counter guarded by a mutex. [`BallotAllocator::next`] returns the current
//! value and increments it; [`BallotAllocator::bump`] is used by the proposer to jump past a
//! ballot observed in a conflicting response, preserving the invariant that this process never
//! hands out a ballot already seen in flight.

use std::sync::Mutex;

use crate::message::Ballot;

pub struct BallotAllocator {
    next: Mutex<Ballot>,
}

impl Default for BallotAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl BallotAllocator {
    pub fn new() -> Self {
        BallotAllocator { next: Mutex::new(0) }
    }

    /// Returns the current ballot, then increments the counter.
    pub fn next(&self) -> Ballot {
        let mut next = self.next.lock().unwrap();
        let value = *next;
        *next += 1;
        value
    }

    /// Advances the counter so that the next value handed out is strictly greater than
    /// `observed`. Bumping past a ballot already assigned elsewhere never rewinds the counter.
    pub fn bump(&self, observed: Ballot) {
        let mut next = self.next.lock().unwrap();
        *next = (*next).max(observed + 1);
    }
}
