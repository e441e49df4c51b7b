//! The acceptor role: arbitrates Prepare and Propose requests against the two Promise stores
//! held by the owning [`Agent`].

use crate::agent::Agent;
use crate::message::{Accept, Prepare, Promise, Propose};
use crate::transport::PrepareOutcome;

/// The outcome of arbitrating a [`Prepare`], before it is translated into an HTTP response.
///
/// `Promise` and `RepairHint` both correspond to status `200`; they're kept distinct here so
/// callers (the HTTP handler, and the in-memory transport used in tests) can tell a bare
/// acknowledgement from a hint apart without re-inspecting the wrapped `Promise`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrepareDecision {
    /// A fresh promise was issued; no in-progress round to repair.
    Promise(Promise),
    /// A promise was already in progress for a lower ballot; the proposer should adopt it.
    RepairHint(Promise),
    /// The incoming ballot lost to an existing promise or a previously learned round.
    Reject(Promise),
}

impl PrepareDecision {
    pub fn status_code(&self) -> u16 {
        match self {
            PrepareDecision::Promise(_) | PrepareDecision::RepairHint(_) => 200,
            PrepareDecision::Reject(_) => 400,
        }
    }

    pub fn into_promise(self) -> Promise {
        match self {
            PrepareDecision::Promise(p) | PrepareDecision::RepairHint(p) | PrepareDecision::Reject(p) => p,
        }
    }
}

impl From<PrepareDecision> for PrepareOutcome {
    fn from(decision: PrepareDecision) -> Self {
        match decision {
            PrepareDecision::Promise(p) | PrepareDecision::RepairHint(p) => PrepareOutcome::Issued(p),
            PrepareDecision::Reject(p) => PrepareOutcome::Conflicting(p),
        }
    }
}

pub struct Acceptor<'a> {
    agent: &'a Agent,
}

impl<'a> Acceptor<'a> {
    pub fn new(agent: &'a Agent) -> Self {
        Acceptor { agent }
    }

    /// Decides whether to issue a fresh Promise, hand back a pending one for repair, or reject.
    /// Acquires `current` then `completed`, makes the decision, and releases both before
    /// returning. This never crosses an `.await` point, so the locks are always held for a
    /// bounded, synchronous span.
    pub fn handle_prepare(&self, prepare: Prepare) -> PrepareDecision {
        let mut current = self.agent.current.lock().unwrap();
        let completed = self.agent.completed.lock().unwrap();

        let completed_highest = completed.get(&prepare.key).map(|p| p.slot().1);
        current.evict_superseded(&prepare.key, completed_highest);

        if let Some(in_progress) = current.get(&prepare.key) {
            let in_progress_id = in_progress.slot().1;

            if in_progress_id == prepare.id {
                // The ballot allocator handed out an id already in flight for this key. This is
                // a bug in the allocator, not a legitimate race: ballots are process-unique by
                // construction. Crash loudly in debug builds; degrade to a Reject in release so
                // one misbehaving round doesn't take the process down.
                log::error!(
                    "ballot collision for key={} id={}",
                    prepare.key,
                    prepare.id
                );
                debug_assert!(
                    false,
                    "ballot collision: current.id == prepare.id for key {}",
                    prepare.key
                );
                return PrepareDecision::Reject(in_progress);
            }

            if in_progress_id > prepare.id {
                return PrepareDecision::Reject(in_progress);
            }

            // in_progress_id < prepare.id, and eviction above already guaranteed this entry
            // isn't stale relative to a learned round: hand it back as a repair hint.
            return PrepareDecision::RepairHint(in_progress);
        }

        match completed_highest {
            Some(highest) if prepare.id <= highest => {
                PrepareDecision::Reject(completed.get(&prepare.key).expect("checked above"))
            }
            _ => {
                current.add(Promise::of(prepare));
                PrepareDecision::Promise(Promise::empty())
            }
        }
    }

    /// Unconditionally clears `current[key][id]` and returns an Accept. A Propose only ever
    /// arrives after this acceptor itself issued the matching Promise, so there is no decision
    /// to make here beyond bookkeeping.
    pub fn handle_propose(&self, propose: Propose) -> Accept {
        let mut current = self.agent.current.lock().unwrap();
        current.remove(&propose.prepare);
        Accept {
            prepare: propose.prepare,
        }
    }
}
