//! A module which contains the definition of the messages exchanged between agents in the
//! Paxos-style protocol that backs a single replicated record.
//!
//! Unlike the message hierarchy this crate is descended from, there is no shared base type:
//! every phase is its own struct, and the HTTP endpoint a message is sent to is a property of
//! which [`crate::transport::Transport`] method is called, not of the message type itself.

use serde::{Deserialize, Serialize};

/// A totally ordered, process-unique proposal number.
///
/// Plain `u64` is sufficient here because the cluster runs a single logical write at a time per
/// key, arbitrated by the conflict/repair machinery in [`crate::proposer`] rather than by
/// cross-agent ballot uniqueness.
pub type Ballot = u64;

/// The canonical carrier of proposal identity: a ballot, the key under agreement, and the
/// opaque payload the caller wants agreed upon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prepare {
    pub id: Ballot,
    pub key: String,
    pub predicate: String,
    pub argument: serde_json::Value,
}

impl Prepare {
    pub fn new(
        id: Ballot,
        key: impl Into<String>,
        predicate: impl Into<String>,
        argument: serde_json::Value,
    ) -> Self {
        Prepare {
            id,
            key: key.into(),
            predicate: predicate.into(),
            argument,
        }
    }
}

/// Wraps a [`Prepare`] to denote "this acceptor has promised to honor ballots >= id for key".
///
/// An empty Promise (`prepare: None`) is a bare acknowledgement: the acceptor issued a fresh
/// promise and has nothing for the proposer to repair. A Promise carrying a `Prepare` is either
/// a RepairHint (HTTP 200) or a rejection body (HTTP 400), the two disambiguated by the status
/// code the acceptor responded with, not by the shape of this struct.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Promise {
    pub prepare: Option<Prepare>,
}

impl Promise {
    pub fn empty() -> Self {
        Promise { prepare: None }
    }

    pub fn of(prepare: Prepare) -> Self {
        Promise {
            prepare: Some(prepare),
        }
    }

    /// The `(key, id)` pair this promise is filed under. Panics if this is an empty promise;
    /// only promises that wrap a prepare are ever handed to [`crate::store::PromiseStore`].
    pub fn slot(&self) -> (&str, Ballot) {
        let prepare = self
            .prepare
            .as_ref()
            .expect("empty Promise has no store slot");
        (prepare.key.as_str(), prepare.id)
    }
}

/// Wraps the [`Prepare`] the proposer wishes to commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Propose {
    pub prepare: Prepare,
}

/// The acceptor's positive response to [`Propose`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accept {
    pub prepare: Prepare,
}

/// Wraps the [`Prepare`] being committed, sent from the proposer to every learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Learn {
    pub prepare: Prepare,
}

/// The sole value the `status` field of a [`Success`] ever takes; kept as a type rather than a
/// plain string so a malformed wire payload fails to deserialize instead of round-tripping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuccessStatus {
    #[serde(rename = "SUCCESS")]
    Success,
}

/// The learner's positive response to [`Learn`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Success {
    pub status: SuccessStatus,
    pub prepare: Prepare,
}

impl Success {
    pub fn new(prepare: Prepare) -> Self {
        Success {
            status: SuccessStatus::Success,
            prepare,
        }
    }
}

/// The body a client posts to `/write`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteRequest {
    pub key: String,
    pub predicate: String,
    pub argument: serde_json::Value,
}
