//! The `Agent` context value: the process-wide mutable state (the two Promise stores, the
//! ballot allocator, and the ordered commit log) bundled into one value passed into every
//! handler at construction, rather than exposed as ambient globals. Each test constructs a
//! fresh `Agent`.

use std::sync::{Arc, Mutex};

use crate::ballot::BallotAllocator;
use crate::clock::Clock;
use crate::message::Prepare;
use crate::store::PromiseStore;
use crate::transport::{Peers, Transport};

/// How many Learn responses the proposer requires before it considers a round durable.
///
/// Defaults to `AllPeers`: a single unreachable learner fails the write. `Majority` is kept
/// available for a caller that prefers the textbook-Paxos tolerance instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearnPolicy {
    AllPeers,
    Majority,
}

impl LearnPolicy {
    pub fn required(&self, peers: &Peers) -> usize {
        match self {
            LearnPolicy::AllPeers => peers.all().len(),
            LearnPolicy::Majority => peers.quorum_size(),
        }
    }
}

pub struct Agent {
    pub peers: Peers,
    pub ballots: BallotAllocator,
    pub current: Mutex<PromiseStore>,
    pub completed: Mutex<PromiseStore>,
    pub ordered_rounds: Mutex<Vec<Prepare>>,
    pub transport: Arc<dyn Transport>,
    pub clock: Arc<dyn Clock>,
    pub learn_policy: LearnPolicy,
}

impl Agent {
    pub fn new(peers: Peers, transport: Arc<dyn Transport>, clock: Arc<dyn Clock>) -> Self {
        Agent {
            peers,
            ballots: BallotAllocator::new(),
            current: Mutex::new(PromiseStore::new()),
            completed: Mutex::new(PromiseStore::new()),
            ordered_rounds: Mutex::new(Vec::new()),
            transport,
            clock,
            learn_policy: LearnPolicy::AllPeers,
        }
    }

    pub fn with_learn_policy(mut self, policy: LearnPolicy) -> Self {
        self.learn_policy = policy;
        self
    }
}

#[cfg(test)]
pub mod tests_support {
    //! Shared test scaffolding: an in-memory `Transport` wiring a handful of `Agent`s directly
    //! to each other's handlers, without sockets. Used by `proposer`, `acceptor`, and `learner`
    //! tests to exercise the round-driving logic end to end.

    use super::*;
    use crate::acceptor::Acceptor;
    use crate::clock::Clock;
    use crate::learner::Learner;
    use crate::error::TransportError;
    use crate::message::{Accept, Learn, Prepare, Propose, Success};
    use crate::transport::{PeerAddr, PrepareOutcome, Transport};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    pub struct NoDelayClock;

    impl Clock for NoDelayClock {
        fn rpc_timeout(&self) -> Duration {
            Duration::from_secs(1)
        }
    }

    /// A transport that routes RPCs to the matching in-process `Agent`'s handler instead of a
    /// socket. The cluster is assembled by [`cluster`] below: every agent shares the same
    /// registry of peer handlers, keyed by `PeerAddr`.
    pub struct InMemoryTransport {
        agents: StdMutex<HashMap<PeerAddr, Arc<Agent>>>,
        /// Peers present in this set are treated as partitioned away: every RPC to them fails.
        pub unreachable: StdMutex<std::collections::HashSet<PeerAddr>>,
        /// Peers present in this set fail only `send_learn`, to simulate a peer that answers
        /// Prepare/Propose but drops off before acknowledging the commit.
        pub learn_unreachable: StdMutex<std::collections::HashSet<PeerAddr>>,
    }

    impl InMemoryTransport {
        pub fn new() -> Arc<Self> {
            Arc::new(InMemoryTransport {
                agents: StdMutex::new(HashMap::new()),
                unreachable: StdMutex::new(std::collections::HashSet::new()),
                learn_unreachable: StdMutex::new(std::collections::HashSet::new()),
            })
        }

        pub fn register(&self, addr: PeerAddr, agent: Arc<Agent>) {
            self.agents.lock().unwrap().insert(addr, agent);
        }

        fn agent_for(&self, peer: &PeerAddr) -> Result<Arc<Agent>, TransportError> {
            if self.unreachable.lock().unwrap().contains(peer) {
                // Status 0 never arises from a real HTTP response; it stands in for "no
                // connection" without requiring a live socket to manufacture a genuine
                // `reqwest::Error`.
                return Err(TransportError::UnexpectedStatus {
                    peer: peer.to_string(),
                    status: 0,
                });
            }
            self.agents
                .lock()
                .unwrap()
                .get(peer)
                .cloned()
                .ok_or_else(|| TransportError::UnexpectedStatus {
                    peer: peer.to_string(),
                    status: 404,
                })
        }
    }

    #[async_trait]
    impl Transport for InMemoryTransport {
        async fn send_prepare(
            &self,
            peer: &PeerAddr,
            prepare: Prepare,
            _timeout: Duration,
        ) -> Result<PrepareOutcome, TransportError> {
            let agent = self.agent_for(peer)?;
            let acceptor = Acceptor::new(&agent);
            Ok(acceptor.handle_prepare(prepare).into())
        }

        async fn send_propose(
            &self,
            peer: &PeerAddr,
            propose: Propose,
            _timeout: Duration,
        ) -> Result<Accept, TransportError> {
            let agent = self.agent_for(peer)?;
            let acceptor = Acceptor::new(&agent);
            Ok(acceptor.handle_propose(propose))
        }

        async fn send_learn(
            &self,
            peer: &PeerAddr,
            learn: Learn,
            _timeout: Duration,
        ) -> Result<Success, TransportError> {
            if self.learn_unreachable.lock().unwrap().contains(peer) {
                return Err(TransportError::UnexpectedStatus {
                    peer: peer.to_string(),
                    status: 0,
                });
            }
            let agent = self.agent_for(peer)?;
            let learner = Learner::new(&agent);
            Ok(learner.handle_learn(learn))
        }
    }
}
