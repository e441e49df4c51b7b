//! The proposer role: the round-driving state machine that turns a client write into a
//! learned round, handling conflict retries and repair of an earlier pending round along the
//! way.
//!
//! Drives a FIFO of pending Prepares against a quorum fixed for the whole request, retrying a
//! conflicting ballot with a bumped one, and finishing someone else's pending round before
//! resuming its own whenever a repair opportunity shows up.

use std::collections::VecDeque;
use std::sync::Arc;

use futures::future::join_all;

use crate::agent::Agent;
use crate::error::AgentError;
use crate::message::{Learn, Prepare, Promise, Propose, Success, WriteRequest};
use crate::transport::PrepareOutcome;

pub struct Proposer {
    agent: Arc<Agent>,
}

impl Proposer {
    pub fn new(agent: Arc<Agent>) -> Self {
        Proposer { agent }
    }

    /// Drives `request` to a learned round. Returns the committed [`Success`], or the first
    /// quorum/learn failure encountered: the client sees exactly one outcome per `/write`.
    pub async fn propose(&self, request: WriteRequest) -> Result<Success, AgentError> {
        let agent = &self.agent;
        let timeout = agent.clock.rpc_timeout();
        let quorum = agent.peers.quorum();
        let quorum_size = quorum.len();

        let original = Prepare::new(
            agent.ballots.next(),
            request.key,
            request.predicate,
            request.argument,
        );
        agent
            .current
            .lock()
            .unwrap()
            .add(Promise::of(original.clone()));

        let mut queue: VecDeque<Prepare> = VecDeque::new();
        queue.push_back(original.clone());
        let mut last_success: Option<Success> = None;

        while let Some(mut prepare) = queue.pop_front() {
            loop {
                let responses = join_all(quorum.iter().map(|peer| {
                    let transport = agent.transport.clone();
                    let prepare = prepare.clone();
                    async move { transport.send_prepare(peer, prepare, timeout).await }
                }))
                .await;

                let mut issued = Vec::new();
                let mut conflicting = Vec::new();
                for response in responses {
                    match response {
                        Ok(PrepareOutcome::Issued(promise)) => issued.push(promise),
                        Ok(PrepareOutcome::Conflicting(promise)) => conflicting.push(promise),
                        Err(err) => log::warn!("prepare rpc failed: {err}"),
                    }
                }

                if !conflicting.is_empty() {
                    // Some acceptor already holds a higher ballot. Bump past the highest one
                    // observed and retry this same queue item with a fresh ballot.
                    let highest_observed = conflicting
                        .iter()
                        .filter_map(|p| p.prepare.as_ref().map(|inner| inner.id))
                        .max()
                        .unwrap_or(prepare.id);
                    log::warn!(
                        "prepare for key={} id={} was pre-empted by ballot {}; retrying",
                        prepare.key,
                        prepare.id,
                        highest_observed
                    );
                    agent.ballots.bump(highest_observed);
                    prepare = Prepare::new(
                        agent.ballots.next(),
                        prepare.key.clone(),
                        prepare.predicate.clone(),
                        prepare.argument.clone(),
                    );
                    continue;
                }

                if issued.len() < quorum_size {
                    return Err(AgentError::QuorumUnavailable {
                        obtained: issued.len(),
                        required: quorum_size,
                    });
                }

                // Repair: find the highest-ballot promise among the responses that wraps a
                // *different* round than the one we're driving.
                let earlier = issued
                    .iter()
                    .filter(|promise| {
                        promise
                            .prepare
                            .as_ref()
                            .map(|inner| inner.key != prepare.key || inner.id != prepare.id)
                            .unwrap_or(false)
                    })
                    .max_by_key(|promise| promise.slot().1)
                    .cloned();

                if let Some(earlier_promise) = earlier {
                    let already_tracked = agent.current.lock().unwrap().contains(&earlier_promise);
                    if !already_tracked {
                        let earlier_prepare = earlier_promise
                            .prepare
                            .clone()
                            .expect("filtered to promises carrying a prepare above");
                        queue.push_back(prepare);
                        prepare = earlier_prepare;
                    }
                }

                // Propose.
                let accept_responses = join_all(quorum.iter().map(|peer| {
                    let transport = agent.transport.clone();
                    let propose = Propose {
                        prepare: prepare.clone(),
                    };
                    async move { transport.send_propose(peer, propose, timeout).await }
                }))
                .await;
                let accepted = accept_responses.iter().filter(|r| r.is_ok()).count();
                if accepted < quorum_size {
                    return Err(AgentError::QuorumUnavailable {
                        obtained: accepted,
                        required: quorum_size,
                    });
                }

                // Learn, fanned out to the full roster including self.
                let all_peers = agent.peers.all();
                let required = agent.learn_policy.required(&agent.peers);
                let learn_responses = join_all(all_peers.iter().map(|peer| {
                    let transport = agent.transport.clone();
                    let learn = Learn {
                        prepare: prepare.clone(),
                    };
                    async move { transport.send_learn(peer, learn, timeout).await }
                }))
                .await;
                let successes = learn_responses.into_iter().filter(|r| r.is_ok()).count();
                if successes < required {
                    return Err(AgentError::LearnShortfall {
                        obtained: successes,
                        required,
                    });
                }

                last_success = Some(Success::new(prepare));
                break;
            }
        }

        agent.current.lock().unwrap().remove(&original);
        last_success.ok_or(AgentError::QuorumUnavailable {
            obtained: 0,
            required: quorum_size,
        })
    }
}
