//! The learner role: records a learned round and appends it to the ordered commit log.
//!
//! Recording is unconditional: whatever ballot the proposer decided to propose, this agent
//! records into `completed` and appends to `ordered_rounds`, then responds `Success`. The
//! learner does no vote counting of its own; the proposer is the one that requires every peer
//! to acknowledge before treating a round as durable.

use crate::agent::Agent;
use crate::message::{Learn, Promise, Success};

pub struct Learner<'a> {
    agent: &'a Agent,
}

impl<'a> Learner<'a> {
    pub fn new(agent: &'a Agent) -> Self {
        Learner { agent }
    }

    pub fn handle_learn(&self, learn: Learn) -> Success {
        log::info!(
            "learning key={} id={}",
            learn.prepare.key,
            learn.prepare.id
        );
        {
            let mut completed = self.agent.completed.lock().unwrap();
            completed.add(Promise::of(learn.prepare.clone()));
        }
        self.agent.ordered_rounds.lock().unwrap().push(learn.prepare.clone());
        Success::new(learn.prepare)
    }
}
