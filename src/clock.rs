//! The `Clock` adapter: the single knob controlling how long the proposer waits for a peer RPC
//! before treating it as failed. Kept as a trait so tests can swap in a clock with a tiny
//! timeout to exercise the deadline path deterministically.

use std::time::Duration;

pub trait Clock: Send + Sync {
    fn rpc_timeout(&self) -> Duration;
}

/// Reads the timeout from [`crate::config::AgentConfig`] at construction time.
pub struct SystemClock {
    rpc_timeout: Duration,
}

impl SystemClock {
    pub fn new(rpc_timeout: Duration) -> Self {
        SystemClock { rpc_timeout }
    }
}

impl Clock for SystemClock {
    fn rpc_timeout(&self) -> Duration {
        self.rpc_timeout
    }
}
