//! A replicated single-value register agreed upon by a cluster of agents using a Paxos-style
//! consensus protocol, exposed over HTTP.

pub mod acceptor;
pub mod agent;
pub mod ballot;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod learner;
pub mod message;
pub mod proposer;
pub mod store;
pub mod transport;
