//! Transport + Peers (component D): the roster of peer addresses, quorum selection, and the
//! pluggable RPC boundary the core depends on.
//!
//! The core never talks to a socket directly. It depends on the [`Transport`] trait, whose
//! production implementation is [`HttpTransport`]; tests substitute an in-memory transport that
//! calls a peer `Agent`'s handlers directly (see `crate::proposer::tests`).

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;
use crate::message::{Accept, Learn, Prepare, Promise, Propose, Success};

/// One member of the peer roster, including this agent itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerAddr {
    pub id: u32,
    pub host: String,
    pub port: u16,
}

impl PeerAddr {
    pub fn new(id: u32, host: impl Into<String>, port: u16) -> Self {
        PeerAddr {
            id,
            host: host.into(),
            port,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl fmt::Display for PeerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// The full cluster roster, with this agent's own address distinguished so it can be excluded
/// from quorums and included in all-peer fan-out (Learn goes to every peer, including self,
/// addressed the same way as any other peer).
#[derive(Debug, Clone)]
pub struct Peers {
    all: Vec<PeerAddr>,
    self_addr: PeerAddr,
}

impl Peers {
    pub fn new(all: Vec<PeerAddr>, self_id: u32) -> Self {
        let self_addr = all
            .iter()
            .find(|peer| peer.id == self_id)
            .cloned()
            .expect("self_id must name an entry in the peer roster");
        Peers { all, self_addr }
    }

    /// `floor(N/2) + 1`, where `N` is the full roster size (self included).
    pub fn quorum_size(&self) -> usize {
        self.all.len() / 2 + 1
    }

    /// A randomly chosen quorum of peers, excluding self.
    pub fn quorum(&self) -> Vec<PeerAddr> {
        let mut others: Vec<PeerAddr> = self
            .all
            .iter()
            .filter(|peer| **peer != self.self_addr)
            .cloned()
            .collect();
        others.shuffle(&mut rand::thread_rng());
        others.truncate(self.quorum_size());
        others
    }

    /// The full roster, including self.
    pub fn all(&self) -> &[PeerAddr] {
        &self.all
    }

    pub fn self_addr(&self) -> &PeerAddr {
        &self.self_addr
    }
}

/// The classification of a Prepare response: `200` is *issued* (a fresh Promise or a
/// RepairHint, disambiguated by whether `prepare` is set), `400` is *conflicting* (the acceptor
/// already holds a higher-or-equal promise).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrepareOutcome {
    Issued(Promise),
    Conflicting(Promise),
}

/// The RPC boundary the core depends on. Every method carries its own deadline so a stalled
/// peer degrades into a classified *failed* response rather than blocking a round forever.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_prepare(
        &self,
        peer: &PeerAddr,
        prepare: Prepare,
        timeout: Duration,
    ) -> Result<PrepareOutcome, TransportError>;

    async fn send_propose(
        &self,
        peer: &PeerAddr,
        propose: Propose,
        timeout: Duration,
    ) -> Result<Accept, TransportError>;

    async fn send_learn(
        &self,
        peer: &PeerAddr,
        learn: Learn,
        timeout: Duration,
    ) -> Result<Success, TransportError>;
}

/// The production `Transport`, built on a shared `reqwest::Client` so connections are pooled
/// across RPCs to the same peer.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport {
    pub fn new() -> Self {
        HttpTransport {
            client: reqwest::Client::new(),
        }
    }

    async fn post<Req: Serialize, Resp: for<'de> Deserialize<'de>>(
        &self,
        peer: &PeerAddr,
        path: &str,
        body: &Req,
        timeout: Duration,
        expected_statuses: &[u16],
    ) -> Result<(u16, Resp), TransportError> {
        let url = format!("{}{}", peer.base_url(), path);
        let send = self.client.post(&url).json(body).send();

        let response = tokio::time::timeout(timeout, send)
            .await
            .map_err(|_| TransportError::DeadlineExceeded {
                peer: peer.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })?
            .map_err(|source| TransportError::ConnectionFailed {
                peer: peer.to_string(),
                source,
            })?;

        let status = response.status().as_u16();
        if !expected_statuses.contains(&status) {
            return Err(TransportError::UnexpectedStatus {
                peer: peer.to_string(),
                status,
            });
        }

        let parsed = response
            .json::<Resp>()
            .await
            .map_err(|source| TransportError::MalformedBody {
                peer: peer.to_string(),
                source,
            })?;
        Ok((status, parsed))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send_prepare(
        &self,
        peer: &PeerAddr,
        prepare: Prepare,
        timeout: Duration,
    ) -> Result<PrepareOutcome, TransportError> {
        let (status, promise): (u16, Promise) = self
            .post(peer, "/prepare", &prepare, timeout, &[200, 400])
            .await?;
        Ok(if status == 400 {
            PrepareOutcome::Conflicting(promise)
        } else {
            PrepareOutcome::Issued(promise)
        })
    }

    async fn send_propose(
        &self,
        peer: &PeerAddr,
        propose: Propose,
        timeout: Duration,
    ) -> Result<Accept, TransportError> {
        let (_, accept) = self
            .post(peer, "/propose", &propose, timeout, &[200])
            .await?;
        Ok(accept)
    }

    async fn send_learn(
        &self,
        peer: &PeerAddr,
        learn: Learn,
        timeout: Duration,
    ) -> Result<Success, TransportError> {
        let (_, success) = self.post(peer, "/learn", &learn, timeout, &[200]).await?;
        Ok(success)
    }
}
