//! The error taxonomy the core distinguishes, plus its mapping onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// A failure at the transport boundary: the peer could not be reached, didn't answer in time,
/// or answered with a status code this RPC kind never expects. The proposer's quorum/all-peer
/// counting treats every variant as a *failed* response, never *issued*, never *conflicting*.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection to {peer} refused or reset: {source}")]
    ConnectionFailed {
        peer: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("rpc to {peer} exceeded its deadline of {timeout_ms}ms")]
    DeadlineExceeded { peer: String, timeout_ms: u64 },

    #[error("peer {peer} returned unexpected status {status}")]
    UnexpectedStatus { peer: String, status: u16 },

    #[error("malformed response body from {peer}: {source}")]
    MalformedBody {
        peer: String,
        #[source]
        source: reqwest::Error,
    },
}

/// The client-visible (and internally propagated) failure modes of the core.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Fewer than a quorum of acceptors issued a Promise at Prepare.
    #[error("failed to acquire a quorum of promises: got {obtained}/{required}")]
    QuorumUnavailable { obtained: usize, required: usize },

    /// Fewer than the full roster returned Success at Learn.
    #[error("failed to acquire all-peer consensus on learn: got {obtained}/{required}")]
    LearnShortfall { obtained: usize, required: usize },

    /// A peer RPC failed outright (refused, timed out, or answered unexpectedly).
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AgentError {
    fn into_response(self) -> Response {
        log::error!("request failed: {self}");
        let body = Json(ErrorBody {
            error: self.to_string(),
        });
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}
