//! The axum HTTP surface: one router exposing every RPC endpoint an agent answers, backed by a
//! shared `Arc<Agent>`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::acceptor::Acceptor;
use crate::agent::Agent;
use crate::error::AgentError;
use crate::learner::Learner;
use crate::message::{Accept, Learn, Prepare, Promise, Propose, Success, WriteRequest};
use crate::proposer::Proposer;

pub fn build_router(agent: Arc<Agent>) -> Router {
    Router::new()
        .route("/write", post(write_handler))
        .route("/read", get(read_handler))
        .route("/prepare", post(prepare_handler))
        .route("/propose", post(propose_handler))
        .route("/learn", post(learn_handler))
        .route("/health", get(health_handler))
        .with_state(agent)
}

async fn write_handler(
    State(agent): State<Arc<Agent>>,
    Json(request): Json<WriteRequest>,
) -> Result<Json<Success>, AgentError> {
    let success = Proposer::new(agent).propose(request).await?;
    Ok(Json(success))
}

/// Dumps `ordered_rounds` as newline-delimited JSON: one committed `Prepare` per line, in this
/// agent's own observed commit order.
async fn read_handler(State(agent): State<Arc<Agent>>) -> String {
    let rounds = agent.ordered_rounds.lock().unwrap();
    rounds
        .iter()
        .map(|prepare| serde_json::to_string(prepare).expect("Prepare always serializes"))
        .collect::<Vec<_>>()
        .join("\n")
}

async fn prepare_handler(
    State(agent): State<Arc<Agent>>,
    Json(prepare): Json<Prepare>,
) -> (StatusCode, Json<Promise>) {
    let decision = Acceptor::new(&agent).handle_prepare(prepare);
    let status =
        StatusCode::from_u16(decision.status_code()).expect("status_code is always a valid code");
    (status, Json(decision.into_promise()))
}

async fn propose_handler(
    State(agent): State<Arc<Agent>>,
    Json(propose): Json<Propose>,
) -> Json<Accept> {
    Json(Acceptor::new(&agent).handle_propose(propose))
}

async fn learn_handler(State(agent): State<Arc<Agent>>, Json(learn): Json<Learn>) -> Json<Success> {
    Json(Learner::new(&agent).handle_learn(learn))
}

async fn health_handler() -> StatusCode {
    StatusCode::OK
}
