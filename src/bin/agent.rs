//! The `agent` binary: loads configuration, constructs one `Agent` combining the proposer,
//! acceptor, and learner roles, and serves the HTTP surface.
//!
//! Run as:
//!     RUST_LOG=paxos_register=info cargo run --bin agent -- --config Config

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use paxos_register::agent::Agent;
use paxos_register::clock::SystemClock;
use paxos_register::config::AgentConfig;
use paxos_register::http::build_router;
use paxos_register::transport::{HttpTransport, Peers};

#[derive(Parser, Debug)]
#[command(author, version, about = "A Paxos-style replicated single-value register agent")]
struct Args {
    /// Path to the TOML config file, without extension (e.g. `Config` for `Config.toml`).
    #[arg(long, default_value = "Config")]
    config: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let config = match AgentConfig::load(&args.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load configuration from {}: {err}", args.config);
            return ExitCode::FAILURE;
        }
    };

    let bind_addr = config.bind_addr();
    let peers = Peers::new(config.peers.clone(), config.self_id);
    let clock = Arc::new(SystemClock::new(config.rpc_timeout()));
    let transport = Arc::new(HttpTransport::new());
    let agent = Arc::new(Agent::new(peers, transport, clock));

    log::info!("agent {} listening on {}", config.self_id, bind_addr);
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            eprintln!("failed to bind {bind_addr}: {err}");
            return ExitCode::FAILURE;
        }
    };

    let router = build_router(agent);
    if let Err(err) = axum::serve(listener, router).await {
        eprintln!("server error: {err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
