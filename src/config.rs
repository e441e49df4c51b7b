//! Configuration loading: the peer roster and this agent's own identity, read from a TOML file
//! and overlaid with `PAXOS_`-prefixed environment variables.

use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::transport::PeerAddr;

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// This agent's own entry in `peers`, used to exclude self from quorums.
    pub self_id: u32,
    pub bind_host: String,
    pub bind_port: u16,
    pub peers: Vec<PeerAddr>,
    #[serde(default = "default_rpc_timeout_ms")]
    pub rpc_timeout_ms: u64,
}

fn default_rpc_timeout_ms() -> u64 {
    2_000
}

impl AgentConfig {
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.bind_port)
    }

    /// Loads `file_name` (a path without extension is fine; `config::File` infers the format),
    /// then overlays any `PAXOS_*` environment variables, e.g. `PAXOS_SELF_ID=1`.
    pub fn load(file_name: &str) -> Result<Self, config::ConfigError> {
        let raw = Config::builder()
            .add_source(File::with_name(file_name))
            .add_source(Environment::with_prefix("PAXOS").separator("_"))
            .build()?;
        raw.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_timeout_reads_the_configured_millis() {
        let config = AgentConfig {
            self_id: 0,
            bind_host: "127.0.0.1".into(),
            bind_port: 8000,
            peers: vec![],
            rpc_timeout_ms: 500,
        };
        assert_eq!(config.rpc_timeout(), Duration::from_millis(500));
    }

    #[test]
    fn bind_addr_combines_host_and_port() {
        let config = AgentConfig {
            self_id: 0,
            bind_host: "0.0.0.0".into(),
            bind_port: 8001,
            peers: vec![],
            rpc_timeout_ms: 500,
        };
        assert_eq!(config.bind_addr(), "0.0.0.0:8001");
    }
}
