use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// CLI/env configuration surface (spec §6). Parsing itself is out of scope
/// per spec §1 — this is deliberately a thin `clap` derive plus an
/// environment-variable overlay (every flag doubles as `CANARY_*`), not a
/// general layered-config engine.
#[derive(Parser, Debug, Clone)]
#[command(name = "canary-mesh", about = "peer-to-peer monitoring mesh agent")]
pub struct Config {
    /// Unique name for this agent across the mesh.
    #[arg(long, env = "CANARY_NAME")]
    pub name: String,

    /// host:port advertised to peers so they can dial us back.
    #[arg(long, env = "CANARY_JOIN_ADDRESS")]
    pub join_address: String,

    #[arg(long, env = "CANARY_LISTEN_ADDRESS", default_value = "0.0.0.0")]
    pub listen_address: String,

    #[arg(long, env = "CANARY_LISTEN_PORT", default_value_t = 9000)]
    pub listen_port: u16,

    /// Not served by this crate (spec's Operator API is out of scope); kept
    /// so downstream wiring has a stable place to advertise it.
    #[arg(long, env = "CANARY_API_PORT", default_value_t = 9001)]
    pub api_port: u16,

    /// Ordered list of peer targets to attempt at join. Empty is valid — an
    /// agent with no targets is a bootstrap node and simply stays in join
    /// mode until someone else joins it (spec §8 scenario 1).
    #[arg(long, env = "CANARY_TARGETS", value_delimiter = ',')]
    pub targets: Vec<String>,

    #[arg(long, env = "CANARY_TLS_SERVER_CERT")]
    pub tls_server_cert: Option<PathBuf>,
    #[arg(long, env = "CANARY_TLS_SERVER_KEY")]
    pub tls_server_key: Option<PathBuf>,
    #[arg(long, env = "CANARY_TLS_CA_CERT")]
    pub tls_ca_cert: Option<PathBuf>,
    #[arg(long, env = "CANARY_TLS_CLIENT_CERT")]
    pub tls_client_cert: Option<PathBuf>,
    #[arg(long, env = "CANARY_TLS_CLIENT_KEY")]
    pub tls_client_key: Option<PathBuf>,

    /// Bearer tokens for the (out-of-scope) operator API.
    #[arg(long, env = "CANARY_AUTH_TOKENS", value_delimiter = ',')]
    pub auth_tokens: Vec<String>,

    #[arg(long, env = "CANARY_REQUEST_TIMEOUT_MS", default_value_t = 2_000)]
    pub request_timeout_ms: u64,
    #[arg(long, env = "CANARY_JOIN_INTERVAL_MS", default_value_t = 5_000)]
    pub join_interval_ms: u64,
    #[arg(long, env = "CANARY_PING_INTERVAL_MS", default_value_t = 5_000)]
    pub ping_interval_ms: u64,
    #[arg(long, env = "CANARY_PING_RETRY_AMOUNT", default_value_t = 3)]
    pub ping_retry_amount: u32,
    #[arg(long, env = "CANARY_PING_RETRY_DELAY_MS", default_value_t = 1_000)]
    pub ping_retry_delay_ms: u64,
    #[arg(long, env = "CANARY_BROADCAST_TO_AMOUNT", default_value_t = 3)]
    pub broadcast_to_amount: usize,
    #[arg(long, env = "CANARY_PUSH_SAMPLE_INTERVAL_MS", default_value_t = 10_000)]
    pub push_sample_interval_ms: u64,
    #[arg(long, env = "CANARY_PUSH_SAMPLE_TO_AMOUNT", default_value_t = 3)]
    pub push_sample_to_amount: usize,
    #[arg(long, env = "CANARY_PUSH_SAMPLE_RETRY_AMOUNT", default_value_t = 3)]
    pub push_sample_retry_amount: u32,
    #[arg(long, env = "CANARY_PUSH_SAMPLE_RETRY_DELAY_MS", default_value_t = 1_000)]
    pub push_sample_retry_delay_ms: u64,
    #[arg(long, env = "CANARY_CLEANUP_INTERVAL_MS", default_value_t = 60_000)]
    pub cleanup_interval_ms: u64,
    #[arg(long, env = "CANARY_CLEANUP_MAX_AGE_SECS", default_value_t = 3_600)]
    pub cleanup_max_age_secs: u64,
    #[arg(long, env = "CANARY_RTT_INTERVAL_MS", default_value_t = 15_000)]
    pub rtt_interval_ms: u64,

    #[arg(long, env = "CANARY_CLEANUP_NODES", default_value_t = true, action = clap::ArgAction::Set)]
    pub cleanup_nodes: bool,
    #[arg(long, env = "CANARY_CLEANUP_SAMPLES", default_value_t = true, action = clap::ArgAction::Set)]
    pub cleanup_samples: bool,
    #[arg(long, env = "CANARY_DEBUG", default_value_t = false, action = clap::ArgAction::Set)]
    pub debug: bool,
    #[arg(long, env = "CANARY_DEBUG_RPC", default_value_t = false, action = clap::ArgAction::Set)]
    pub debug_rpc: bool,
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn ping_retry_delay(&self) -> Duration {
        Duration::from_millis(self.ping_retry_delay_ms)
    }

    pub fn push_sample_retry_delay(&self) -> Duration {
        Duration::from_millis(self.push_sample_retry_delay_ms)
    }

    pub fn cleanup_max_age(&self) -> Duration {
        Duration::from_secs(self.cleanup_max_age_secs)
    }
}
