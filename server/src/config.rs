//! Process-level configuration, sourced from CLI flags or environment
//! variables (`POKER_PORT`, `POKER_CLIENT_ORIGIN`, `POKER_LOG`,
//! `POKER_REAP_INTERVAL_SECS`).

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "holdem-server", about = "Server-authoritative Texas Hold'em table host")]
pub struct ServerConfig {
    /// TCP port to bind the websocket/HTTP listener to.
    #[arg(long, env = "POKER_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Origin allowed to open cross-origin requests (CORS) against this
    /// server. Pass "*" to allow any origin, useful for local development.
    #[arg(long, env = "POKER_CLIENT_ORIGIN", default_value = "http://localhost:5173")]
    pub client_origin: String,

    /// `tracing_subscriber::EnvFilter` directive, e.g. "info" or
    /// "holdem_server=debug,holdem_engine=info".
    #[arg(long, env = "POKER_LOG", default_value = "info")]
    pub log: String,

    /// Directory of static files to serve alongside the websocket endpoint
    /// (a built client bundle). Omit to run the API with no static serving.
    #[arg(long, env = "POKER_STATIC_DIR")]
    pub static_dir: Option<String>,

    /// How often the empty-table reaper scans the registry, in seconds.
    /// Defaults to 5 minutes.
    #[arg(long, env = "POKER_REAP_INTERVAL_SECS", default_value_t = 300)]
    pub reap_interval_secs: u64,
}
