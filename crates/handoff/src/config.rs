//! Process configuration: command-line flags with environment fallbacks.

use clap::Parser;

/// Server configuration.
///
/// Every flag can also come from the environment, so the server runs
/// unmodified under a process manager that only sets `PORT`.
#[derive(Debug, Clone, Parser)]
#[command(name = "handoff", version, about = "Login-token to live-connection handoff server")]
pub struct ServerConfig {
    /// Interface to listen on.
    #[arg(long, env = "BIND_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on. Also used in the connect URLs handed out at login.
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Host name written into connect URLs.
    #[arg(long, env = "BASE_URL", default_value = "localhost")]
    pub base_url: String,
}

impl ServerConfig {
    /// The `host:port` pair to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
