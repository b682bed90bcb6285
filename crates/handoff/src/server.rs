//! `HandoffServer` builder and server loop.
//!
//! This is the entry point for running a handoff server. It ties together
//! all the layers: transport → protocol → session → HTTP routes.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use handoff_protocol::JsonCodec;
use handoff_session::{ActiveSessionRegistry, CredentialHasher, TokenStore, UserDirectory};
use handoff_transport::TransportError;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::config::ServerConfig;
use crate::routes;
use crate::HandoffError;

/// Shared server state handed to every request and connection task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. Each store
/// carries its own lock.
pub(crate) struct ServerState {
    pub(crate) users: UserDirectory,
    pub(crate) tokens: TokenStore,
    pub(crate) sessions: Arc<ActiveSessionRegistry>,
    pub(crate) codec: JsonCodec,
    /// `ws://host:port`, the prefix of every connect URL.
    pub(crate) connect_base: String,
    /// Flipped to `true` once; every echo loop watches it.
    pub(crate) shutdown: watch::Sender<bool>,
}

/// Builder for configuring and starting a handoff server.
///
/// # Example
///
/// ```rust,no_run
/// use handoff::prelude::*;
///
/// # async fn start() -> Result<(), HandoffError> {
/// let server = HandoffServer::builder()
///     .bind("0.0.0.0:3000")
///     .public_host("example.com")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct HandoffServerBuilder {
    bind_addr: String,
    public_host: String,
    hasher: CredentialHasher,
}

impl HandoffServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            public_host: "localhost".to_string(),
            hasher: CredentialHasher::default(),
        }
    }

    /// Takes the bind address and public host from a parsed config.
    pub fn configure(self, config: &ServerConfig) -> Self {
        self.bind(&config.bind_addr()).public_host(&config.base_url)
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the host name written into connect URLs.
    pub fn public_host(mut self, host: &str) -> Self {
        self.public_host = host.to_string();
        self
    }

    /// Sets the credential hasher used for new registrations.
    pub fn credential_hasher(mut self, hasher: CredentialHasher) -> Self {
        self.hasher = hasher;
        self
    }

    /// Binds the listener and assembles the server state.
    ///
    /// Connect URLs use the port actually bound, so binding port 0 still
    /// hands out working URLs.
    ///
    /// # Errors
    /// [`TransportError::BindFailed`] if the address cannot be bound.
    pub async fn build(self) -> Result<HandoffServer, HandoffError> {
        let listener = TcpListener::bind(&self.bind_addr)
            .await
            .map_err(TransportError::BindFailed)?;
        let local_addr = listener.local_addr().map_err(TransportError::BindFailed)?;

        let (shutdown, _) = watch::channel(false);
        let state = Arc::new(ServerState {
            users: UserDirectory::with_hasher(self.hasher),
            tokens: TokenStore::new(),
            sessions: Arc::new(ActiveSessionRegistry::new()),
            codec: JsonCodec,
            connect_base: format!("ws://{}:{}", self.public_host, local_addr.port()),
            shutdown,
        });

        tracing::info!(%local_addr, connect_base = %state.connect_base, "server bound");
        Ok(HandoffServer { listener, state })
    }
}

impl Default for HandoffServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound handoff server.
///
/// Call [`run()`](Self::run) or [`run_until()`](Self::run_until) to start
/// serving.
pub struct HandoffServer {
    listener: TcpListener,
    state: Arc<ServerState>,
}

impl HandoffServer {
    /// Creates a new builder.
    pub fn builder() -> HandoffServerBuilder {
        HandoffServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// The `ws://host:port` prefix of the connect URLs this server hands out.
    pub fn connect_base(&self) -> &str {
        &self.state.connect_base
    }

    /// A router over this server's state.
    ///
    /// Requests sent through it (for example with `tower::ServiceExt::oneshot`)
    /// see the same users, tokens, and sessions as the listener.
    pub fn router(&self) -> Router {
        routes::router(Arc::clone(&self.state))
    }

    /// Serves until the process is terminated.
    pub async fn run(self) -> Result<(), HandoffError> {
        self.run_until(std::future::pending()).await
    }

    /// Serves until `signal` resolves, then shuts down gracefully.
    ///
    /// On shutdown the listener stops accepting, every live connection is
    /// closed by the server, and each one leaves the active list as its
    /// loop exits.
    pub async fn run_until<F>(self, signal: F) -> Result<(), HandoffError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = routes::router(Arc::clone(&self.state));
        let state = self.state;
        tracing::info!("handoff server running");

        axum::serve(self.listener, app)
            .with_graceful_shutdown(async move {
                signal.await;
                tracing::info!(
                    live = state.sessions.len(),
                    "shutdown requested, closing live connections"
                );
                state.shutdown.send_replace(true);
            })
            .await?;

        tracing::info!("handoff server stopped");
        Ok(())
    }
}
