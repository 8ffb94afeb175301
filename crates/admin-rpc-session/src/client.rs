//! The admin client: runs sessions back to back.

use admin_rpc_core::{Channel, SessionError};
use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use crate::{
    cookie,
    handlers::AdminHandlers,
    session::{Command, Session},
    view::View,
};

/// Client error.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Connect failed: {0}")]
    Connect(String),
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Opens a new transport channel for each session.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect, presenting the stored cookies (a `Cookie` header value).
    async fn connect(&self, cookie: Option<String>) -> Result<Channel, ClientError>;
}

/// Tells the operator about session-level events.
pub trait Notifier: Send + Sync {
    /// This session was taken over by a login elsewhere.
    fn session_superseded(&self);
}

/// Logs notices through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn session_superseded(&self) {
        tracing::warn!("The connection was taken over by a newer login");
    }
}

/// Connects over WebSocket.
#[cfg(feature = "websocket")]
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    url: String,
}

#[cfg(feature = "websocket")]
impl WebSocketConnector {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[cfg(feature = "websocket")]
#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, cookie: Option<String>) -> Result<Channel, ClientError> {
        admin_rpc_transport::connect(&self.url, cookie.as_deref())
            .await
            .map_err(|e| ClientError::Connect(e.to_string()))
    }
}

/// Admin client.
///
/// Owns the handler table between sessions. A `connection-replaced` from the
/// server notifies the operator and starts a fresh session with a reset view;
/// a lost transport ends `run` with an error and is not retried.
pub struct AdminClient<C> {
    connector: C,
    notifier: Box<dyn Notifier>,
    handlers: Option<AdminHandlers>,
    sessions: u64,
}

impl<C: Connector> AdminClient<C> {
    /// Create a new client.
    #[must_use]
    pub fn new(connector: C, handlers: AdminHandlers) -> Self {
        Self {
            connector,
            notifier: Box::new(LogNotifier),
            handlers: Some(handlers),
            sessions: 0,
        }
    }

    /// Replace the notifier.
    #[must_use]
    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    /// Subscribe to the visible view. Survives session replacement.
    ///
    /// Returns `None` while `run` is in progress.
    #[must_use]
    pub fn subscribe(&self) -> Option<watch::Receiver<Option<View>>> {
        self.handlers.as_ref().map(AdminHandlers::subscribe)
    }

    /// Number of sessions started so far.
    #[must_use]
    pub const fn sessions(&self) -> u64 {
        self.sessions
    }

    /// Run sessions until the user quits (the command stream closes) or the
    /// transport is lost.
    ///
    /// # Errors
    /// Returns error if connecting fails or the transport is lost.
    pub async fn run(
        &mut self,
        commands: &mut mpsc::UnboundedReceiver<Command>,
    ) -> Result<(), ClientError> {
        loop {
            let Some(mut handlers) = self.handlers.take() else {
                return Err(ClientError::Connect("client already running".into()));
            };
            handlers.reset();

            let cookie = cookie::request_header(handlers.cookies()).unwrap_or_else(|e| {
                tracing::warn!("Ignoring stored cookies: {e}");
                None
            });
            let channel = match self.connector.connect(cookie).await {
                Ok(channel) => channel,
                Err(e) => {
                    self.handlers = Some(handlers);
                    return Err(e);
                }
            };

            self.sessions += 1;
            tracing::info!(session = self.sessions, "Session started");
            let mut session = Session::new(channel, handlers);
            let outcome = session.run(commands).await;
            self.handlers = Some(session.into_handlers());

            match outcome {
                Ok(()) => return Ok(()),
                Err(SessionError::Superseded) => {
                    self.notifier.session_superseded();
                }
                Err(e @ SessionError::TransportLost) => return Err(e.into()),
            }
        }
    }
}
