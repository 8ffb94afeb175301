//! One live connection to the server and its state.

use admin_rpc_core::{
    Channel, ClientProcedure, DispatchError, Dispatcher, ServerProxy, SessionError,
};
use tokio::sync::mpsc;

use crate::{handlers::AdminHandlers, view::SectionLink};

/// A user action. User actions never change the view directly; they call the
/// server and wait for its next push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Submit the login form.
    Login { name: String, password: String },
    /// Open a section from the group list.
    OpenSection(SectionLink),
    /// Back from the student table to the group list.
    Back,
}

/// A client session.
///
/// Owns the transport channel, the only dispatcher (and through it the
/// handler table) and the only proxy on the server. Everything runs on the
/// task that calls `run`, so no locking is needed.
pub struct Session {
    channel: Channel,
    dispatcher: Dispatcher<ClientProcedure, AdminHandlers>,
    server: ServerProxy,
}

impl Session {
    /// Start a session over a connected channel.
    #[must_use]
    pub fn new(channel: Channel, handlers: AdminHandlers) -> Self {
        let server = ServerProxy::new(channel.outbox());
        Self {
            channel,
            dispatcher: Dispatcher::new(handlers),
            server,
        }
    }

    /// The proxy on the server.
    #[must_use]
    pub const fn server(&self) -> &ServerProxy {
        &self.server
    }

    #[must_use]
    pub const fn handlers(&self) -> &AdminHandlers {
        self.dispatcher.handler()
    }

    /// End the session, keeping the handler table for the next one.
    #[must_use]
    pub fn into_handlers(self) -> AdminHandlers {
        self.dispatcher.into_handler()
    }

    /// # Errors
    /// Returns error if the transport is gone.
    pub fn submit_login(&self, name: &str, password: &str) -> Result<(), DispatchError> {
        self.server.login(name, password)
    }

    /// # Errors
    /// Returns error if the transport is gone.
    pub fn open_section(&self, link: &SectionLink) -> Result<(), DispatchError> {
        self.server.show_section(&link.group, &link.section)
    }

    /// # Errors
    /// Returns error if the transport is gone.
    pub fn go_back(&self) -> Result<(), DispatchError> {
        self.server.list_groups()
    }

    /// Apply a user action.
    ///
    /// # Errors
    /// Returns error if the transport is gone.
    pub fn perform(&self, command: &Command) -> Result<(), DispatchError> {
        match command {
            Command::Login { name, password } => self.submit_login(name, password),
            Command::OpenSection(link) => self.open_section(link),
            Command::Back => self.go_back(),
        }
    }

    /// Handle one inbound message. Bad messages are logged and discarded.
    ///
    /// # Errors
    /// Returns `SessionError::Superseded` once the server has replaced this
    /// connection.
    pub fn handle_message(&mut self, raw: &str) -> Result<(), SessionError> {
        self.dispatcher.on_message_logged(raw);
        if self.handlers().is_superseded() {
            return Err(SessionError::Superseded);
        }
        Ok(())
    }

    /// Process inbound calls and user commands until the session ends.
    ///
    /// Returns `Ok(())` when the command stream closes (the user quit).
    ///
    /// # Errors
    /// Returns `Superseded` or `TransportLost`; either ends the session.
    pub async fn run(
        &mut self,
        commands: &mut mpsc::UnboundedReceiver<Command>,
    ) -> Result<(), SessionError> {
        loop {
            tokio::select! {
                biased;
                inbound = self.channel.recv() => match inbound {
                    Some(raw) => self.handle_message(&raw)?,
                    None => {
                        tracing::warn!("Transport lost");
                        return Err(SessionError::TransportLost);
                    }
                },
                command = commands.recv() => match command {
                    Some(command) => {
                        if self.perform(&command).is_err() {
                            return Err(SessionError::TransportLost);
                        }
                    }
                    None => return Ok(()),
                },
            }
        }
    }
}
