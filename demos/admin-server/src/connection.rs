//! One admin connection on the server side.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use admin_rpc_core::{Channel, ClientProxy, DispatchError, Dispatcher, Handler, ServerProcedure};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::data::Directory;

/// Credentials for resuming a session, as presented in the handshake cookies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resume {
    pub name: String,
    pub key: String,
}

struct Account {
    key: String,
    holder: Option<(Uuid, mpsc::UnboundedSender<()>)>,
}

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<Directory>,
    password: Arc<str>,
    accounts: Arc<Mutex<HashMap<String, Account>>>,
}

impl AppState {
    #[must_use]
    pub fn new(directory: Directory, password: &str) -> Self {
        Self {
            directory: Arc::new(directory),
            password: Arc::from(password),
            accounts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Issue a fresh key for `name`. Any previous key stops working.
    fn issue_key(&self, name: &str) -> String {
        let key = Uuid::new_v4().simple().to_string();
        if let Ok(mut accounts) = self.accounts.lock() {
            accounts
                .entry(name.to_owned())
                .and_modify(|a| a.key.clone_from(&key))
                .or_insert_with(|| Account {
                    key: key.clone(),
                    holder: None,
                });
        }
        key
    }

    fn key_matches(&self, resume: &Resume) -> bool {
        self.accounts
            .lock()
            .map(|accounts| {
                accounts
                    .get(&resume.name)
                    .is_some_and(|a| a.key == resume.key)
            })
            .unwrap_or(false)
    }

    /// Make `connection` the live connection for `name`, signalling the
    /// previous holder that it has been replaced.
    fn take_over(&self, name: &str, connection: Uuid, replaced: mpsc::UnboundedSender<()>) {
        let Ok(mut accounts) = self.accounts.lock() else {
            return;
        };
        let Some(account) = accounts.get_mut(name) else {
            return;
        };
        if let Some((previous, signal)) = account.holder.replace((connection, replaced)) {
            if previous != connection {
                tracing::info!(%name, %previous, "Replacing older connection");
                let _ = signal.send(());
            }
        }
    }

    fn release(&self, name: &str, connection: Uuid) {
        if let Ok(mut accounts) = self.accounts.lock() {
            if let Some(account) = accounts.get_mut(name) {
                if account.holder.as_ref().is_some_and(|(id, _)| *id == connection) {
                    account.holder = None;
                }
            }
        }
    }
}

/// Server-side handler table for one connection.
struct ServerHandlers {
    id: Uuid,
    state: AppState,
    client: ClientProxy,
    user: Option<String>,
    replaced: mpsc::UnboundedSender<()>,
}

impl ServerHandlers {
    fn log_in(&mut self, name: &str) -> Result<(), DispatchError> {
        self.state.take_over(name, self.id, self.replaced.clone());
        self.user = Some(name.to_owned());
        self.client.group_list(self.state.directory.groups())
    }
}

impl Handler<ServerProcedure> for ServerHandlers {
    type Error = DispatchError;

    fn handle(&mut self, call: ServerProcedure) -> Result<(), DispatchError> {
        match call {
            ServerProcedure::Login { name, password } => {
                if *password != *self.state.password {
                    tracing::info!(%name, "Rejected login");
                    return self.client.login_prompt();
                }
                let key = self.state.issue_key(&name);
                self.client.set_cookie(&name, &key)?;
                self.log_in(&name)
            }
            ServerProcedure::ListGroups if self.user.is_some() => {
                self.client.group_list(self.state.directory.groups())
            }
            ServerProcedure::ShowSection { group, section } if self.user.is_some() => {
                match self.state.directory.section(&group, &section) {
                    Some(data) => self.client.students_list(
                        &group,
                        data.questions.clone(),
                        data.students.clone(),
                    ),
                    None => {
                        tracing::warn!(%group, %section, "No such section");
                        Ok(())
                    }
                }
            }
            ServerProcedure::ListGroups | ServerProcedure::ShowSection { .. } => {
                self.client.login_prompt()
            }
        }
    }
}

/// Serve one admin connection until it closes or is replaced.
pub async fn serve(mut channel: Channel, state: AppState, resume: Option<Resume>) {
    let id = Uuid::new_v4();
    let (replaced_tx, mut replaced_rx) = mpsc::unbounded_channel();
    let mut dispatcher = Dispatcher::new(ServerHandlers {
        id,
        state: state.clone(),
        client: ClientProxy::new(channel.outbox()),
        user: None,
        replaced: replaced_tx,
    });

    let greeting = match resume {
        Some(resume) if state.key_matches(&resume) => {
            tracing::info!(name = %resume.name, %id, "Resuming session");
            dispatcher.handler_mut().log_in(&resume.name)
        }
        _ => dispatcher.handler().client.login_prompt(),
    };
    if let Err(e) = greeting {
        tracing::warn!("Failed to greet connection {id}: {e}");
        return;
    }

    loop {
        tokio::select! {
            inbound = channel.recv() => match inbound {
                Some(raw) => {
                    dispatcher.on_message_logged(&raw);
                }
                None => break,
            },
            Some(()) = replaced_rx.recv() => {
                if let Err(e) = dispatcher.handler().client.connection_replaced() {
                    tracing::debug!(%id, "Replaced connection already gone: {e}");
                }
                break;
            }
        }
    }

    if let Some(name) = &dispatcher.handler().user {
        state.release(name, id);
    }
    tracing::info!(%id, calls = dispatcher.dispatched(), "Connection closed");
    drop(dispatcher);
    channel.close().await;
}

#[cfg(test)]
mod tests {
    use admin_rpc_core::CallMessage;
    use admin_rpc_transport::lines;
    use serde_json::json;
    use tokio::io::duplex;

    use super::*;

    fn call(raw: Option<String>) -> CallMessage {
        CallMessage::parse(&raw.unwrap()).unwrap()
    }

    fn send(channel: &Channel, procedure: &str, args: serde_json::Value) {
        channel
            .send(json!({ "procedure": procedure, "args": args }).to_string())
            .unwrap();
    }

    fn state() -> AppState {
        AppState::new(Directory::demo(), "pw")
    }

    #[tokio::test]
    async fn test_login_flow() {
        let (server_end, mut client) = Channel::pair();
        tokio::spawn(serve(server_end, state(), None));

        assert_eq!(call(client.recv().await).procedure, "login-prompt");

        send(&client, "login", json!(["ann", "wrong"]));
        assert_eq!(call(client.recv().await).procedure, "login-prompt");

        send(&client, "login", json!(["ann", "pw"]));
        let cookie = call(client.recv().await);
        assert_eq!(cookie.procedure, "set-cookie");
        assert_eq!(cookie.args[0], json!("ann"));
        assert_eq!(call(client.recv().await).procedure, "group-list");

        send(&client, "show-section", json!(["Math", "Algebra"]));
        let table = call(client.recv().await);
        assert_eq!(table.procedure, "students-list");
        assert_eq!(table.args[0], json!("Math"));
    }

    #[tokio::test]
    async fn test_requests_before_login_get_prompt() {
        let (server_end, mut client) = Channel::pair();
        tokio::spawn(serve(server_end, state(), None));
        assert_eq!(call(client.recv().await).procedure, "login-prompt");

        send(&client, "list-groups", json!([]));
        assert_eq!(call(client.recv().await).procedure, "login-prompt");
    }

    #[tokio::test]
    async fn test_second_login_replaces_first() {
        let state = state();
        let (first_end, mut first) = Channel::pair();
        let (second_end, mut second) = Channel::pair();
        tokio::spawn(serve(first_end, state.clone(), None));
        tokio::spawn(serve(second_end, state.clone(), None));

        first.recv().await;
        send(&first, "login", json!(["ann", "pw"]));
        let key = call(first.recv().await).args[1].clone();
        first.recv().await;

        second.recv().await;
        send(&second, "login", json!(["ann", "pw"]));
        assert_eq!(call(second.recv().await).procedure, "set-cookie");

        assert_eq!(call(first.recv().await).procedure, "connection-replaced");
        assert!(first.recv().await.is_none());

        // The first key no longer resumes.
        let resume = Resume {
            name: "ann".into(),
            key: key.as_str().unwrap().to_owned(),
        };
        assert!(!state.key_matches(&resume));
    }

    /// Serve over a byte stream; returns the client's end.
    fn serve_over_lines(state: &AppState) -> Channel {
        let (client_io, server_io) = duplex(64 * 1024);
        let (reader, writer) = tokio::io::split(server_io);
        tokio::spawn(serve(lines::spawn(reader, writer), state.clone(), None));
        let (reader, writer) = tokio::io::split(client_io);
        lines::spawn(reader, writer)
    }

    #[tokio::test]
    async fn test_replacement_notice_crosses_a_stream() {
        let state = state();
        let mut first = serve_over_lines(&state);
        let mut second = serve_over_lines(&state);

        assert_eq!(call(first.recv().await).procedure, "login-prompt");
        send(&first, "login", json!(["ann", "pw"]));
        assert_eq!(call(first.recv().await).procedure, "set-cookie");
        assert_eq!(call(first.recv().await).procedure, "group-list");

        assert_eq!(call(second.recv().await).procedure, "login-prompt");
        send(&second, "login", json!(["ann", "pw"]));
        assert_eq!(call(second.recv().await).procedure, "set-cookie");

        assert_eq!(call(first.recv().await).procedure, "connection-replaced");
        assert!(first.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_resume_with_cookie() {
        let state = state();
        let key = state.issue_key("ann");
        let (server_end, mut client) = Channel::pair();
        tokio::spawn(serve(
            server_end,
            state,
            Some(Resume {
                name: "ann".into(),
                key,
            }),
        ));

        assert_eq!(call(client.recv().await).procedure, "group-list");
    }
}
