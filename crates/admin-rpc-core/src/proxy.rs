//! Handles for invoking procedures on the remote peer.

use std::marker::PhantomData;

use serde_json::Value;

use crate::{
    ClientProcedure, DispatchError, Outbox, Procedure, ServerProcedure,
    dispatcher::encode,
    model::{Group, Question, Student},
};

/// The remote peer's procedures, as one-way calls.
///
/// Each call is encoded and enqueued without waiting; there is no reply.
/// Arguments are not validated locally beyond their types.
pub struct RemoteProxy<P> {
    outbox: Outbox,
    _procedures: PhantomData<fn(P)>,
}

/// Client-side handle on the server.
pub type ServerProxy = RemoteProxy<ServerProcedure>;

/// Server-side handle on one admin client.
pub type ClientProxy = RemoteProxy<ClientProcedure>;

impl<P: Procedure> RemoteProxy<P> {
    /// Create a proxy sending through the given outbox.
    #[must_use]
    pub const fn new(outbox: Outbox) -> Self {
        Self {
            outbox,
            _procedures: PhantomData,
        }
    }

    /// Invoke a procedure on the remote peer.
    ///
    /// # Errors
    /// Returns error if the call cannot be encoded or the transport is gone.
    pub fn invoke(&self, call: &P) -> Result<(), DispatchError> {
        let text = encode(call)?;
        tracing::debug!(procedure = call.name(), "invoking remote procedure");
        self.outbox.send(text)?;
        Ok(())
    }

    /// Whether the underlying transport has shut down.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.outbox.is_closed()
    }
}

impl RemoteProxy<ServerProcedure> {
    /// # Errors
    /// Returns error if the transport is gone.
    pub fn login(&self, name: &str, password: &str) -> Result<(), DispatchError> {
        self.invoke(&ServerProcedure::Login {
            name: name.to_owned(),
            password: password.to_owned(),
        })
    }

    /// # Errors
    /// Returns error if the transport is gone.
    pub fn show_section(&self, group: &str, section: &str) -> Result<(), DispatchError> {
        self.invoke(&ServerProcedure::ShowSection {
            group: group.to_owned(),
            section: section.to_owned(),
        })
    }

    /// # Errors
    /// Returns error if the transport is gone.
    pub fn list_groups(&self) -> Result<(), DispatchError> {
        self.invoke(&ServerProcedure::ListGroups)
    }
}

impl RemoteProxy<ClientProcedure> {
    /// # Errors
    /// Returns error if the transport is gone.
    pub fn connection_replaced(&self) -> Result<(), DispatchError> {
        self.invoke(&ClientProcedure::ConnectionReplaced)
    }

    /// # Errors
    /// Returns error if the transport is gone.
    pub fn login_prompt(&self) -> Result<(), DispatchError> {
        self.invoke(&ClientProcedure::LoginPrompt)
    }

    /// # Errors
    /// Returns error if the transport is gone.
    pub fn group_list(&self, groups: Vec<Group>) -> Result<(), DispatchError> {
        self.invoke(&ClientProcedure::GroupList { groups })
    }

    /// # Errors
    /// Returns error if the transport is gone.
    pub fn students_list(
        &self,
        group: &str,
        questions: Vec<Question>,
        students: Vec<Student>,
    ) -> Result<(), DispatchError> {
        self.invoke(&ClientProcedure::StudentsList {
            group: group.to_owned(),
            questions,
            students,
        })
    }

    /// # Errors
    /// Returns error if the transport is gone.
    pub fn student_detail(
        &self,
        group: &str,
        student: &str,
        questions: Vec<Question>,
        detail: Value,
    ) -> Result<(), DispatchError> {
        self.invoke(&ClientProcedure::StudentDetail {
            group: group.to_owned(),
            student: student.to_owned(),
            questions,
            detail,
        })
    }

    /// # Errors
    /// Returns error if the transport is gone.
    pub fn set_cookie(&self, name: &str, key: &str) -> Result<(), DispatchError> {
        self.invoke(&ClientProcedure::SetCookie {
            name: name.to_owned(),
            key: key.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{CallMessage, Channel};

    #[tokio::test]
    async fn test_server_proxy_enqueues_calls() {
        let (client, mut server) = Channel::pair();
        let proxy = ServerProxy::new(client.outbox());

        proxy.login("alice", "secret").unwrap();
        proxy.list_groups().unwrap();

        let login = CallMessage::parse(&server.recv().await.unwrap()).unwrap();
        assert_eq!(login.procedure, "login");
        assert_eq!(login.args, vec![json!("alice"), json!("secret")]);

        let list = CallMessage::parse(&server.recv().await.unwrap()).unwrap();
        assert_eq!(list, CallMessage::new("list-groups"));
    }

    #[test]
    fn test_closed_transport_is_reported() {
        let (client, server) = Channel::pair();
        let proxy = ClientProxy::new(server.outbox());
        drop(client);

        assert!(proxy.is_closed());
        assert!(matches!(
            proxy.login_prompt(),
            Err(DispatchError::TransportLost)
        ));
    }
}
