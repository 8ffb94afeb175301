//! The admin client's local handler table.

use admin_rpc_core::{ClientProcedure, Handler, Procedure};
use tokio::sync::watch;

use crate::{
    cookie::{self, CookieError, CookieStore},
    view::{View, ViewController},
};

/// Handles every procedure the server may invoke on the admin client.
///
/// Each call updates the view controller (or the cookie store), then
/// publishes a snapshot of the visible view for front ends.
pub struct AdminHandlers {
    view: ViewController,
    cookies: Box<dyn CookieStore>,
    snapshot: watch::Sender<Option<View>>,
    superseded: bool,
}

impl AdminHandlers {
    /// Create a handler table.
    #[must_use]
    pub fn new(view: ViewController, cookies: Box<dyn CookieStore>) -> Self {
        let (snapshot, _) = watch::channel(None);
        Self {
            view,
            cookies,
            snapshot,
            superseded: false,
        }
    }

    /// Subscribe to the visible view.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<View>> {
        self.snapshot.subscribe()
    }

    #[must_use]
    pub const fn view(&self) -> &ViewController {
        &self.view
    }

    #[must_use]
    pub fn cookies(&self) -> &dyn CookieStore {
        self.cookies.as_ref()
    }

    /// Whether the server has signalled `connection-replaced`.
    #[must_use]
    pub const fn is_superseded(&self) -> bool {
        self.superseded
    }

    /// Reset for a new session: nothing visible, not superseded.
    pub fn reset(&mut self) {
        self.view.reset();
        self.superseded = false;
        self.publish();
    }

    fn publish(&self) {
        self.snapshot.send_replace(self.view.active().cloned());
    }
}

impl Handler<ClientProcedure> for AdminHandlers {
    type Error = CookieError;

    fn handle(&mut self, call: ClientProcedure) -> Result<(), CookieError> {
        let procedure = call.name();
        match &call {
            ClientProcedure::ConnectionReplaced => {
                tracing::warn!("Connection taken over by a newer login");
                self.superseded = true;
            }
            ClientProcedure::SetCookie { name, key } => {
                cookie::store_credentials(self.cookies.as_mut(), name, key)?;
                tracing::info!(%name, "Stored session cookie");
            }
            _ => {}
        }
        self.view.apply(call);
        tracing::debug!(procedure, state = ?self.view.state(), "handled call");
        self.publish();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        cookie::{NAME, read_decoded},
        storage::MemoryCookieStore,
        view::ViewState,
    };

    fn handlers() -> AdminHandlers {
        AdminHandlers::new(
            ViewController::default(),
            Box::new(MemoryCookieStore::new()),
        )
    }

    #[test]
    fn test_login_prompt_twice_is_idempotent() {
        let mut handlers = handlers();
        handlers.handle(ClientProcedure::LoginPrompt).unwrap();
        let first = handlers.view().active().cloned();
        handlers.handle(ClientProcedure::LoginPrompt).unwrap();

        assert_eq!(handlers.view().state(), Some(ViewState::LoggedOut));
        assert_eq!(handlers.view().active().cloned(), first);
    }

    #[test]
    fn test_set_cookie_keeps_view() {
        let mut handlers = handlers();
        handlers.handle(ClientProcedure::LoginPrompt).unwrap();
        handlers
            .handle(ClientProcedure::SetCookie {
                name: "Jörgen Å".into(),
                key: "k1".into(),
            })
            .unwrap();

        assert_eq!(handlers.view().state(), Some(ViewState::LoggedOut));
        assert_eq!(
            read_decoded(handlers.cookies(), NAME).unwrap().as_deref(),
            Some("Jörgen Å")
        );
    }

    #[test]
    fn test_connection_replaced_resets_view() {
        let mut handlers = handlers();
        handlers
            .handle(ClientProcedure::GroupList {
                groups: serde_json::from_value(json!([["Math", ["Algebra", 1]]])).unwrap(),
            })
            .unwrap();
        handlers.handle(ClientProcedure::ConnectionReplaced).unwrap();

        assert!(handlers.is_superseded());
        assert_eq!(handlers.view().state(), None);

        handlers.reset();
        assert!(!handlers.is_superseded());
    }

    #[test]
    fn test_snapshot_follows_view() {
        let mut handlers = handlers();
        let rx = handlers.subscribe();
        assert!(rx.borrow().is_none());

        handlers.handle(ClientProcedure::LoginPrompt).unwrap();
        assert_eq!(*rx.borrow(), Some(View::LoggedOut));
    }
}
