//! Demo server peer for the admin dashboard.
//!
//! Run with: cargo run -p admin-server -- --password secret
//!
//! Then point the admin client at ws://127.0.0.1:3000/ws.

mod connection;
mod data;

use std::net::SocketAddr;

use admin_rpc_transport::websocket::{accept, request_cookie};
use anyhow::Context;
use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    http::HeaderMap,
    response::IntoResponse,
    routing::get,
};
use clap::Parser;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    connection::{AppState, Resume},
    data::Directory,
};

#[derive(Debug, Parser)]
#[command(about = "Serve the admin dashboard over WebSocket")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "ADMIN_LISTEN", default_value = "127.0.0.1:3000")]
    listen: SocketAddr,

    /// Password accepted for every admin name.
    #[arg(long, env = "ADMIN_PASSWORD")]
    password: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let state = AppState::new(Directory::demo(), &args.password);

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("Server listening on ws://{}/ws", args.listen);
    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("binding {}", args.listen))?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let resume = resume_from(&headers);
    ws.on_upgrade(move |socket| connection::serve(accept(socket), state, resume))
}

/// Session credentials from the handshake cookies, if both are present.
fn resume_from(headers: &HeaderMap) -> Option<Resume> {
    let decode = |name| {
        let raw = request_cookie(headers, name)?;
        urlencoding::decode(raw).ok().map(|v| v.into_owned())
    };
    Some(Resume {
        name: decode("name")?,
        key: decode("key")?,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use admin_rpc_core::Channel;
    use admin_rpc_session::{
        AdminHandlers, Command, ViewController,
        client::{AdminClient, ClientError, Connector, Notifier},
        storage::MemoryCookieStore,
        view::{View, ViewState},
    };
    use async_trait::async_trait;
    use admin_rpc_transport::lines;
    use axum::http::{HeaderValue, header::COOKIE};
    use serde_json::json;
    use tokio::{io::duplex, sync::mpsc};

    use super::*;

    #[test]
    fn test_resume_needs_both_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("name=J%C3%B6rgen%20%C3%85"));
        assert_eq!(resume_from(&headers), None);

        headers.insert(
            COOKIE,
            HeaderValue::from_static("key=k1; name=J%C3%B6rgen%20%C3%85"),
        );
        assert_eq!(
            resume_from(&headers),
            Some(Resume {
                name: "Jörgen Å".into(),
                key: "k1".into(),
            })
        );
    }

    /// Serves each connection in-process, resuming from the cookie header the
    /// way the WebSocket route does.
    struct InProcess(AppState);

    #[async_trait]
    impl Connector for InProcess {
        async fn connect(&self, cookie: Option<String>) -> Result<Channel, ClientError> {
            let mut headers = HeaderMap::new();
            if let Some(cookie) = cookie {
                let value =
                    HeaderValue::from_str(&cookie).map_err(|e| ClientError::Connect(e.to_string()))?;
                headers.insert(COOKIE, value);
            }
            let (client, server) = Channel::pair();
            tokio::spawn(connection::serve(server, self.0.clone(), resume_from(&headers)));
            Ok(client)
        }
    }

    /// Like `InProcess`, but each connection is a newline-delimited byte stream.
    struct OverLines(AppState);

    #[async_trait]
    impl Connector for OverLines {
        async fn connect(&self, _cookie: Option<String>) -> Result<Channel, ClientError> {
            let (client_io, server_io) = duplex(64 * 1024);
            let (reader, writer) = tokio::io::split(server_io);
            tokio::spawn(connection::serve(
                lines::spawn(reader, writer),
                self.0.clone(),
                None,
            ));
            let (reader, writer) = tokio::io::split(client_io);
            Ok(lines::spawn(reader, writer))
        }
    }

    #[derive(Clone, Default)]
    struct CountingNotifier(Arc<AtomicUsize>);

    impl Notifier for CountingNotifier {
        fn session_superseded(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    async fn wait_for(
        view: &mut tokio::sync::watch::Receiver<Option<View>>,
        state: ViewState,
    ) {
        while view.borrow().as_ref().map(View::state) != Some(state) {
            view.changed().await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_dashboard_round_trip() {
        let handlers = AdminHandlers::new(
            ViewController::default(),
            Box::new(MemoryCookieStore::new()),
        );
        let state = AppState::new(Directory::demo(), "pw");
        let mut client = AdminClient::new(InProcess(state), handlers);
        let mut view = client.subscribe().unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let run = tokio::spawn(async move { client.run(&mut rx).await });

        wait_for(&mut view, ViewState::LoggedOut).await;
        tx.send(Command::Login {
            name: "Jörgen Å".into(),
            password: "pw".into(),
        })
        .unwrap();

        wait_for(&mut view, ViewState::GroupList).await;
        let link = match view.borrow().as_ref() {
            Some(View::GroupList(groups)) => groups.link("Math", "Algebra").cloned(),
            _ => None,
        }
        .unwrap();
        assert_eq!(link.label(), "Algebra (2)");
        tx.send(Command::OpenSection(link)).unwrap();

        wait_for(&mut view, ViewState::StudentTable).await;
        if let Some(View::StudentTable(table)) = view.borrow().as_ref() {
            assert_eq!(table.group, "Math");
            assert_eq!(table.rows.len(), 3);
        }

        tx.send(Command::Back).unwrap();
        wait_for(&mut view, ViewState::GroupList).await;

        drop(tx);
        assert!(run.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_replaced_client_starts_over() {
        let state = AppState::new(Directory::demo(), "pw");
        let handlers = AdminHandlers::new(
            ViewController::default(),
            Box::new(MemoryCookieStore::new()),
        );
        let notifier = CountingNotifier::default();
        let mut client =
            AdminClient::new(OverLines(state.clone()), handlers).with_notifier(notifier.clone());
        let mut view = client.subscribe().unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let run = tokio::spawn(async move {
            let outcome = client.run(&mut rx).await;
            (outcome, client.sessions())
        });

        wait_for(&mut view, ViewState::LoggedOut).await;
        tx.send(Command::Login {
            name: "ann".into(),
            password: "pw".into(),
        })
        .unwrap();
        wait_for(&mut view, ViewState::GroupList).await;

        // A second login for the same account elsewhere.
        let mut other = OverLines(state).connect(None).await.unwrap();
        other.recv().await.unwrap();
        other
            .send(json!({ "procedure": "login", "args": ["ann", "pw"] }).to_string())
            .unwrap();
        other.recv().await.unwrap();

        wait_for(&mut view, ViewState::LoggedOut).await;
        assert_eq!(notifier.0.load(Ordering::SeqCst), 1);

        drop(tx);
        let (outcome, sessions) = run.await.unwrap();
        assert!(outcome.is_ok());
        assert_eq!(sessions, 2);
    }
}
