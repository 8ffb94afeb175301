//! Terminal front end for the admin dashboard.
//!
//! Run with: cargo run -p admin-tui -- --url ws://127.0.0.1:3000/ws

mod app;
mod ui;

use std::{
    fs::File,
    io,
    path::PathBuf,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use admin_rpc_session::{
    AdminClient, AdminHandlers, ClientError, Command, Notifier, RenderPolicy, View, ViewController,
    WebSocketConnector,
    cookie::CookieStore,
    storage::{FileCookieStore, MemoryCookieStore},
};
use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::{Action, App};

#[derive(Debug, Parser)]
#[command(about = "Admin dashboard in the terminal")]
struct Args {
    /// WebSocket endpoint of the server.
    #[arg(long, env = "ADMIN_URL", default_value = "ws://127.0.0.1:3000/ws")]
    url: String,

    /// Where session cookies are kept. Defaults to the platform data directory.
    #[arg(long, env = "ADMIN_COOKIE_FILE")]
    cookie_file: Option<PathBuf>,

    /// Decimal separator for numeric answers.
    #[arg(long, default_value_t = ',')]
    decimal_separator: char,

    /// Write logs to this file. The terminal is taken by the UI.
    #[arg(long, env = "ADMIN_LOG_FILE")]
    log_file: Option<PathBuf>,
}

/// Flags a takeover so the status line can mention it.
#[derive(Clone, Default)]
struct StatusNotifier(Arc<AtomicBool>);

impl Notifier for StatusNotifier {
    fn session_superseded(&self) {
        tracing::warn!("Session taken over by a newer login");
        self.0.store(true, Ordering::SeqCst);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_layer = match &args.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };
    tracing_subscriber::registry()
        .with(log_layer)
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cookies: Box<dyn CookieStore> =
        match args.cookie_file.clone().or_else(FileCookieStore::default_path) {
            Some(path) => Box::new(FileCookieStore::open(path)?),
            None => Box::new(MemoryCookieStore::new()),
        };
    let policy = RenderPolicy::new(args.decimal_separator);
    let handlers = AdminHandlers::new(ViewController::new(policy), cookies);

    let notifier = StatusNotifier::default();
    let mut client = AdminClient::new(WebSocketConnector::new(&args.url), handlers)
        .with_notifier(notifier.clone());
    let view = client.subscribe().context("client is already running")?;

    let (commands, mut rx) = mpsc::unbounded_channel();
    let run = tokio::spawn(async move { client.run(&mut rx).await });

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let mut app = App::new(policy);
    app.status = format!("Server {}", args.url);
    let result = run_app(
        &mut terminal,
        app,
        view,
        &commands,
        run,
        &notifier,
    )
    .await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App,
    view: watch::Receiver<Option<View>>,
    commands: &mpsc::UnboundedSender<Command>,
    run: JoinHandle<Result<(), ClientError>>,
    notifier: &StatusNotifier,
) -> anyhow::Result<()> {
    let mut run = Some(run);
    loop {
        if run.as_ref().is_some_and(JoinHandle::is_finished) {
            if let Some(handle) = run.take() {
                app.status = match handle.await {
                    Ok(Ok(())) => "Disconnected".to_owned(),
                    Ok(Err(e)) => format!("Disconnected: {e}"),
                    Err(e) => format!("Client stopped: {e}"),
                };
            }
        }
        if notifier.0.swap(false, Ordering::SeqCst) {
            app.status = "Logged in elsewhere, starting over".to_owned();
        }

        let current = view.borrow().clone();
        app.observe(current.as_ref());
        terminal.draw(|f| ui::draw(f, &app, current.as_ref()))?;

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    match app.on_key(key, current.as_ref()) {
                        Action::None => {}
                        Action::Send(command) => {
                            if commands.send(command).is_err() {
                                app.status = "Not connected".to_owned();
                            }
                        }
                        Action::Quit => break,
                    }
                }
                _ => {}
            }
        }
    }

    if let Some(handle) = run {
        handle.abort();
    }
    Ok(())
}
