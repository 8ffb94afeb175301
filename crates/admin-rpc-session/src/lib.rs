//! Admin dashboard client session.
//!
//! Provides:
//! - `AdminHandlers` - The local handler table for server calls
//! - `ViewController` - Which single view is visible, and its content
//! - `Session` / `AdminClient` - One connection, and sessions back to back
//! - Cookie storage implementations (memory, file)

pub mod client;
pub mod cookie;
pub mod handlers;
pub mod render;
pub mod session;
pub mod storage;
pub mod view;

pub use client::{AdminClient, ClientError, Connector, LogNotifier, Notifier};
#[cfg(feature = "websocket")]
pub use client::WebSocketConnector;
pub use handlers::AdminHandlers;
pub use render::RenderPolicy;
pub use session::{Command, Session};
pub use view::{View, ViewController, ViewState};
