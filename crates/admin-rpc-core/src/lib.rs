//! Core abstractions for the admin dashboard's bidirectional RPC session.
//!
//! This crate provides the fundamental building blocks:
//! - `CallMessage` - The `{procedure, args}` wire message
//! - `ClientProcedure` / `ServerProcedure` - Typed procedures for each peer
//! - `Dispatcher` - Routes inbound messages to a local `Handler`
//! - `RemoteProxy` - Issues one-way calls on the remote peer
//! - `Channel` - Message channel every transport adapter produces
//! - `model` - Groups, sections, questions, students and answers

pub mod dispatcher;
pub mod error;
pub mod model;
pub mod procedure;
pub mod proxy;
pub mod transport;
pub mod wire;

pub use dispatcher::{Dispatcher, Handler};
pub use error::{DispatchError, SessionError, TransportError};
pub use procedure::{ClientProcedure, Procedure, ServerProcedure};
pub use proxy::{ClientProxy, RemoteProxy, ServerProxy};
pub use transport::{Channel, Outbox};
pub use wire::CallMessage;
