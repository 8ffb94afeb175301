//! Error taxonomy shared by both peers.

use thiserror::Error;

/// Failure to route a single message.
///
/// Every variant is contained at the dispatcher boundary: the offending
/// message is discarded and the session keeps running.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The message does not have the `{procedure, args}` shape, or its
    /// arguments do not match the procedure's signature.
    #[error("Protocol error: {0}")]
    Protocol(String),
    /// The message names a procedure absent from the local handler table.
    #[error("Unknown procedure: {0}")]
    UnknownProcedure(String),
    /// A local handler failed while applying the call.
    #[error("Handler error in {procedure}: {message}")]
    Handler {
        procedure: &'static str,
        message: String,
    },
    /// An outgoing call could not be serialized.
    #[error("Encode error: {0}")]
    Encode(#[from] serde_json::Error),
    /// An outgoing call could not be enqueued because the transport is gone.
    #[error("Transport lost")]
    TransportLost,
}

/// Session-level failure. Both variants end the current session and force a
/// full state reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The server signalled `connection-replaced`: a newer login took over.
    #[error("Session superseded by a newer login")]
    Superseded,
    /// The underlying connection dropped.
    #[error("Transport lost")]
    TransportLost,
}

/// Transport send error.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Channel closed")]
    ChannelClosed,
}

impl From<TransportError> for DispatchError {
    fn from(_: TransportError) -> Self {
        Self::TransportLost
    }
}
