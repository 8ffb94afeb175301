//! Routes inbound wire messages to the local handler table.

use std::marker::PhantomData;

use crate::{CallMessage, DispatchError, Procedure};

/// The local handler table: every procedure this peer exposes.
///
/// Handlers run synchronously, one call at a time, in arrival order.
pub trait Handler<P: Procedure> {
    type Error: std::fmt::Display;

    /// Apply one inbound call.
    ///
    /// # Errors
    /// Returns error if the handler could not apply the call. The dispatcher
    /// logs it and discards the call.
    fn handle(&mut self, call: P) -> Result<(), Self::Error>;
}

/// Call dispatcher for one session.
///
/// Owns the handler table so that nothing else mutates it between calls.
pub struct Dispatcher<P, H> {
    handler: H,
    dispatched: u64,
    _procedures: PhantomData<fn() -> P>,
}

impl<P, H> Dispatcher<P, H>
where
    P: Procedure,
    H: Handler<P>,
{
    /// Create a dispatcher over a handler table.
    #[must_use]
    pub const fn new(handler: H) -> Self {
        Self {
            handler,
            dispatched: 0,
            _procedures: PhantomData,
        }
    }

    /// Decode one raw message and invoke the matching handler.
    ///
    /// # Errors
    /// Returns `Protocol` for malformed messages, `UnknownProcedure` for
    /// names outside the table, and `Handler` if the handler failed. In every
    /// case the message is discarded and the handler table is left as it was
    /// before the call.
    pub fn on_message(&mut self, raw: &str) -> Result<(), DispatchError> {
        let call = CallMessage::parse(raw)?;
        let call = P::from_call(call)?;
        let procedure = call.name();
        tracing::debug!(procedure, "dispatching inbound call");
        self.handler
            .handle(call)
            .map_err(|e| DispatchError::Handler {
                procedure,
                message: e.to_string(),
            })?;
        self.dispatched += 1;
        Ok(())
    }

    /// Like `on_message`, but logs and swallows the error.
    ///
    /// Returns true if the message was dispatched.
    pub fn on_message_logged(&mut self, raw: &str) -> bool {
        match self.on_message(raw) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Discarding inbound message: {e}");
                false
            }
        }
    }

    /// Number of calls successfully dispatched.
    #[must_use]
    pub const fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Get the handler table.
    #[must_use]
    pub const fn handler(&self) -> &H {
        &self.handler
    }

    /// Get the handler table mutably.
    pub const fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Consume the dispatcher, returning the handler table.
    #[must_use]
    pub fn into_handler(self) -> H {
        self.handler
    }
}

/// Encode an outbound call to the text carried by the transport.
///
/// # Errors
/// Returns error if an argument cannot be serialized.
pub fn encode<P: Procedure>(call: &P) -> Result<String, DispatchError> {
    call.to_call()?.to_text()
}
