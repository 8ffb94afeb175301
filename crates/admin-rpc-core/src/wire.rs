//! Wire message for procedure calls in either direction.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::DispatchError;

/// One call: a procedure name plus positional, JSON-compatible arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CallMessage {
    pub procedure: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl CallMessage {
    /// Create a call with no arguments.
    #[must_use]
    pub fn new(procedure: impl Into<String>) -> Self {
        Self {
            procedure: procedure.into(),
            args: Vec::new(),
        }
    }

    /// Append a positional argument.
    ///
    /// # Errors
    /// Returns error if the argument cannot be represented as JSON.
    pub fn arg<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, DispatchError> {
        self.args.push(serde_json::to_value(value)?);
        Ok(self)
    }

    /// Parse a raw message.
    ///
    /// # Errors
    /// Returns `DispatchError::Protocol` if the text is not a well-formed call.
    pub fn parse(raw: &str) -> Result<Self, DispatchError> {
        let malformed = |e: serde_json::Error| DispatchError::Protocol(format!("malformed call: {e}"));
        // Derived struct deserializers also accept a sequence; a call must be an object.
        let value: Value = serde_json::from_str(raw).map_err(malformed)?;
        if !value.is_object() {
            return Err(DispatchError::Protocol(
                "malformed call: expected a JSON object".into(),
            ));
        }
        serde_json::from_value(value).map_err(malformed)
    }

    /// Serialize to the text carried by the transport.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn to_text(&self) -> Result<String, DispatchError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Split into the procedure name and a positional argument reader.
    #[must_use]
    pub fn into_args(self) -> (String, Args) {
        let args = Args {
            procedure: self.procedure.clone(),
            values: self.args.into_iter(),
            position: 0,
        };
        (self.procedure, args)
    }
}

/// Positional argument reader used when decoding inbound calls.
pub struct Args {
    procedure: String,
    values: std::vec::IntoIter<Value>,
    position: usize,
}

impl Args {
    /// Take the next argument and decode it.
    ///
    /// # Errors
    /// Returns `DispatchError::Protocol` if the argument is missing or has
    /// the wrong shape.
    pub fn next<T: DeserializeOwned>(&mut self, name: &str) -> Result<T, DispatchError> {
        let position = self.position;
        self.position += 1;
        let value = self.values.next().ok_or_else(|| {
            DispatchError::Protocol(format!(
                "{}: missing argument {position} ({name})",
                self.procedure
            ))
        })?;
        serde_json::from_value(value).map_err(|e| {
            DispatchError::Protocol(format!(
                "{}: bad argument {position} ({name}): {e}",
                self.procedure
            ))
        })
    }

    /// Number of arguments not consumed yet.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}
