//! Client-side persistence of resumption credentials.
//!
//! The server hands out a `(name, key)` pair through `set-cookie`. Both values
//! are stored percent-encoded, exactly as they travel in the `Cookie` header
//! of the next connection, and decoded symmetrically on read.

use std::borrow::Cow;

use thiserror::Error;

/// Cookie holding the login name.
pub const NAME: &str = "name";
/// Cookie holding the server-issued session key.
pub const KEY: &str = "key";

/// Cookie storage error.
#[derive(Debug, Error)]
pub enum CookieError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Stored cookie {0} is not valid percent-encoded UTF-8")]
    Decode(String),
    #[error("Storage error: {0}")]
    Internal(String),
}

/// Trait for cookie storage backends.
///
/// Values passed in and out are already percent-encoded.
pub trait CookieStore: Send + Sync {
    /// Store one encoded cookie, replacing any previous value.
    ///
    /// # Errors
    /// Returns error if the backend cannot persist the value.
    fn set(&mut self, name: &str, encoded: &str) -> Result<(), CookieError>;

    /// Store several encoded cookies together.
    ///
    /// Backends that persist should write them in one go, so a failure never
    /// leaves some of them updated and the rest stale.
    ///
    /// # Errors
    /// Returns error if the backend cannot persist the values.
    fn set_all(&mut self, cookies: &[(&str, &str)]) -> Result<(), CookieError> {
        cookies
            .iter()
            .try_for_each(|(name, encoded)| self.set(name, encoded))
    }

    /// Get one encoded cookie.
    ///
    /// # Errors
    /// Returns error if the backend cannot be read.
    fn get(&self, name: &str) -> Result<Option<String>, CookieError>;

    /// All stored cookies in a stable order.
    ///
    /// # Errors
    /// Returns error if the backend cannot be read.
    fn entries(&self) -> Result<Vec<(String, String)>, CookieError>;
}

/// Percent-encode a cookie value.
#[must_use]
pub fn encode(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

/// Decode a percent-encoded cookie value.
///
/// # Errors
/// Returns error if the decoded bytes are not UTF-8.
pub fn decode<'a>(name: &str, encoded: &'a str) -> Result<Cow<'a, str>, CookieError> {
    urlencoding::decode(encoded).map_err(|_| CookieError::Decode(name.to_owned()))
}

/// Persist the credentials received through `set-cookie`.
///
/// # Errors
/// Returns error if the backend cannot persist either value.
pub fn store_credentials(
    store: &mut dyn CookieStore,
    name: &str,
    key: &str,
) -> Result<(), CookieError> {
    let (name, key) = (encode(name), encode(key));
    store.set_all(&[(NAME, name.as_ref()), (KEY, key.as_ref())])
}

/// Read one cookie back and decode it.
///
/// # Errors
/// Returns error if the backend fails or the stored value is corrupt.
pub fn read_decoded(store: &dyn CookieStore, name: &str) -> Result<Option<String>, CookieError> {
    store
        .get(name)?
        .map(|encoded| decode(name, &encoded).map(Cow::into_owned))
        .transpose()
}

/// Build the `Cookie` request header for the next connection.
///
/// Returns `None` when nothing is stored.
///
/// # Errors
/// Returns error if the backend cannot be read.
pub fn request_header(store: &dyn CookieStore) -> Result<Option<String>, CookieError> {
    let entries = store.entries()?;
    if entries.is_empty() {
        return Ok(None);
    }
    let header = entries
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; ");
    Ok(Some(header))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryCookieStore;

    #[test]
    fn test_credentials_round_trip() {
        let mut store = MemoryCookieStore::new();
        store_credentials(&mut store, "Jörgen Å", "k/ey=1;2").unwrap();

        assert_eq!(
            read_decoded(&store, NAME).unwrap().as_deref(),
            Some("Jörgen Å")
        );
        assert_eq!(read_decoded(&store, KEY).unwrap().as_deref(), Some("k/ey=1;2"));
    }

    #[test]
    fn test_values_are_stored_encoded() {
        let mut store = MemoryCookieStore::new();
        store_credentials(&mut store, "Jörgen Å", "abc").unwrap();

        assert_eq!(
            store.get(NAME).unwrap().as_deref(),
            Some("J%C3%B6rgen%20%C3%85")
        );
    }

    #[test]
    fn test_request_header() {
        let mut store = MemoryCookieStore::new();
        assert_eq!(request_header(&store).unwrap(), None);

        store_credentials(&mut store, "ann", "k; 1").unwrap();
        assert_eq!(
            request_header(&store).unwrap().as_deref(),
            Some("key=k%3B%201; name=ann")
        );
    }

    #[test]
    fn test_corrupt_value_is_reported() {
        let mut store = MemoryCookieStore::new();
        store.set(NAME, "%FF").unwrap();
        assert!(matches!(
            read_decoded(&store, NAME),
            Err(CookieError::Decode(name)) if name == NAME
        ));
    }
}
