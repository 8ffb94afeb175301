//! In-memory cookie storage.

use std::collections::BTreeMap;

use crate::cookie::{CookieError, CookieStore};

/// In-memory cookie storage.
///
/// Useful for tests and for clients that should not resume sessions across
/// restarts. Data is lost on exit.
#[derive(Debug, Clone, Default)]
pub struct MemoryCookieStore {
    cookies: BTreeMap<String, String>,
}

impl MemoryCookieStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CookieStore for MemoryCookieStore {
    fn set(&mut self, name: &str, encoded: &str) -> Result<(), CookieError> {
        self.cookies.insert(name.to_owned(), encoded.to_owned());
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Option<String>, CookieError> {
        Ok(self.cookies.get(name).cloned())
    }

    fn entries(&self) -> Result<Vec<(String, String)>, CookieError> {
        Ok(self
            .cookies
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
