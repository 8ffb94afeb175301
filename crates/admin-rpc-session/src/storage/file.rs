//! File-backed cookie storage.

use std::{
    collections::BTreeMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use crate::cookie::{CookieError, CookieStore};

/// Cookie storage in a small `name=value` per line text file.
///
/// The file is rewritten on every `set` or `set_all`, so sessions resume
/// across restarts.
#[derive(Debug, Clone)]
pub struct FileCookieStore {
    path: PathBuf,
    cookies: BTreeMap<String, String>,
}

impl FileCookieStore {
    /// Open (or lazily create) the store at `path`.
    ///
    /// # Errors
    /// Returns error if an existing file cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CookieError> {
        let path = path.into();
        let cookies = match fs::read_to_string(&path) {
            Ok(contents) => parse(&contents),
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, cookies })
    }

    /// Default location under the platform data directory.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("admin-rpc").join("cookies"))
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), CookieError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents: String = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}\n"))
            .collect();
        fs::write(&self.path, contents)?;
        Ok(())
    }
}

fn parse(contents: &str) -> BTreeMap<String, String> {
    contents
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(name, value)| (name.trim().to_owned(), value.trim().to_owned()))
        .filter(|(name, _)| !name.is_empty())
        .collect()
}

fn check(name: &str, encoded: &str) -> Result<(), CookieError> {
    if name.is_empty() || name.contains(['=', '\n']) || encoded.contains('\n') {
        return Err(CookieError::Internal(format!("Cannot store cookie {name:?}")));
    }
    Ok(())
}

impl CookieStore for FileCookieStore {
    fn set(&mut self, name: &str, encoded: &str) -> Result<(), CookieError> {
        self.set_all(&[(name, encoded)])
    }

    fn set_all(&mut self, cookies: &[(&str, &str)]) -> Result<(), CookieError> {
        for (name, encoded) in cookies {
            check(name, encoded)?;
        }
        let previous = self.cookies.clone();
        for (name, encoded) in cookies {
            self.cookies.insert((*name).to_owned(), (*encoded).to_owned());
        }
        self.flush().inspect_err(|_| self.cookies = previous)
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
