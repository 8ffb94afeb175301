//! Cookie storage implementations.

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "file")]
pub mod file;

#[cfg(feature = "memory")]
pub use memory::MemoryCookieStore;

#[cfg(feature = "file")]
pub use file::FileCookieStore;
