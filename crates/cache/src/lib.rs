//! # tg cache
//!
//! Persists fully built projects so unchanged trees skip parsing.
//!
//! ```text
//! <base>/<projectID>/<normalized branch>.astg   (gzip of indented JSON)
//! ```
//!
//! An entry is only returned when the project id and marker recorded inside
//! it equal the caller's current values.

mod error;
mod store;

pub use error::{CacheError, Result};
pub use store::{CacheKey, CacheLookup, CacheMissReason, CacheStore, CACHE_FILE_EXTENSION};
