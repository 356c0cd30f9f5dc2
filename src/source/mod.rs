//! Data source abstraction layer.
//!
//! This module defines the [`PostSource`] trait, the [`Post`] record every
//! source produces, and the [`FetchError`] taxonomy.  The concrete JSON
//! implementation lives in [`json`].
//!
//! A source resolves a (possibly relative) URL from the topic/theme mapping
//! and returns the positional list of records found there.  Slots that were
//! not JSON objects come back as `None` so that ordinals still line up with
//! the file.

mod date;
mod json;
mod post;

pub use json::JsonSource;
pub(crate) use post::non_empty;
pub use post::{Location, Post};

use std::future::Future;

use thiserror::Error;

/// Why a fetch did not produce a list of posts.
///
/// The `Display` text of every variant except [`FetchError::Format`] is the
/// detail appended to the user-facing "load failed" message.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Error: Data file not found at {url}")]
    NotFound { url: String },

    #[error("HTTP error! status: {status}")]
    Status { status: u16 },

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    /// The body was JSON but not a bare array of posts.
    #[error("response is not a JSON array")]
    Format,
}

/// Trait that every post source must implement.
///
/// The fetch worker calls [`fetch()`](PostSource::fetch) from tasks on its
/// own tokio runtime, so implementations must be `Send + Sync` and return
/// `Send` futures.
pub trait PostSource: Send + Sync + 'static {
    /// Fetch every record stored at `url`.
    fn fetch(&self, url: &str)
        -> impl Future<Output = Result<Vec<Option<Post>>, FetchError>> + Send;
}
