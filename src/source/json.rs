//! JSON file source.
//!
//! Fetches a static JSON file over HTTP(S) with [`reqwest`], or straight from
//! disk for `file://` URLs, and parses it into [`Post`]s.  The only accepted
//! body shape is a bare JSON array; anything else is a format error.

use reqwest::{StatusCode, Url};
use serde_json::Value;
use tracing::{debug, error};

use super::{FetchError, Post, PostSource};

/// A source that reads JSON post arrays relative to a base URL.
pub struct JsonSource {
    client: reqwest::Client,
    base: Url,
}

impl JsonSource {
    /// Create a source.  Relative entries of the topic/theme mapping are
    /// resolved against `base`; absolute URLs are used as they are.
    pub fn new(base: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            base,
        }
    }

    pub fn resolve(&self, url: &str) -> Result<Url, FetchError> {
        self.base.join(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// Parse a fetched body into positional post slots.
    ///
    /// This is a pure function (no I/O) so that tests can exercise the
    /// format rules without a server.
    pub fn parse_body(body: &[u8]) -> Result<Vec<Option<Post>>, FetchError> {
        match serde_json::from_slice::<Value>(body)? {
            Value::Array(items) => Ok(items.into_iter().map(Post::from_value).collect()),
            other => {
                error!(kind = json_kind(&other), "fetched data is not an array of posts");
                Err(FetchError::Format)
            }
        }
    }

    async fn read_file(url: &Url) -> Result<Vec<u8>, FetchError> {
        let path = url.to_file_path().map_err(|()| FetchError::InvalidUrl {
            url: url.to_string(),
            message: "not a local file path".to_string(),
        })?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FetchError::NotFound {
                url: url.to_string(),
            }),
            Err(source) => Err(FetchError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    async fn read_http(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

impl PostSource for JsonSource {
    async fn fetch(&self, url: &str) -> Result<Vec<Option<Post>>, FetchError> {
        let resolved = self.resolve(url)?;
        debug!(url = %resolved, "fetching posts");

        let body = if resolved.scheme() == "file" {
            Self::read_file(&resolved).await?
        } else {
            self.read_http(&resolved).await?
        };

        Self::parse_body(&body)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
