//! The post record shared by every source, the sorter and the renderer.
//!
//! Posts come from hand-maintained JSON files, so nothing about their shape
//! is guaranteed.  Every field is optional and deserialisation is lenient: a
//! value of an unexpected JSON type is treated as absent instead of failing
//! the whole record.  Records carry no identity; their position in the feed
//! is all that distinguishes two identical posts.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use super::date::parse_timestamp;

/// One post, normalised from an arbitrary JSON object.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Post {
    #[serde(deserialize_with = "lenient_text")]
    pub title: Option<String>,

    /// Post body.  Plain text; never interpreted as markup.
    #[serde(deserialize_with = "lenient_text")]
    pub selftext: Option<String>,

    /// Comment count.  Numeric strings are accepted; other strings become
    /// NaN, which the sorter treats as "cannot compare".
    #[serde(deserialize_with = "lenient_number")]
    pub num_comments: Option<f64>,

    /// Author sex, usually `"Hombre"` or `"Mujer"`.
    #[serde(deserialize_with = "lenient_text")]
    pub sex: Option<String>,

    #[serde(deserialize_with = "lenient_text")]
    pub us_president: Option<String>,

    #[serde(deserialize_with = "lenient_text")]
    pub document: Option<String>,

    /// Loosely formatted creation timestamp, see [`parse_timestamp`].
    #[serde(deserialize_with = "lenient_text")]
    pub created_readable_utc: Option<String>,

    #[serde(deserialize_with = "lenient_location")]
    pub location: Option<Location>,

    #[serde(deserialize_with = "lenient_flag")]
    pub is_archived: bool,

    #[serde(deserialize_with = "lenient_text")]
    pub archive_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Location {
    #[serde(deserialize_with = "lenient_text")]
    pub country: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub state: Option<String>,
}

impl Post {
    /// Build a post from one element of a fetched JSON array.
    ///
    /// Returns `None` for anything that is not a JSON object (null,
    /// numbers, nested arrays, ...).  The feed keeps those slots so that
    /// ordinals and sorting stay positional.
    pub fn from_value(value: Value) -> Option<Post> {
        if !value.is_object() {
            return None;
        }
        match serde_json::from_value(value) {
            Ok(post) => Some(post),
            Err(e) => {
                warn!(error = %e, "discarding unreadable post record");
                None
            }
        }
    }

    /// Comment count used for sorting; a missing count is zero.
    pub fn comment_count(&self) -> f64 {
        self.num_comments.unwrap_or(0.0)
    }

    /// The `us_president` field with surrounding whitespace removed.
    pub fn president(&self) -> &str {
        self.us_president.as_deref().map(str::trim).unwrap_or("")
    }

    /// Creation time in epoch milliseconds; `0` when missing or unreadable.
    pub fn created_at(&self) -> i64 {
        parse_timestamp(self.created_readable_utc.as_deref())
    }
}

/// Returns the field if present and non-empty.
pub(crate) fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Lenient field deserialisers
// ---------------------------------------------------------------------------

fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.trim().parse().unwrap_or(f64::NAN)),
        Value::Bool(b) => Some(if b { 1.0 } else { 0.0 }),
        _ => None,
    })
}

fn lenient_flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

fn lenient_location<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Location>, D::Error> {
    let value = Value::deserialize(d)?;
    if !value.is_object() {
        return Ok(None);
    }
    Ok(serde_json::from_value(value).ok())
}
