//! Document Data Structure
//!
//! A `Document` is the unit of data that flows through docsweep: it is read
//! from the log, staged as a JSON object, enriched with a word count by the
//! sweep, and finally published to the destination bucket.
//!
//! ## Wire format
//!
//! ```text
//! { "id": "r1", "title": "...", "author": "...",
//!   "publish_date": "2024-03-01T12:00:00Z", "content": "a b c",
//!   "word_count": 3 }
//! ```
//!
//! - `word_count` is omitted until the sweep computes it.
//! - `article_id` is accepted in place of `id` (older producers emit it).
//! - Fields the model does not know about are carried through untouched.
//! - `publish_date` accepts RFC 3339 or a naive ISO-8601 timestamp, which is
//!   read as UTC.

use bytes::Bytes;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Suffix of every staged and published object key.
pub const OBJECT_SUFFIX: &str = ".json";

/// A single document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique document id, also the object key stem.
    #[serde(alias = "article_id")]
    pub id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub author: String,

    #[serde(
        default,
        with = "iso8601",
        skip_serializing_if = "Option::is_none"
    )]
    pub publish_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub content: String,

    /// Whitespace-delimited token count of `content`. Absent until computed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<u64>,

    /// Fields outside the model, preserved as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            author: String::new(),
            publish_date: None,
            content: content.into(),
            word_count: None,
            extra: Map::new(),
        }
    }

    /// Decode a document from a JSON payload.
    pub fn from_slice(payload: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(payload)?)
    }

    /// Encode the document as a JSON object body.
    pub fn to_bytes(&self) -> Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }

    /// Object key under which this document is staged and published.
    pub fn object_key(&self) -> Result<String> {
        object_key(&self.id)
    }

    /// Set `word_count` from `content`, replacing any value the document
    /// arrived with.
    pub fn recount_words(&mut self) -> u64 {
        let words = count_words(&self.content);
        self.word_count = Some(words);
        words
    }
}

/// Number of maximal whitespace-delimited substrings in `content`.
pub fn count_words(content: &str) -> u64 {
    content.split_whitespace().count() as u64
}

/// Build the `<id>.json` object key for a document id.
///
/// Ids that would escape a single path segment are rejected.
pub fn object_key(id: &str) -> Result<String> {
    if id.is_empty() || id == "." || id == ".." || id.contains('/') {
        return Err(Error::InvalidId(id.to_string()));
    }
    Ok(format!("{id}{OBJECT_SUFFIX}"))
}

/// Parse an ISO-8601 timestamp, with or without an offset.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| Error::InvalidTimestamp(raw.to_string()))
}

mod iso8601 {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| super::parse_timestamp(&s).map_err(de::Error::custom))
            .transpose()
    }
}

impl std::fmt::Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.publish_date {
            Some(dt) => write!(
                f,
                "{} ({}, {})",
                self.id,
                self.author,
                dt.to_rfc3339_opts(SecondsFormat::Secs, true)
            ),
            None => write!(f, "{} ({})", self.id, self.author),
        }
    }
}
