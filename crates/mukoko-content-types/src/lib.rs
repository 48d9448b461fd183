//! Request and response types for the Mukoko News content API.
//!
//! The embed service only reads articles, so this crate covers the
//! `articles` listing and nothing else.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, de};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Ordering requested from the content API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArticleSort {
    #[default]
    Latest,
    Trending,
    Popular,
}

impl ArticleSort {
    pub fn as_str(self) -> &'static str {
        match self {
            ArticleSort::Latest => "latest",
            ArticleSort::Trending => "trending",
            ArticleSort::Popular => "popular",
        }
    }
}

impl fmt::Display for ArticleSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single article as returned by the content API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    /// Unparseable timestamps decode as `None` rather than failing the listing.
    #[serde(
        default,
        serialize_with = "time::serde::rfc3339::option::serialize",
        deserialize_with = "lenient_timestamp"
    )]
    pub published_at: Option<OffsetDateTime>,
}

impl Article {
    /// Minimal article used by fixtures and fallbacks.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            image_url: None,
            source: None,
            category: None,
            country: None,
            published_at: None,
        }
    }
}

/// Envelope of `GET /api/articles`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticlesResponse {
    #[serde(default)]
    pub articles: Vec<Article>,
    #[serde(default)]
    pub total: Option<u64>,
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(|value| OffsetDateTime::parse(value.trim(), &Rfc3339).ok()))
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct IdVisitor;

    impl de::Visitor<'_> for IdVisitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string or integer article id")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_string<E: de::Error>(self, value: String) -> Result<String, E> {
            Ok(value)
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<String, E> {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(IdVisitor)
}
