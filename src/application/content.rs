//! Boundary to the external content API.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{
    article::{Article, ArticleSort},
    widget::WidgetConfig,
};

#[derive(Debug, Error, Clone)]
pub enum ContentError {
    #[error("content api request failed: {0}")]
    Transport(String),
    #[error("content api responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("content api response could not be decoded: {0}")]
    Decode(String),
}

impl ContentError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }
}

/// One article listing request, derived from a widget configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleQuery {
    pub countries: Vec<String>,
    pub limit: u8,
    pub sort: ArticleSort,
    pub category: Option<String>,
}

impl ArticleQuery {
    pub fn for_config(config: &WidgetConfig) -> Self {
        Self {
            countries: vec![config.country.code().to_string()],
            limit: config.limit,
            sort: config.sort(),
            category: config.category.clone(),
        }
    }
}

/// Source of articles for the rendering endpoint.
#[async_trait]
pub trait ContentApi: Send + Sync {
    async fn get_articles(&self, query: &ArticleQuery) -> Result<Vec<Article>, ContentError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::widget::RawWidgetParams;

    #[test]
    fn hero_without_limit_requests_one_article() {
        let raw = RawWidgetParams {
            layout: Some("hero".to_string()),
            country: Some("NG".to_string()),
            feed_type: Some("top".to_string()),
            ..Default::default()
        };
        let query = ArticleQuery::for_config(&WidgetConfig::parse(&raw));
        assert_eq!(
            query,
            ArticleQuery {
                countries: vec!["NG".to_string()],
                limit: 1,
                sort: ArticleSort::Trending,
                category: None,
            }
        );
    }

    #[test]
    fn category_passes_through_verbatim() {
        let raw = RawWidgetParams {
            category: Some("Local Politics".to_string()),
            ..Default::default()
        };
        let query = ArticleQuery::for_config(&WidgetConfig::parse(&raw));
        assert_eq!(query.category.as_deref(), Some("Local Politics"));
    }
}
