//! Validated widget configuration.

use mukoko_content_types::ArticleSort;
use serde::Deserialize;

use super::{
    country::Country,
    params::{FeedType, Layout, ParamKey, Theme, clamp_limit, parse_leading_int},
};

/// Unvalidated inputs, keyed the same way on both sides of the iframe.
///
/// Deserializes straight from the iframe query string; the mounting side
/// fills it from placeholder attributes via [`RawWidgetParams::from_lookup`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawWidgetParams {
    pub country: Option<String>,
    #[serde(rename = "type")]
    pub feed_type: Option<String>,
    pub layout: Option<String>,
    pub limit: Option<String>,
    pub category: Option<String>,
    pub theme: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
}

impl RawWidgetParams {
    pub fn from_lookup<F>(mut lookup: F) -> Self
    where
        F: FnMut(ParamKey) -> Option<String>,
    {
        Self {
            country: lookup(ParamKey::Country),
            feed_type: lookup(ParamKey::Type),
            layout: lookup(ParamKey::Layout),
            limit: lookup(ParamKey::Limit),
            category: lookup(ParamKey::Category),
            theme: lookup(ParamKey::Theme),
            width: lookup(ParamKey::Width),
            height: lookup(ParamKey::Height),
        }
    }

    pub fn get(&self, key: ParamKey) -> Option<&str> {
        let value = match key {
            ParamKey::Country => &self.country,
            ParamKey::Type => &self.feed_type,
            ParamKey::Layout => &self.layout,
            ParamKey::Limit => &self.limit,
            ParamKey::Category => &self.category,
            ParamKey::Theme => &self.theme,
            ParamKey::Width => &self.width,
            ParamKey::Height => &self.height,
        };
        value.as_deref()
    }
}

/// Configuration of one widget instance. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetConfig {
    pub country: Country,
    pub feed_type: FeedType,
    pub layout: Layout,
    pub limit: u8,
    pub category: Option<String>,
    pub theme: Theme,
    pub width: u32,
    pub height: u32,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self::parse(&RawWidgetParams::default())
    }
}

impl WidgetConfig {
    /// Resolve raw inputs into a renderable configuration. Never fails.
    pub fn parse(raw: &RawWidgetParams) -> Self {
        let layout = Layout::parse(raw.get(ParamKey::Layout));
        let defaults = layout.defaults();

        let limit = raw
            .get(ParamKey::Limit)
            .and_then(parse_leading_int)
            .map(clamp_limit)
            .unwrap_or(defaults.limit);

        let category = raw
            .get(ParamKey::Category)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        Self {
            country: Country::parse(raw.get(ParamKey::Country)),
            feed_type: FeedType::parse(raw.get(ParamKey::Type)),
            layout,
            limit,
            category,
            theme: Theme::parse(raw.get(ParamKey::Theme)),
            width: positive_dimension(raw.get(ParamKey::Width)).unwrap_or(defaults.width),
            height: positive_dimension(raw.get(ParamKey::Height)).unwrap_or(defaults.height),
        }
    }

    pub fn sort(&self) -> ArticleSort {
        match self.feed_type {
            FeedType::Latest | FeedType::Location => ArticleSort::Latest,
            FeedType::Top => ArticleSort::Trending,
            FeedType::Featured => ArticleSort::Popular,
        }
    }

    pub fn has_default_limit(&self) -> bool {
        self.limit == self.layout.defaults().limit
    }

    /// Ordered iframe query: `country`, `type`, `layout`, then `limit`,
    /// `category` and `theme` only when they carry information.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            (ParamKey::Country.query_key(), self.country.code().to_string()),
            (ParamKey::Type.query_key(), self.feed_type.as_str().to_string()),
            (ParamKey::Layout.query_key(), self.layout.as_str().to_string()),
        ];
        if !self.has_default_limit() {
            pairs.push((ParamKey::Limit.query_key(), self.limit.to_string()));
        }
        if let Some(category) = &self.category {
            pairs.push((ParamKey::Category.query_key(), category.clone()));
        }
        if self.theme != Theme::Auto {
            pairs.push((ParamKey::Theme.query_key(), self.theme.as_str().to_string()));
        }
        pairs
    }
}

fn positive_dimension(raw: Option<&str>) -> Option<u32> {
    let value = raw.and_then(parse_leading_int)?;
    (value > 0).then(|| u32::try_from(value).unwrap_or(u32::MAX))
}
