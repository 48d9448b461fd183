//! Parameter schema shared by the mounting side and the rendering endpoint.
//!
//! Every key has exactly one entry in [`ParamKey`], and every enumerated
//! value domain is a closed enum. Parsing never fails: unknown input maps to
//! the documented default.

use serde::Serialize;

/// Lower bound of the article limit, inclusive.
pub const MIN_LIMIT: u8 = 1;
/// Upper bound of the article limit, inclusive.
pub const MAX_LIMIT: u8 = 20;

/// Every configuration key understood by the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKey {
    Country,
    Type,
    Layout,
    Limit,
    Category,
    Theme,
    Width,
    Height,
}

impl ParamKey {
    pub const ALL: [ParamKey; 8] = [
        ParamKey::Country,
        ParamKey::Type,
        ParamKey::Layout,
        ParamKey::Limit,
        ParamKey::Category,
        ParamKey::Theme,
        ParamKey::Width,
        ParamKey::Height,
    ];

    /// Spelling used in the iframe query string.
    pub fn query_key(self) -> &'static str {
        match self {
            ParamKey::Country => "country",
            ParamKey::Type => "type",
            ParamKey::Layout => "layout",
            ParamKey::Limit => "limit",
            ParamKey::Category => "category",
            ParamKey::Theme => "theme",
            ParamKey::Width => "width",
            ParamKey::Height => "height",
        }
    }

    /// Spelling used as a data attribute on host-page placeholders.
    pub fn attribute(self) -> &'static str {
        match self {
            ParamKey::Country => "data-country",
            ParamKey::Type => "data-type",
            ParamKey::Layout => "data-layout",
            ParamKey::Limit => "data-limit",
            ParamKey::Category => "data-category",
            ParamKey::Theme => "data-theme",
            ParamKey::Width => "data-width",
            ParamKey::Height => "data-height",
        }
    }
}

/// Presentation mode of the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    #[default]
    Cards,
    List,
    Compact,
    Hero,
    Ticker,
}

/// Sizing and density defaults of a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutDefaults {
    pub width: u32,
    pub height: u32,
    pub limit: u8,
}

impl Layout {
    pub fn parse(raw: Option<&str>) -> Self {
        match normalized(raw).as_deref() {
            Some("cards") => Layout::Cards,
            Some("list") => Layout::List,
            Some("compact") => Layout::Compact,
            Some("hero") => Layout::Hero,
            Some("ticker") => Layout::Ticker,
            _ => Layout::default(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Layout::Cards => "cards",
            Layout::List => "list",
            Layout::Compact => "compact",
            Layout::Hero => "hero",
            Layout::Ticker => "ticker",
        }
    }

    pub fn defaults(self) -> LayoutDefaults {
        match self {
            Layout::Cards => LayoutDefaults {
                width: 420,
                height: 600,
                limit: 6,
            },
            Layout::Compact => LayoutDefaults {
                width: 360,
                height: 500,
                limit: 8,
            },
            Layout::Hero => LayoutDefaults {
                width: 420,
                height: 340,
                limit: 1,
            },
            // Ticker reads like a list: no cap of its own beyond the global clamp.
            Layout::Ticker => LayoutDefaults {
                width: 600,
                height: 200,
                limit: 6,
            },
            Layout::List => LayoutDefaults {
                width: 400,
                height: 600,
                limit: 6,
            },
        }
    }
}

/// Which slice of the feed the widget shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedType {
    #[default]
    Latest,
    Top,
    Featured,
    Location,
}

impl FeedType {
    /// Strict lookup; `None` for anything outside the enum.
    pub fn from_raw(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "latest" => Some(FeedType::Latest),
            "top" => Some(FeedType::Top),
            "featured" => Some(FeedType::Featured),
            "location" => Some(FeedType::Location),
            _ => None,
        }
    }

    pub fn parse(raw: Option<&str>) -> Self {
        raw.and_then(Self::from_raw).unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FeedType::Latest => "latest",
            FeedType::Top => "top",
            FeedType::Featured => "featured",
            FeedType::Location => "location",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FeedType::Top => "Top Stories",
            FeedType::Featured => "Featured",
            FeedType::Latest => "Latest News",
            FeedType::Location => "Local News",
        }
    }
}

/// Colour scheme requested by the embedder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    Auto,
}

impl Theme {
    pub fn parse(raw: Option<&str>) -> Self {
        match normalized(raw).as_deref() {
            Some("light") => Theme::Light,
            Some("dark") => Theme::Dark,
            _ => Theme::Auto,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::Auto => "auto",
        }
    }

    /// Class this theme sets on the document root; `auto` sets none.
    pub fn document_class(self) -> Option<&'static str> {
        match self {
            Theme::Light => Some("light"),
            Theme::Dark => Some("dark"),
            Theme::Auto => None,
        }
    }

    /// Class this theme removes from the document root.
    pub fn opposite_class(self) -> Option<&'static str> {
        match self {
            Theme::Light => Some("dark"),
            Theme::Dark => Some("light"),
            Theme::Auto => None,
        }
    }
}

/// Clamp a parsed limit into `[MIN_LIMIT, MAX_LIMIT]`.
pub fn clamp_limit(value: i64) -> u8 {
    value.clamp(i64::from(MIN_LIMIT), i64::from(MAX_LIMIT)) as u8
}

/// Integer-prefix parse: optional sign followed by leading digits.
///
/// `"7px"` yields `7`, `"abc"` and `""` yield `None`. Overflow saturates.
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let run = digits.bytes().take_while(u8::is_ascii_digit).count();
    if run == 0 {
        return None;
    }

    let magnitude = digits[..run].bytes().fold(0i64, |acc, digit| {
        acc.saturating_mul(10)
            .saturating_add(i64::from(digit - b'0'))
    });

    Some(if negative { -magnitude } else { magnitude })
}

fn normalized(raw: Option<&str>) -> Option<String> {
    raw.map(|value| value.trim().to_ascii_lowercase())
}
