//! Article presentation rules that depend on untrusted feed content.

use time::{Duration, OffsetDateTime, macros::format_description};
use url::Url;

pub use mukoko_content_types::{Article, ArticleSort, ArticlesResponse};

/// Accept an image URL only when it is an absolute `http`/`https` URL.
///
/// The returned string is safe to place inside a CSS `url('…')` token.
pub fn safe_image_url(raw: Option<&str>) -> Option<String> {
    let candidate = raw?.trim();
    if candidate.is_empty() {
        return None;
    }

    let parsed = Url::parse(candidate).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return None;
    }

    Some(css_escape_url(parsed.as_str()))
}

fn css_escape_url(url: &str) -> String {
    let mut escaped = String::with_capacity(url.len());
    for ch in url.chars() {
        match ch {
            '\'' => escaped.push_str("%27"),
            '"' => escaped.push_str("%22"),
            '(' => escaped.push_str("%28"),
            ')' => escaped.push_str("%29"),
            '\\' => escaped.push_str("%5C"),
            c if c.is_whitespace() || c.is_control() => {}
            c => escaped.push(c),
        }
    }
    escaped
}

/// Emoji shown on image-less cards, keyed by the article category.
pub fn category_emoji(category: Option<&str>) -> &'static str {
    let Some(category) = category else {
        return "📰";
    };
    match category.trim().to_ascii_lowercase().as_str() {
        "politics" => "🏛️",
        "business" | "economy" | "finance" => "💼",
        "sports" | "sport" => "⚽",
        "technology" | "tech" => "💻",
        "entertainment" => "🎬",
        "health" => "🏥",
        "world" | "international" => "🌍",
        "agriculture" => "🌾",
        "education" => "🎓",
        "environment" => "🌱",
        "crime" => "⚖️",
        "lifestyle" => "✨",
        _ => "📰",
    }
}

/// Short human label for how long ago an article was published.
pub fn relative_time(published_at: Option<OffsetDateTime>, now: OffsetDateTime) -> Option<String> {
    let published = published_at?;
    let elapsed = now - published;

    if elapsed < Duration::minutes(1) {
        return Some("just now".to_string());
    }
    if elapsed < Duration::hours(1) {
        return Some(format!("{}m ago", elapsed.whole_minutes()));
    }
    if elapsed < Duration::days(1) {
        return Some(format!("{}h ago", elapsed.whole_hours()));
    }
    if elapsed < Duration::days(7) {
        return Some(format!("{}d ago", elapsed.whole_days()));
    }

    published
        .format(format_description!(
            "[day padding:none] [month repr:short] [year]"
        ))
        .ok()
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn rejects_non_http_schemes() {
        for raw in [
            "javascript:alert(1)",
            " JavaScript:alert(1)",
            "data:image/png;base64,AAAA",
            "vbscript:msgbox",
            "file:///etc/passwd",
            "//cdn.example.com/a.png",
            "/relative.png",
            "",
        ] {
            assert_eq!(safe_image_url(Some(raw)), None, "{raw:?}");
        }
        assert_eq!(safe_image_url(None), None);
    }

    #[test]
    fn accepts_http_and_https() {
        assert_eq!(
            safe_image_url(Some("https://cdn.example.com/a.jpg")).as_deref(),
            Some("https://cdn.example.com/a.jpg")
        );
        assert!(safe_image_url(Some("http://cdn.example.com/a.jpg")).is_some());
    }

    #[test]
    fn breakout_characters_are_escaped() {
        let url = safe_image_url(Some("https://cdn.example.com/a').png")).expect("accepted");
        assert!(!url.contains('\''));
        assert!(!url.contains(')'));
    }

    #[test]
    fn unknown_category_uses_newspaper() {
        assert_eq!(category_emoji(Some("Sports")), "⚽");
        assert_eq!(category_emoji(Some("astrology")), "📰");
        assert_eq!(category_emoji(None), "📰");
    }

    #[test]
    fn relative_labels() {
        let now = datetime!(2025-03-12 12:00 UTC);
        assert_eq!(relative_time(None, now), None);
        assert_eq!(
            relative_time(Some(datetime!(2025-03-12 11:59:30 UTC)), now).as_deref(),
            Some("just now")
        );
        assert_eq!(
            relative_time(Some(datetime!(2025-03-12 11:55 UTC)), now).as_deref(),
            Some("5m ago")
        );
        assert_eq!(
            relative_time(Some(datetime!(2025-03-12 09:00 UTC)), now).as_deref(),
            Some("3h ago")
        );
        assert_eq!(
            relative_time(Some(datetime!(2025-03-10 12:00 UTC)), now).as_deref(),
            Some("2d ago")
        );
        assert_eq!(
            relative_time(Some(datetime!(2025-02-01 12:00 UTC)), now).as_deref(),
            Some("1 Feb 2025")
        );
    }
}
