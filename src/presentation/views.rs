use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use time::OffsetDateTime;
use url::Url;
use uuid::Uuid;

use crate::{
    application::{
        error::HttpError,
        session::{WidgetPhase, WidgetSnapshot},
    },
    domain::{
        article::{Article, category_emoji, relative_time, safe_image_url},
        country::Country,
        params::Layout,
        widget::WidgetConfig,
    },
};

/// Client bundle driving the live connection inside the frame.
pub const DATASTAR_SCRIPT_URL: &str =
    "https://cdn.jsdelivr.net/gh/starfederation/datastar@1.0.0-RC.6/bundles/datastar.js";
pub const STYLESHEET_PATH: &str = "/static/embed/widget.css";

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Links back to the main news site.
#[derive(Debug, Clone)]
pub struct SiteLinks {
    site_url: Url,
    brand: String,
}

impl SiteLinks {
    pub fn new(site_url: Url, brand: impl Into<String>) -> Self {
        Self {
            site_url,
            brand: brand.into(),
        }
    }

    pub fn brand(&self) -> &str {
        &self.brand
    }

    pub fn article_url(&self, id: &str) -> String {
        self.with_segments(&["article", id]).into()
    }

    pub fn discover_url(&self, country: Country) -> String {
        let mut url = self.with_segments(&["discover"]);
        url.query_pairs_mut().append_pair("country", country.code());
        url.into()
    }

    fn with_segments(&self, segments: &[&str]) -> Url {
        let mut url = self.site_url.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

/// One article, prepared for any layout.
#[derive(Debug, Clone)]
pub struct ArticleView {
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    /// Inline `background-image` declaration; present only for safe URLs.
    pub image_style: Option<String>,
    pub emoji: &'static str,
    pub category: Option<String>,
    pub source: Option<String>,
    pub published: Option<String>,
}

impl ArticleView {
    pub fn new(article: &Article, links: &SiteLinks, now: OffsetDateTime) -> Self {
        let category = article
            .category
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty());

        Self {
            title: article.title.clone(),
            description: article
                .description
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
            url: links.article_url(&article.id),
            image_style: safe_image_url(article.image_url.as_deref())
                .map(|url| format!("background-image:url('{url}')")),
            emoji: category_emoji(category),
            category: category.map(str::to_string),
            source: article.source.clone(),
            published: relative_time(article.published_at, now),
        }
    }
}

/// Everything a layout needs to render a Ready (or Refreshing) widget.
#[derive(Debug, Clone)]
pub struct WidgetView {
    pub flag: String,
    pub country_name: &'static str,
    pub type_label: &'static str,
    pub articles: Vec<ArticleView>,
    pub discover_url: String,
    pub brand: String,
}

impl WidgetView {
    pub fn new(
        config: &WidgetConfig,
        articles: &[Article],
        links: &SiteLinks,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            flag: config.country.flag(),
            country_name: config.country.name(),
            type_label: config.feed_type.label(),
            articles: articles
                .iter()
                .take(usize::from(config.limit))
                .map(|article| ArticleView::new(article, links, now))
                .collect(),
            discover_url: links.discover_url(config.country),
            brand: links.brand().to_string(),
        }
    }

    pub fn count_label(&self) -> String {
        format!("{} stories", self.articles.len())
    }

    pub fn lead(&self) -> Option<&ArticleView> {
        self.articles.first()
    }
}

#[derive(Template)]
#[template(path = "embed/cards.html")]
pub struct CardsTemplate<'a> {
    pub view: &'a WidgetView,
}

#[derive(Template)]
#[template(path = "embed/list.html")]
pub struct ListTemplate<'a> {
    pub view: &'a WidgetView,
}

#[derive(Template)]
#[template(path = "embed/compact.html")]
pub struct CompactTemplate<'a> {
    pub view: &'a WidgetView,
}

#[derive(Template)]
#[template(path = "embed/hero.html")]
pub struct HeroTemplate<'a> {
    pub view: &'a WidgetView,
}

#[derive(Template)]
#[template(path = "embed/ticker.html")]
pub struct TickerTemplate<'a> {
    pub view: &'a WidgetView,
}

/// Render the articles of a widget in the requested layout.
pub fn render_layout(layout: Layout, view: &WidgetView) -> Result<String, AskamaError> {
    match layout {
        Layout::Cards => CardsTemplate { view }.render(),
        Layout::List => ListTemplate { view }.render(),
        Layout::Compact => CompactTemplate { view }.render(),
        Layout::Hero => HeroTemplate { view }.render(),
        Layout::Ticker => TickerTemplate { view }.render(),
    }
}

#[derive(Template)]
#[template(path = "embed/loading.html")]
pub struct LoadingTemplate {
    pub layout: &'static str,
    pub rows: usize,
}

#[derive(Template)]
#[template(path = "embed/error.html")]
pub struct ErrorStateTemplate {
    pub layout: &'static str,
    pub retry_url: String,
}

#[derive(Template)]
#[template(path = "embed/ready.html")]
pub struct ReadyTemplate<'a> {
    pub layout: &'static str,
    pub view: &'a WidgetView,
    pub body: String,
    pub refreshing: bool,
    pub refresh_url: String,
}

/// Per-session inputs to the widget state renderer.
pub struct WidgetRenderContext<'a> {
    pub session_id: Uuid,
    pub config: &'a WidgetConfig,
    pub links: &'a SiteLinks,
    pub now: OffsetDateTime,
}

impl WidgetRenderContext<'_> {
    pub fn action_url(&self, action: &str) -> String {
        format!("/embed/iframe/{}/{action}", self.session_id)
    }
}

pub fn render_loading(layout: Layout, limit: u8) -> Result<String, AskamaError> {
    LoadingTemplate {
        layout: layout.as_str(),
        rows: usize::from(limit.min(4)),
    }
    .render()
}

/// Render the `#widget-root` element for a session snapshot.
pub fn render_widget_state(
    snapshot: &WidgetSnapshot,
    context: &WidgetRenderContext<'_>,
) -> Result<String, AskamaError> {
    let layout = context.config.layout;
    match snapshot.phase {
        WidgetPhase::Loading => render_loading(layout, context.config.limit),
        WidgetPhase::Error => ErrorStateTemplate {
            layout: layout.as_str(),
            retry_url: context.action_url("retry"),
        }
        .render(),
        WidgetPhase::Ready | WidgetPhase::Refreshing => {
            let view = WidgetView::new(
                context.config,
                &snapshot.articles,
                context.links,
                context.now,
            );
            let body = render_layout(layout, &view)?;
            ReadyTemplate {
                layout: layout.as_str(),
                view: &view,
                body,
                refreshing: snapshot.phase == WidgetPhase::Refreshing,
                refresh_url: context.action_url("refresh"),
            }
            .render()
        }
    }
}

/// Sandbox document served at the rendering endpoint.
#[derive(Template)]
#[template(path = "embed/frame.html")]
pub struct FrameTemplate {
    pub html_class: String,
    pub title: String,
    pub stylesheet: &'static str,
    pub datastar_src: &'static str,
    pub live_url: String,
    pub initial: String,
}

/// Markup injected into a host-page placeholder.
#[derive(Template)]
#[template(path = "embed/iframe.html")]
pub struct IframeTemplate<'a> {
    pub src: &'a str,
    pub width: u32,
    pub height: u32,
    pub title: &'a str,
    pub style: &'a str,
    pub allow: &'a str,
    pub sandbox: &'a str,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use time::macros::datetime;

    use super::*;
    use crate::domain::widget::RawWidgetParams;

    const NOW: OffsetDateTime = datetime!(2025-03-12 12:00 UTC);

    fn links() -> SiteLinks {
        SiteLinks::new(
            Url::parse("https://news.mukoko.com").expect("site url"),
            "Mukoko News",
        )
    }

    fn config(layout: &str) -> WidgetConfig {
        WidgetConfig::parse(&RawWidgetParams {
            layout: Some(layout.to_string()),
            country: Some("KE".to_string()),
            ..Default::default()
        })
    }

    fn articles(count: usize) -> Vec<Article> {
        (0..count)
            .map(|i| {
                let mut article = Article::new(format!("a{i}"), format!("Headline {i}"));
                article.category = Some("sports".to_string());
                article
            })
            .collect()
    }

    fn render(layout: &str, items: &[Article]) -> String {
        let config = config(layout);
        let view = WidgetView::new(&config, items, &links(), NOW);
        render_layout(config.layout, &view).expect("layout renders")
    }

    #[test]
    fn site_links_are_canonical() {
        let links = links();
        assert_eq!(
            links.article_url("abc 1"),
            "https://news.mukoko.com/article/abc%201"
        );
        assert_eq!(
            links.discover_url(Country::Kenya),
            "https://news.mukoko.com/discover?country=KE"
        );
    }

    #[test]
    fn every_layout_links_out_of_the_frame() {
        for layout in ["cards", "list", "compact", "hero", "ticker"] {
            let html = render(layout, &articles(3));
            assert!(
                html.contains(r#"href="https://news.mukoko.com/article/a0""#),
                "{layout}"
            );
            assert!(html.contains(r#"target="_blank""#), "{layout}");
            assert!(html.contains(r#"rel="noopener noreferrer""#), "{layout}");
        }
    }

    #[test]
    fn list_layouts_render_count_and_discover_footer() {
        for layout in ["cards", "list", "compact"] {
            let html = render(layout, &articles(3));
            assert!(html.contains("3 stories"), "{layout}");
            assert!(html.contains("More on Mukoko News"), "{layout}");
            assert!(
                html.contains("https://news.mukoko.com/discover?country=KE"),
                "{layout}"
            );
        }
    }

    #[test]
    fn headline_layouts_show_empty_state() {
        for layout in ["hero", "ticker"] {
            let html = render(layout, &[]);
            assert!(html.contains("No stories available"), "{layout}");
        }
    }

    #[test]
    fn hero_renders_only_the_lead_article() {
        let html = render("hero", &articles(4));
        assert!(html.contains("Headline 0"));
        assert!(!html.contains("Headline 1"));
    }

    #[test]
    fn unsafe_image_never_reaches_inline_style() {
        let mut items = articles(1);
        items[0].image_url = Some("javascript:alert(1)".to_string());
        for layout in ["cards", "list", "compact", "hero", "ticker"] {
            let html = render(layout, &items);
            assert!(!html.contains("javascript:"), "{layout}");
            assert!(!html.contains("background-image"), "{layout}");
        }
    }

    #[test]
    fn safe_image_becomes_background() {
        let mut items = articles(1);
        items[0].image_url = Some("https://cdn.mukoko.com/a.jpg".to_string());
        let html = render("cards", &items);
        assert!(html.contains("background-image:url("));
        assert!(html.contains("https://cdn.mukoko.com/a.jpg"));
    }

    #[test]
    fn state_rendering_follows_phase() {
        let config = config("cards");
        let links = links();
        let context = WidgetRenderContext {
            session_id: Uuid::nil(),
            config: &config,
            links: &links,
            now: NOW,
        };

        let mut snapshot = WidgetSnapshot {
            phase: WidgetPhase::Error,
            articles: Arc::from(Vec::new()),
            revision: 1,
        };
        let html = render_widget_state(&snapshot, &context).expect("error state");
        assert!(html.contains("Unable to load stories right now."));
        assert!(html.contains("Try again"));
        assert!(html.contains(&format!("/embed/iframe/{}/retry", Uuid::nil())));

        snapshot.phase = WidgetPhase::Refreshing;
        snapshot.articles = Arc::from(articles(2));
        let html = render_widget_state(&snapshot, &context).expect("refreshing state");
        assert!(html.contains("Headline 1"));
        assert!(html.contains(r#"aria-busy="true""#));
        assert!(html.contains("disabled"));

        snapshot.phase = WidgetPhase::Ready;
        let html = render_widget_state(&snapshot, &context).expect("ready state");
        assert!(html.contains(r#"id="widget-root""#));
        assert!(!html.contains(r#"aria-busy="true""#));
        assert!(html.contains("🇰🇪 Kenya"));
    }
}
