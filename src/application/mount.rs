//! Host-page mounting: turn a placeholder element into a sandboxed iframe.

use askama::Template;
use metrics::counter;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::{
    domain::{
        params::{FeedType, ParamKey},
        widget::{RawWidgetParams, WidgetConfig},
    },
    presentation::views::IframeTemplate,
};

/// Presence flag on host-page placeholders.
pub const EMBED_ATTRIBUTE: &str = "data-mukoko-embed";
/// One-way marker written on a placeholder once it has been mounted.
pub const MOUNTED_ATTRIBUTE: &str = "data-mukoko-mounted";
/// Script-tag attribute overriding the rendering origin.
pub const BASE_URL_ATTRIBUTE: &str = "data-base-url";
/// Path of the rendering endpoint on the widget origin.
pub const RENDER_PATH: &str = "/embed/iframe";

pub const IFRAME_SANDBOX: &str = "allow-scripts allow-popups allow-popups-to-escape-sandbox";
pub const IFRAME_ALLOW: &str = "clipboard-write";
pub const IFRAME_STYLE: &str = "border:0;border-radius:12px;max-width:100%;overflow:hidden;";

#[derive(Debug, Error)]
pub enum MountError {
    #[error("failed to set attribute `{name}`: {message}")]
    Attribute { name: &'static str, message: String },
    #[error("failed to render iframe markup: {0}")]
    Template(#[from] askama::Error),
}

impl MountError {
    pub fn attribute(name: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Attribute {
            name,
            message: err.to_string(),
        }
    }
}

/// The DOM surface the mounting logic needs from a placeholder.
pub trait PlaceholderElement {
    fn attribute(&self, name: &str) -> Option<String>;
    fn set_attribute(&mut self, name: &'static str, value: &str) -> Result<(), MountError>;
    fn append_html(&mut self, html: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountOutcome {
    Mounted(IframeSpec),
    AlreadyMounted,
}

/// Everything that ends up on the injected `<iframe>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IframeSpec {
    pub src: Url,
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl IframeSpec {
    pub fn render(&self) -> Result<String, askama::Error> {
        IframeTemplate {
            src: self.src.as_str(),
            width: self.width,
            height: self.height,
            title: &self.title,
            style: IFRAME_STYLE,
            allow: IFRAME_ALLOW,
            sandbox: IFRAME_SANDBOX,
        }
        .render()
    }
}

/// Builds iframe specs against one rendering origin.
#[derive(Debug, Clone)]
pub struct Mounter {
    origin: Url,
    brand: String,
}

impl Mounter {
    pub fn new(origin: Url, brand: impl Into<String>) -> Self {
        Self {
            origin,
            brand: brand.into(),
        }
    }

    pub fn plan(&self, raw: &RawWidgetParams) -> IframeSpec {
        let config = WidgetConfig::parse(raw);
        IframeSpec {
            src: iframe_url(&self.origin, &config),
            width: config.width,
            height: config.height,
            title: format!(
                "{} {} — {}",
                config.country.code(),
                type_label(raw.get(ParamKey::Type)),
                self.brand
            ),
        }
    }
}

/// Mount one placeholder. Re-mounting an already marked element is a no-op.
pub fn mount<E>(element: &mut E, mounter: &Mounter) -> Result<MountOutcome, MountError>
where
    E: PlaceholderElement + ?Sized,
{
    if element.attribute(MOUNTED_ATTRIBUTE).is_some() {
        return Ok(MountOutcome::AlreadyMounted);
    }
    // Marked before anything fallible so a failing element is never retried.
    element.set_attribute(MOUNTED_ATTRIBUTE, "true")?;

    let raw = RawWidgetParams::from_lookup(|key| element.attribute(key.attribute()));
    let spec = mounter.plan(&raw);
    let html = spec.render()?;
    element.append_html(&html);

    counter!("mukoko_embed_mounted_total").increment(1);
    Ok(MountOutcome::Mounted(spec))
}

/// Iframe URL: rendering path plus the ordered, validated query.
pub fn iframe_url(origin: &Url, config: &WidgetConfig) -> Url {
    let mut url = origin.clone();
    url.set_path(RENDER_PATH);
    url.set_query(None);
    url.set_fragment(None);
    url.query_pairs_mut().extend_pairs(config.query_pairs());
    url
}

/// Use `candidate` as the rendering origin when it is an absolute http(s)
/// URL with a host; otherwise keep `default`.
pub fn resolve_origin(default: &Url, candidate: Option<&str>) -> Url {
    let Some(raw) = candidate.map(str::trim).filter(|value| !value.is_empty()) else {
        return default.clone();
    };

    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => url,
        _ => {
            debug!(
                target = "mukoko_embed::mount",
                candidate = raw,
                "ignoring malformed base url override"
            );
            default.clone()
        }
    }
}

/// Accessible label for the raw `type` attribute; unknown values read "News".
pub fn type_label(raw: Option<&str>) -> &'static str {
    match raw {
        None => FeedType::default().label(),
        Some(value) => FeedType::from_raw(value).map_or("News", FeedType::label),
    }
}
