//! Mount widgets into a whole host HTML document with `lol_html`.

use std::{cell::RefCell, rc::Rc};

use lol_html::{
    RewriteStrSettings, element,
    html_content::{ContentType, Element},
    rewrite_str,
};
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::application::mount::{
    BASE_URL_ATTRIBUTE, MountError, MountOutcome, Mounter, PlaceholderElement,
    mount, resolve_origin,
};

impl PlaceholderElement for Element<'_, '_> {
    fn attribute(&self, name: &str) -> Option<String> {
        self.get_attribute(name)
    }

    fn set_attribute(&mut self, name: &'static str, value: &str) -> Result<(), MountError> {
        Element::set_attribute(self, name, value).map_err(|err| MountError::attribute(name, err))
    }

    fn append_html(&mut self, html: &str) {
        self.append(html, ContentType::Html);
    }
}

#[derive(Debug, Error)]
pub enum HostPageError {
    #[error("failed to rewrite host document: {0}")]
    Rewrite(String),
}

/// Result of mounting one host document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountReport {
    pub html: String,
    pub mounted: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    mounted: usize,
    skipped: usize,
    failed: usize,
}

#[derive(Debug, Clone)]
pub struct HostPageMounter {
    default_origin: Url,
    brand: String,
}

impl HostPageMounter {
    pub fn new(default_origin: Url, brand: impl Into<String>) -> Self {
        Self {
            default_origin,
            brand: brand.into(),
        }
    }

    /// Mount every `[data-mukoko-embed]` placeholder in `html`.
    ///
    /// A `<script data-base-url>` anywhere in the document overrides the
    /// rendering origin. Per-element failures are counted, never propagated.
    pub fn mount_document(&self, html: &str) -> Result<MountReport, HostPageError> {
        let override_url = self.base_url_override(html)?;
        let origin = resolve_origin(&self.default_origin, override_url.as_deref());
        let mounter = Mounter::new(origin, self.brand.clone());
        let tally = Rc::new(RefCell::new(Tally::default()));

        let rewritten = rewrite_str(
            html,
            RewriteStrSettings {
                element_content_handlers: vec![element!("[data-mukoko-embed]", {
                    let tally = Rc::clone(&tally);
                    move |el| {
                        let outcome = mount(el, &mounter);
                        let mut tally = tally.borrow_mut();
                        match outcome {
                            Ok(MountOutcome::Mounted(_)) => tally.mounted += 1,
                            Ok(MountOutcome::AlreadyMounted) => tally.skipped += 1,
                            Err(err) => {
                                tally.failed += 1;
                                warn!(
                                    target = "mukoko_embed::host_page",
                                    error = %err,
                                    "placeholder could not be mounted"
                                );
                            }
                        }
                        Ok(())
                    }
                })],
                ..RewriteStrSettings::default()
            },
        )
        .map_err(|err| HostPageError::Rewrite(err.to_string()))?;

        let Tally {
            mounted,
            skipped,
            failed,
        } = *tally.borrow();

        // Nothing mounted: hand the document back byte for byte.
        let html = if mounted == 0 && failed == 0 {
            html.to_string()
        } else {
            rewritten
        };

        Ok(MountReport {
            html,
            mounted,
            skipped,
            failed,
        })
    }

    fn base_url_override(&self, html: &str) -> Result<Option<String>, HostPageError> {
        let found: Rc<RefCell<Option<String>>> = Rc::new(RefCell::new(None));

        rewrite_str(
            html,
            RewriteStrSettings {
                element_content_handlers: vec![element!("script[data-base-url]", {
                    let found = Rc::clone(&found);
                    move |el| {
                        let mut found = found.borrow_mut();
                        if found.is_none() {
                            *found = el.get_attribute(BASE_URL_ATTRIBUTE);
                        }
                        Ok(())
                    }
                })],
                ..RewriteStrSettings::default()
            },
        )
        .map_err(|err| HostPageError::Rewrite(err.to_string()))?;

        let value = found.borrow().clone();
        Ok(value)
    }
}
