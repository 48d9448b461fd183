//! Theme application on the iframe document root.

use std::{
    collections::BTreeSet,
    sync::{Arc, Mutex, PoisonError},
};

use crate::domain::params::Theme;

/// Class list of the rendering document's root element.
#[derive(Debug, Clone, Default)]
pub struct DocumentClasses {
    inner: Arc<Mutex<BTreeSet<String>>>,
}

impl DocumentClasses {
    pub fn add(&self, class: &str) {
        self.lock().insert(class.to_string());
    }

    pub fn remove(&self, class: &str) {
        self.lock().remove(class);
    }

    pub fn contains(&self, class: &str) -> bool {
        self.lock().contains(class)
    }

    /// Space-separated value for a `class` attribute.
    pub fn attribute_value(&self) -> String {
        self.lock()
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeSet<String>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Records which class a theme applied so it can be undone on unmount.
#[derive(Debug, Default)]
pub struct ThemeBinding {
    applied: Option<&'static str>,
}

impl ThemeBinding {
    /// `light`/`dark` set their class and clear the opposite; `auto` is a no-op.
    pub fn apply(theme: Theme, document: &DocumentClasses) -> Self {
        if let Some(opposite) = theme.opposite_class() {
            document.remove(opposite);
        }
        let applied = theme.document_class();
        if let Some(class) = applied {
            document.add(class);
        }
        Self { applied }
    }

    pub fn applied(&self) -> Option<&'static str> {
        self.applied
    }

    pub fn release(&mut self, document: &DocumentClasses) {
        if let Some(class) = self.applied.take() {
            document.remove(class);
        }
    }
}
