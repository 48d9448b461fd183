//! Domain layer: the widget parameter schema and article presentation rules.

pub mod article;
pub mod country;
pub mod params;
pub mod widget;
