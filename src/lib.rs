//! Embeddable Mukoko News widget: host-page mounting and the sandboxed
//! iframe rendering service.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
