//! Embedded widget stylesheet serving.

use axum::{
    body::Body,
    extract::Path,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use include_dir::{Dir, include_dir};
use mime_guess::Mime;

use crate::application::error::ErrorReport;

static EMBED_ASSETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/static/embed");

/// Serve embedded widget assets.
pub async fn serve_embed(path: Option<Path<String>>) -> Response {
    let captured = path.map(|Path(value)| value);
    match resolve_asset(&EMBED_ASSETS, captured) {
        Some((contents, mime)) => build_response(Bytes::from_static(contents), mime),
        None => not_found_response("infra::assets::serve_embed"),
    }
}

fn not_found_response(source: &'static str) -> Response {
    let mut response = StatusCode::NOT_FOUND.into_response();
    ErrorReport::from_message(source, StatusCode::NOT_FOUND, "Static asset not found")
        .attach(&mut response);
    response
}

fn resolve_asset(
    bundle: &'static Dir<'static>,
    path: Option<String>,
) -> Option<(&'static [u8], Mime)> {
    let candidate = path.unwrap_or_default();
    let candidate = candidate.trim_start_matches('/');

    if candidate.is_empty() || candidate.ends_with('/') || candidate.contains("..") {
        // No traversal, no directory listings.
        return None;
    }

    let file = bundle.get_file(candidate)?;
    let mime = mime_guess::from_path(candidate).first_or_octet_stream();
    Some((file.contents(), mime))
}

fn build_response(bytes: Bytes, mime: Mime) -> Response {
    let len = bytes.len();
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&len.to_string()) {
        headers.insert(header::CONTENT_LENGTH, value);
    }
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=31536000, immutable"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stylesheet_resolves_with_css_mime() {
        let (contents, mime) =
            resolve_asset(&EMBED_ASSETS, Some("widget.css".to_string())).expect("bundled");
        assert!(!contents.is_empty());
        assert_eq!(mime.essence_str(), "text/css");
    }

    #[test]
    fn traversal_and_directories_are_rejected() {
        for path in ["../Cargo.toml", "", "/", "nested/"] {
            assert!(resolve_asset(&EMBED_ASSETS, Some(path.to_string())).is_none(), "{path}");
        }
    }
}
