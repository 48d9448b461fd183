//! Helpers for building server-driven datastar SSE responses.

use std::convert::Infallible;

use axum::response::{
    IntoResponse, Response,
    sse::{Event, KeepAlive, Sse},
};
use datastar::prelude::{ElementPatchMode, ExecuteScript, PatchElements};

/// Selector of the element every widget patch replaces.
pub const WIDGET_ROOT_SELECTOR: &str = "#widget-root";

/// A single element patch as an SSE event.
fn patch_event(html: String, selector: &str, mode: ElementPatchMode) -> Event {
    PatchElements::new(html)
        .selector(selector)
        .mode(mode)
        .write_as_axum_sse_event()
}

/// Replace the widget root with freshly rendered markup.
pub fn widget_patch(html: String) -> Event {
    patch_event(html, WIDGET_ROOT_SELECTOR, ElementPatchMode::Outer)
}

/// Replace the class list of the frame's `<html>` element.
pub fn document_class_event(classes: &str) -> Event {
    let literal = serde_json::Value::String(classes.to_string());
    ExecuteScript::new(format!("document.documentElement.className = {literal};"))
        .write_as_axum_sse_event()
}

/// Acknowledge a datastar action with an empty event stream.
///
/// The resulting state change reaches the frame through its live stream.
pub fn empty_ack() -> Response {
    Sse::new(futures::stream::empty::<Result<Event, Infallible>>()).into_response()
}

/// Wrap a long-lived event stream with keep-alive comments.
pub fn live_response<S>(events: S) -> Response
where
    S: futures::Stream<Item = Result<Event, Infallible>> + Send + 'static,
{
    Sse::new(events)
        .keep_alive(KeepAlive::default())
        .into_response()
}

#[cfg(test)]
mod tests {
    use axum::http::{StatusCode, header};
    use http_body_util::BodyExt;

    use super::*;

    #[tokio::test]
    async fn empty_ack_is_a_finished_event_stream() {
        let response = empty_ack();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .expect("content-type"),
            "text/event-stream"
        );

        let body = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        assert!(body.is_empty());
    }
}
