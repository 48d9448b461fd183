//! Rendering endpoint handlers: frame shell, live stream, user actions.

use std::{convert::Infallible, sync::Arc};

use async_stream::stream;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use time::OffsetDateTime;
use tracing::{error, info};
use url::form_urlencoded;
use uuid::Uuid;

use crate::{
    application::{
        error::HttpError,
        session::WidgetSession,
        stream::{document_class_event, empty_ack, live_response, widget_patch},
        theme::{DocumentClasses, ThemeBinding},
    },
    domain::widget::{RawWidgetParams, WidgetConfig},
    presentation::views::{
        DATASTAR_SCRIPT_URL, FrameTemplate, STYLESHEET_PATH, TemplateRenderError,
        WidgetRenderContext, render_loading, render_template_response, render_widget_state,
    },
};

use super::EmbedState;

/// `GET /embed/iframe`: the sandbox document in its Loading state.
pub(super) async fn frame(
    State(state): State<EmbedState>,
    Query(raw): Query<RawWidgetParams>,
) -> Response {
    let config = WidgetConfig::parse(&raw);
    let session_id = Uuid::new_v4();

    let initial = match render_loading(config.layout, config.limit) {
        Ok(html) => html,
        Err(err) => return template_error("infra::http::embed::frame", err),
    };

    let document = DocumentClasses::default();
    let _theme = ThemeBinding::apply(config.theme, &document);

    let template = FrameTemplate {
        html_class: document.attribute_value(),
        title: format!(
            "{} {} — {}",
            config.country.name(),
            config.feed_type.label(),
            state.links.brand()
        ),
        stylesheet: STYLESHEET_PATH,
        datastar_src: DATASTAR_SCRIPT_URL,
        live_url: format!("/embed/iframe/live/{session_id}?{}", encode_query(&config)),
        initial,
    };

    let mut response = render_template_response(template, StatusCode::OK);
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

/// `GET /embed/iframe/live/{session_id}`: one mounted widget session.
///
/// The session lives exactly as long as this stream. When the iframe goes
/// away the stream is dropped, which drops the lease and unmounts.
pub(super) async fn live(
    State(state): State<EmbedState>,
    Path(session_id): Path<Uuid>,
    Query(raw): Query<RawWidgetParams>,
) -> Response {
    let config = WidgetConfig::parse(&raw);
    let session = WidgetSession::mount(
        config,
        Arc::clone(&state.content),
        DocumentClasses::default(),
        state.refresh_interval,
    );
    let lease = state.sessions.open(session_id, session);

    info!(
        target = "mukoko_embed::http::embed",
        session_id = %session_id,
        country = lease.session().config().country.code(),
        layout = lease.session().config().layout.as_str(),
        "live session opened"
    );

    let links = Arc::clone(&state.links);
    let events = stream! {
        let lease = lease;
        let session = Arc::clone(lease.session());
        let mut updates = session.subscribe();

        yield Ok::<_, Infallible>(document_class_event(&session.document().attribute_value()));

        let loader = Arc::clone(&session);
        tokio::spawn(async move { loader.load().await });

        loop {
            // A reconnect under the same id unmounts this session.
            if !session.is_mounted() {
                break;
            }
            let snapshot = updates.borrow_and_update().clone();
            let context = WidgetRenderContext {
                session_id: lease.id(),
                config: session.config(),
                links: &links,
                now: OffsetDateTime::now_utc(),
            };
            match render_widget_state(&snapshot, &context) {
                Ok(html) => {
                    yield Ok(widget_patch(html));
                }
                Err(err) => {
                    error!(
                        target = "mukoko_embed::http::embed",
                        session_id = %lease.id(),
                        phase = snapshot.phase.as_str(),
                        error = %err,
                        "failed to render widget state"
                    );
                }
            }

            if updates.changed().await.is_err() {
                break;
            }
        }
    };

    live_response(events)
}

/// `POST /embed/iframe/{session_id}/refresh`
pub(super) async fn refresh(
    State(state): State<EmbedState>,
    Path(session_id): Path<Uuid>,
) -> Response {
    match state.sessions.get(&session_id) {
        Some(session) => {
            tokio::spawn(async move { session.refresh().await });
            empty_ack()
        }
        None => unknown_session("infra::http::embed::refresh", session_id),
    }
}

/// `POST /embed/iframe/{session_id}/retry`
pub(super) async fn retry(
    State(state): State<EmbedState>,
    Path(session_id): Path<Uuid>,
) -> Response {
    match state.sessions.get(&session_id) {
        Some(session) => {
            tokio::spawn(async move { session.retry().await });
            empty_ack()
        }
        None => unknown_session("infra::http::embed::retry", session_id),
    }
}

/// `GET /embed/snippet`: iframe markup for copy-paste embedding.
pub(super) async fn snippet(
    State(state): State<EmbedState>,
    Query(raw): Query<RawWidgetParams>,
) -> Response {
    match state.mounter.plan(&raw).render() {
        Ok(html) => Html(html).into_response(),
        Err(err) => template_error("infra::http::embed::snippet", err),
    }
}

fn encode_query(config: &WidgetConfig) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(config.query_pairs())
        .finish()
}

fn unknown_session(source: &'static str, session_id: Uuid) -> Response {
    HttpError::new(
        source,
        StatusCode::NOT_FOUND,
        "Unknown widget session",
        format!("no live session `{session_id}`"),
    )
    .into_response()
}

fn template_error(source: &'static str, err: askama::Error) -> Response {
    HttpError::from(TemplateRenderError::new(
        source,
        "Template rendering failed",
        err,
    ))
    .into_response()
}
