mod embed;
mod middleware;
mod sessions;

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};

pub use middleware::RequestContext;
pub use sessions::{SessionLease, SessionRegistry};

use crate::{
    application::{content::ContentApi, mount::Mounter},
    infra::assets::serve_embed,
    presentation::views::SiteLinks,
};

#[derive(Clone)]
pub struct EmbedState {
    pub content: Arc<dyn ContentApi>,
    pub sessions: SessionRegistry,
    pub links: Arc<SiteLinks>,
    pub mounter: Arc<Mounter>,
    pub refresh_interval: Duration,
}

pub fn build_router(state: EmbedState) -> Router {
    let embed_routes = Router::new()
        .route("/embed/iframe", get(embed::frame))
        .route("/embed/iframe/live/{session_id}", get(embed::live))
        .route("/embed/iframe/{session_id}/refresh", post(embed::refresh))
        .route("/embed/iframe/{session_id}/retry", post(embed::retry))
        .route("/embed/snippet", get(embed::snippet))
        .route("/static/embed/{*path}", get(serve_embed))
        .layer(axum_middleware::from_fn(middleware::embed_cors));

    Router::new()
        .route("/_health", get(health))
        .merge(embed_routes)
        .with_state(state)
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
}

async fn health() -> Response {
    StatusCode::NO_CONTENT.into_response()
}
