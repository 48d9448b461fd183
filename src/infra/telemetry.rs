use std::sync::Once;

use metrics::{Unit, describe_counter, describe_gauge};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

/// Register descriptions for every metric the service emits. Idempotent.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "mukoko_embed_fetch_total",
            Unit::Count,
            "Total number of content API fetches issued by widget sessions."
        );
        describe_counter!(
            "mukoko_embed_fetch_failed_total",
            Unit::Count,
            "Total number of applied content API fetches that failed."
        );
        describe_counter!(
            "mukoko_embed_fetch_discarded_total",
            Unit::Count,
            "Total number of fetch results dropped as superseded or unmounted."
        );
        describe_gauge!(
            "mukoko_embed_live_sessions",
            Unit::Count,
            "Current number of mounted widget sessions."
        );
        describe_counter!(
            "mukoko_embed_mounted_total",
            Unit::Count,
            "Total number of placeholders mounted into iframes."
        );
    });
}
