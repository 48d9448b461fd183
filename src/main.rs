use std::{process, sync::Arc};

use mukoko_embed::{
    application::{
        content::ContentApi,
        error::AppError,
        mount::{Mounter, resolve_origin},
    },
    config::{self, MountArgs},
    infra::{
        content_api::HttpContentApi,
        error::InfraError,
        host_page::HostPageMounter,
        http::{self, EmbedState, SessionRegistry},
        telemetry,
    },
    presentation::views::SiteLinks,
};
use tokio::io::AsyncWriteExt;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;
    telemetry::describe_metrics();

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Mount(args) => run_mount(settings, args).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let content: Arc<dyn ContentApi> = Arc::new(HttpContentApi::new(&settings.content_api)?);
    let embed = &settings.embed;

    let state = EmbedState {
        content,
        sessions: SessionRegistry::new(),
        links: Arc::new(SiteLinks::new(embed.site_url.clone(), embed.brand.clone())),
        mounter: Arc::new(Mounter::new(
            embed.public_origin.clone(),
            embed.brand.clone(),
        )),
        refresh_interval: embed.refresh_interval,
    };
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "mukoko_embed::server",
        addr = %settings.server.addr,
        public_origin = %embed.public_origin,
        content_api = %settings.content_api.base_url,
        "embed service listening"
    );

    let server =
        axum::serve(listener, router.into_make_service()).with_graceful_shutdown(shutdown_signal());
    let grace = settings.server.graceful_shutdown;

    // Live widget streams never end on their own; bound the drain.
    tokio::select! {
        result = server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        () = async {
            shutdown_signal().await;
            tokio::time::sleep(grace).await;
        } => {
            warn!(
                target = "mukoko_embed::server",
                grace_seconds = grace.as_secs(),
                "graceful shutdown timed out; closing live sessions"
            );
        }
    }

    Ok(())
}

async fn run_mount(settings: config::Settings, args: MountArgs) -> Result<(), AppError> {
    let default_origin = resolve_origin(&settings.embed.public_origin, args.base_url.as_deref());
    let mounter = HostPageMounter::new(default_origin, settings.embed.brand.clone());

    let html = tokio::fs::read_to_string(&args.input)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    let report = mounter
        .mount_document(&html)
        .map_err(|err| AppError::unexpected(err.to_string()))?;

    info!(
        target = "mukoko_embed::mount",
        input = %args.input.display(),
        mounted = report.mounted,
        skipped = report.skipped,
        failed = report.failed,
        "host document processed"
    );

    match args.output {
        Some(path) => tokio::fs::write(&path, report.html.as_bytes()).await,
        None => {
            let mut stdout = tokio::io::stdout();
            match stdout.write_all(report.html.as_bytes()).await {
                Ok(()) => stdout.flush().await,
                Err(err) => Err(err),
            }
        }
    }
    .map_err(|err| AppError::from(InfraError::from(err)))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(
            target = "mukoko_embed::server",
            error = %err,
            "failed to listen for shutdown signal"
        );
        std::future::pending::<()>().await;
    }
    info!(target = "mukoko_embed::server", "shutdown signal received");
}
