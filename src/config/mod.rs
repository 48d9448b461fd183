//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "mukoko-embed";
const ENV_PREFIX: &str = "MUKOKO_EMBED";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 10;
const DEFAULT_CONTENT_API_BASE_URL: &str = "https://api.news.mukoko.com";
const DEFAULT_ARTICLES_PATH: &str = "/api/articles";
const DEFAULT_CONTENT_API_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_PUBLIC_ORIGIN: &str = "https://news.mukoko.com";
const DEFAULT_SITE_URL: &str = "https://news.mukoko.com";
pub const DEFAULT_BRAND: &str = "Mukoko News";
const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 300;

/// Command-line arguments for the embed service binary.
#[derive(Debug, Parser)]
#[command(
    name = "mukoko-embed",
    version,
    about = "Embeddable Mukoko News widget service"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "MUKOKO_EMBED_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the widget rendering service.
    Serve(Box<ServeArgs>),
    /// Mount every widget placeholder in a host HTML document.
    Mount(MountArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the content API base URL.
    #[arg(long = "content-api-base-url", value_name = "URL", value_hint = ValueHint::Url)]
    pub content_api_base_url: Option<String>,

    /// Override the content API request timeout.
    #[arg(long = "content-api-timeout-seconds", value_name = "SECONDS")]
    pub content_api_timeout_seconds: Option<u64>,

    /// Override the public origin the widget is served from.
    #[arg(long = "public-origin", value_name = "URL", value_hint = ValueHint::Url)]
    pub public_origin: Option<String>,

    /// Override the auto-refresh period of live widgets.
    #[arg(long = "refresh-interval-seconds", value_name = "SECONDS")]
    pub refresh_interval_seconds: Option<u64>,
}

#[derive(Debug, Args, Clone)]
pub struct MountArgs {
    /// Host HTML document containing `data-mukoko-embed` placeholders.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Rendering origin, unless the document's script tag overrides it.
    /// A malformed value falls back to `embed.public_origin`.
    #[arg(long = "base-url", value_name = "URL", value_hint = ValueHint::Url)]
    pub base_url: Option<String>,

    /// Write the mounted document here instead of stdout.
    #[arg(long, short, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub content_api: ContentApiSettings,
    pub embed: EmbedSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct ContentApiSettings {
    pub base_url: Url,
    pub articles_path: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct EmbedSettings {
    /// Origin serving `/embed/iframe`; the default for mounted iframes.
    pub public_origin: Url,
    /// Main news site that article and discover links point to.
    pub site_url: Url,
    pub brand: String,
    pub refresh_interval: Duration,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Mount(_)) => {}
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    content_api: RawContentApiSettings,
    embed: RawEmbedSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.content_api_base_url.as_ref() {
            self.content_api.base_url = Some(url.clone());
        }
        if let Some(seconds) = overrides.content_api_timeout_seconds {
            self.content_api.timeout_seconds = Some(seconds);
        }
        if let Some(origin) = overrides.public_origin.as_ref() {
            self.embed.public_origin = Some(origin.clone());
        }
        if let Some(seconds) = overrides.refresh_interval_seconds {
            self.embed.refresh_interval_seconds = Some(seconds);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            content_api,
            embed,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            content_api: build_content_api_settings(content_api)?,
            embed: build_embed_settings(embed)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr =
        parse_socket_addr(&host, port).map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_shutdown = positive_seconds(
        server.graceful_shutdown_seconds,
        DEFAULT_GRACEFUL_SHUTDOWN_SECS,
        "server.graceful_shutdown_seconds",
    )?;

    Ok(ServerSettings {
        addr,
        graceful_shutdown,
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_content_api_settings(
    content_api: RawContentApiSettings,
) -> Result<ContentApiSettings, LoadError> {
    let base_url = http_url(
        content_api.base_url.as_deref(),
        DEFAULT_CONTENT_API_BASE_URL,
        "content_api.base_url",
    )?;

    let articles_path = content_api
        .articles_path
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_ARTICLES_PATH.to_string());
    if !articles_path.starts_with('/') {
        return Err(LoadError::invalid(
            "content_api.articles_path",
            "must start with `/`",
        ));
    }

    let timeout = positive_seconds(
        content_api.timeout_seconds,
        DEFAULT_CONTENT_API_TIMEOUT_SECS,
        "content_api.timeout_seconds",
    )?;

    Ok(ContentApiSettings {
        base_url,
        articles_path,
        timeout,
    })
}

fn build_embed_settings(embed: RawEmbedSettings) -> Result<EmbedSettings, LoadError> {
    let public_origin = http_url(
        embed.public_origin.as_deref(),
        DEFAULT_PUBLIC_ORIGIN,
        "embed.public_origin",
    )?;
    let site_url = http_url(embed.site_url.as_deref(), DEFAULT_SITE_URL, "embed.site_url")?;

    let brand = embed
        .brand
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_BRAND.to_string());

    let refresh_interval = positive_seconds(
        embed.refresh_interval_seconds,
        DEFAULT_REFRESH_INTERVAL_SECS,
        "embed.refresh_interval_seconds",
    )?;

    Ok(EmbedSettings {
        public_origin,
        site_url,
        brand,
        refresh_interval,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawContentApiSettings {
    base_url: Option<String>,
    articles_path: Option<String>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawEmbedSettings {
    public_origin: Option<String>,
    site_url: Option<String>,
    brand: Option<String>,
    refresh_interval_seconds: Option<u64>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn positive_seconds(
    value: Option<u64>,
    default: u64,
    key: &'static str,
) -> Result<Duration, LoadError> {
    match value.unwrap_or(default) {
        0 => Err(LoadError::invalid(key, "must be greater than zero")),
        secs => Ok(Duration::from_secs(secs)),
    }
}

fn http_url(value: Option<&str>, default: &str, key: &'static str) -> Result<Url, LoadError> {
    let raw = value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(default);

    let url = Url::parse(raw).map_err(|err| LoadError::invalid(key, format!("`{raw}`: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(LoadError::invalid(
            key,
            format!("`{raw}` must be an absolute http(s) URL"),
        ));
    }
    Ok(url)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

        assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
        assert_eq!(
            settings.embed.public_origin.as_str(),
            "https://news.mukoko.com/"
        );
        assert_eq!(settings.embed.brand, "Mukoko News");
        assert_eq!(settings.embed.refresh_interval, Duration::from_secs(300));
        assert_eq!(settings.content_api.articles_path, "/api/articles");
        assert!(matches!(settings.logging.format, LogFormat::Compact));
    }

    #[test]
    fn cli_overrides_take_highest_precedence() {
        let mut raw = RawSettings::default();
        raw.server.port = Some(4000);
        raw.logging.level = Some("info".to_string());
        raw.embed.public_origin = Some("https://embed.example".to_string());

        let overrides = ServeOverrides {
            server_port: Some(4321),
            log_level: Some("debug".to_string()),
            public_origin: Some("https://staging.mukoko.com".to_string()),
            ..Default::default()
        };

        raw.apply_serve_overrides(&overrides);
        let settings = Settings::from_raw(raw).expect("valid settings");

        assert_eq!(settings.server.addr.port(), 4321);
        assert_eq!(settings.logging.level, LevelFilter::DEBUG);
        assert_eq!(
            settings.embed.public_origin.host_str(),
            Some("staging.mukoko.com")
        );
    }

    #[test]
    fn cli_json_logging_enforces_format() {
        let mut raw = RawSettings::default();
        let overrides = ServeOverrides {
            log_json: Some(true),
            ..Default::default()
        };

        raw.apply_serve_overrides(&overrides);
        let settings = Settings::from_raw(raw).expect("valid settings");

        assert!(matches!(settings.logging.format, LogFormat::Json));
    }

    #[test]
    fn zero_refresh_interval_is_rejected() {
        let mut raw = RawSettings::default();
        raw.embed.refresh_interval_seconds = Some(0);

        let err = Settings::from_raw(raw).expect_err("zero interval");
        assert!(matches!(
            err,
            LoadError::Invalid {
                key: "embed.refresh_interval_seconds",
                ..
            }
        ));
    }

    #[test]
    fn non_http_urls_are_rejected() {
        let mut raw = RawSettings::default();
        raw.content_api.base_url = Some("ftp://files.mukoko.com".to_string());
        let err = Settings::from_raw(raw).expect_err("ftp scheme");
        assert!(matches!(
            err,
            LoadError::Invalid {
                key: "content_api.base_url",
                ..
            }
        ));

        let mut raw = RawSettings::default();
        raw.embed.site_url = Some("not a url".to_string());
        assert!(Settings::from_raw(raw).is_err());
    }

    #[test]
    fn articles_path_must_be_absolute() {
        let mut raw = RawSettings::default();
        raw.content_api.articles_path = Some("api/articles".to_string());
        assert!(Settings::from_raw(raw).is_err());
    }

    #[test]
    fn config_file_sits_below_cli_overrides() {
        use std::io::Write;

        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp config");
        writeln!(
            file,
            "[embed]\nbrand = \"Mukoko Staging\"\nrefresh_interval_seconds = 90\n\n[server]\nport = 9000"
        )
        .expect("write config");

        let cli = CliArgs {
            config_file: Some(file.path().to_path_buf()),
            command: Some(Command::Serve(Box::new(ServeArgs {
                overrides: ServeOverrides {
                    server_port: Some(9100),
                    ..Default::default()
                },
            }))),
        };
        let settings = load(&cli).expect("layered settings");

        assert_eq!(settings.embed.brand, "Mukoko Staging");
        assert_eq!(settings.embed.refresh_interval, Duration::from_secs(90));
        assert_eq!(settings.server.addr.port(), 9100);
    }

    #[test]
    fn missing_config_file_fails() {
        let cli = CliArgs {
            config_file: Some(PathBuf::from("/nonexistent/mukoko-embed.toml")),
            command: None,
        };
        assert!(matches!(load(&cli), Err(LoadError::Build(_))));
    }

    #[test]
    fn default_to_serve_command() {
        let args = CliArgs::parse_from(["mukoko-embed"]);
        assert!(args.command.is_none());
    }

    #[test]
    fn parse_serve_overrides() {
        let args = CliArgs::parse_from([
            "mukoko-embed",
            "serve",
            "--server-host",
            "0.0.0.0",
            "--refresh-interval-seconds",
            "60",
        ]);

        match args.command.expect("serve command") {
            Command::Serve(serve) => {
                assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
                assert_eq!(serve.overrides.refresh_interval_seconds, Some(60));
            }
            _ => panic!("wrong command parsed"),
        }
    }

    #[test]
    fn parse_mount_arguments() {
        let args = CliArgs::parse_from([
            "mukoko-embed",
            "mount",
            "page.html",
            "--base-url",
            "https://staging.mukoko.com",
            "--output",
            "/tmp/out.html",
        ]);

        match args.command.expect("mount command") {
            Command::Mount(mount) => {
                assert_eq!(mount.input, PathBuf::from("page.html"));
                assert_eq!(
                    mount.base_url.as_deref(),
                    Some("https://staging.mukoko.com")
                );
                assert_eq!(mount.output, Some(PathBuf::from("/tmp/out.html")));
            }
            _ => panic!("wrong command parsed"),
        }
    }
}
