//! Logging Infrastructure
//!
//! Structured logging built on `tracing` layers. Console output is
//! human-readable in development and JSON in production. When a log
//! directory is supplied, two daily-rotated JSON files are written:
//!
//! - `app/trackd-YYYY-MM-DD.log` - application events, including
//!   `security`-target identity rejections
//! - `access/access-YYYY-MM-DD.log` - one `http_access` line per request
//!
//! `RUST_LOG` overrides the default filter when set.

use std::fs;
use std::path::Path;
use std::sync::Mutex;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer, filter::filter_fn, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Initialize the logging system.
///
/// `level` seeds the filter when `RUST_LOG` is unset. `json_console`
/// switches the console layer to JSON for production deployments; file
/// layers are always JSON. Fails when the log directories cannot be
/// created.
pub fn init_logger_with_file(
    level: Option<&str>,
    json_console: bool,
    log_dir: Option<&Path>,
) -> anyhow::Result<()> {
    let level = level.unwrap_or("info");
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if json_console {
        let console = fmt::layer().json().with_target(true);

        if let Some(dir) = log_dir {
            let (app_layer, access_layer) = file_layers(dir)?;
            registry
                .with(console)
                .with(app_layer.and_then(access_layer))
                .init();
        } else {
            registry.with(console).init();
        }
    } else {
        let console = fmt::layer()
            .with_target(true)
            .with_file(false)
            .with_line_number(false);

        if let Some(dir) = log_dir {
            let (app_layer, access_layer) = file_layers(dir)?;
            registry
                .with(console)
                .with(app_layer.and_then(access_layer))
                .init();
        } else {
            registry.with(console).init();
        }
    }

    Ok(())
}

/// Build the daily-rotated file layers: application events and the
/// request access log, split by target so app logs stay readable.
fn file_layers<S>(dir: &Path) -> anyhow::Result<(impl Layer<S>, impl Layer<S>)>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    let app_dir = dir.join("app");
    let access_dir = dir.join("access");
    fs::create_dir_all(&app_dir)?;
    fs::create_dir_all(&access_dir)?;

    let app_log = RollingFileAppender::new(Rotation::DAILY, app_dir, "trackd");
    let app_layer = fmt::layer()
        .json()
        .with_target(true)
        .with_writer(Mutex::new(app_log))
        .with_filter(filter_fn(|meta| meta.target() != "http_access"));

    let access_log = RollingFileAppender::new(Rotation::DAILY, access_dir, "access");
    let access_layer = fmt::layer()
        .json()
        .with_target(false)
        .with_writer(Mutex::new(access_log))
        .with_filter(filter_fn(|meta| meta.target() == "http_access"));

    Ok((app_layer, access_layer))
}
