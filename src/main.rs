//! switchyard
//!
//! Mounts the configured API and serves it over HTTP.

use clap::Parser;
use std::sync::Arc;
use switchyard::{
    config::{AppConfig, LogFormat, load_config_with_profile},
    context::SharedContext,
    modules::ModuleRegistry,
    mount::{MountReport, mount_app},
    transport::{HttpConfig, run_http_blocking},
};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// switchyard - configuration-driven route and ACL mounting
#[derive(Parser, Debug)]
#[command(name = "switchyard")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "SWITCHYARD_CONFIG")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "SWITCHYARD_LOG_LEVEL")]
    log_level: Option<String>,

    /// Active profile (overrides the configuration and APP_ENV)
    #[arg(long)]
    profile: Option<String>,

    /// HTTP server host
    #[arg(long, env = "SWITCHYARD_HOST")]
    host: Option<String>,

    /// HTTP server port
    #[arg(long, env = "SWITCHYARD_PORT")]
    port: Option<u16>,

    /// Mount the API, print the report and exit without serving
    #[arg(long)]
    check: bool,
}

fn init_logging(args: &Args, config: &AppConfig) {
    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    match config.logging.format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

fn print_report(report: &MountReport) {
    for route in &report.mounted {
        info!(
            method = %route.method,
            url = %route.url,
            acl = %route.acl,
            module = %route.file_path,
            label = %route.label,
            "Route mounted"
        );
    }
    for route in &report.missing {
        warn!(
            method = %route.method,
            path = %route.path,
            acl = %route.acl,
            "Route has no handler"
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let args = Args::parse();

    // Configuration is loaded before logging so its level and format apply
    let config =
        match load_config_with_profile(args.config.as_deref(), args.profile.as_deref()) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load configuration: {}", e);
                return Err(e.into());
            }
        };

    init_logging(&args, &config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        profile = %config.profile,
        "Starting switchyard"
    );

    let mut registry = ModuleRegistry::new();
    registry
        .register_all_auto()
        .inspect_err(|e| error!(error = %e, "Failed to register modules"))?;

    #[cfg(feature = "builtin")]
    if config.api.builtin_modules {
        switchyard::builtin::register_builtin_modules(&mut registry, &config.api)
            .inspect_err(|e| error!(error = %e, "Failed to register builtin modules"))?;
    }

    let context = SharedContext::from_config(&config.context);
    let mounted = mount_app(&config, Arc::new(registry), context)
        .inspect_err(|e| error!(error = %e, "Failed to mount API"))?;

    print_report(mounted.report());

    if args.check {
        if mounted.report().is_complete() {
            info!("Configuration check passed");
            return Ok(());
        }
        anyhow::bail!(
            "{} route(s) have no handler",
            mounted.report().missing.len()
        );
    }

    let host = args.host.as_deref().unwrap_or(&config.server.host);
    let port = args.port.unwrap_or(config.server.port);
    let http_config = HttpConfig::from_host_port(host, port)?;

    run_http_blocking(mounted.into_router(), http_config).await
}
