use anyhow::{Context, Result};
use clap::Parser;
use guide_notifier::cli_style::{self, get_styles};
use guide_notifier::config::{
    CliConfig, PermissionMode, DEFAULT_INTERVAL_SECS, DEFAULT_RUN_ONCE_DELAY_SECS,
};
use guide_notifier::controller::format_interval;
use guide_notifier::delivery::ConsoleSurface;
use guide_notifier::shell::Shell;
use guide_notifier::{metrics, App, AppConfig, FileConfig, PermissionControl};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(styles = get_styles(), version = env!("APP_VERSION"))]
struct CliArgs {
    /// Path to a TOML config file. Its values override the flags below.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Seconds between periodic notifications.
    #[clap(long, default_value_t = DEFAULT_INTERVAL_SECS)]
    pub interval_secs: u64,

    /// Seconds to wait before a one-off notification.
    #[clap(long, default_value_t = DEFAULT_RUN_ONCE_DELAY_SECS)]
    pub run_once_delay_secs: u64,

    /// Serve Prometheus metrics on this port. Disabled when omitted or 0.
    #[clap(long)]
    pub metrics_port: Option<u16>,

    /// How notification permission is obtained.
    #[clap(long, value_enum, default_value_t = PermissionMode::Prompt)]
    pub permission: PermissionMode,

    /// Start the periodic job right away and run without the shell until Ctrl-C.
    #[clap(long)]
    pub headless: bool,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            interval_secs: self.interval_secs,
            run_once_delay_secs: self.run_once_delay_secs,
            metrics_port: self.metrics_port,
            permission: self.permission,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}...", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)
        .context("Invalid configuration")?;

    metrics::init_metrics();
    if let Some(port) = config.metrics_port {
        tokio::spawn(async move {
            if let Err(e) = metrics::run_metrics_server(port).await {
                error!("Metrics server failed: {:#}", e);
            }
        });
    }

    let permission = PermissionControl::from_mode(config.permission);
    let app = App::build(config, Arc::new(ConsoleSurface::new()), permission)?;

    if cli_args.headless {
        run_headless(&app).await
    } else {
        run_interactive(&app).await
    }
}

async fn run_headless(app: &App) -> Result<()> {
    if matches!(app.permission, PermissionControl::Interactive(_)) {
        warn!(
            "Permission prompts cannot be answered in headless mode, \
             notifications stay suppressed"
        );
    }

    info!("{}", app.controller.start_periodic());
    info!("Press Ctrl-C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    info!("Shutting down...");
    app.shutdown();
    Ok(())
}

async fn run_interactive(app: &App) -> Result<()> {
    let granted = if app.controller.permission_granted() {
        "granted"
    } else {
        "not granted"
    };
    cli_style::print_welcome(&[
        ("Version", env!("APP_VERSION").to_string()),
        ("Job", app.config.job_name.clone()),
        ("Interval", format_interval(app.config.interval)),
        ("Landmarks", app.config.catalog.len().to_string()),
        ("Permission", granted.to_string()),
        ("Status", app.controller.status()),
    ]);

    let shell = Shell::new(
        Arc::clone(&app.controller),
        app.permission.clone(),
        Arc::clone(&app.surface),
    );
    tokio::task::spawn_blocking(move || shell.run())
        .await
        .context("Shell task panicked")??;

    app.shutdown();
    cli_style::print_goodbye();
    Ok(())
}
