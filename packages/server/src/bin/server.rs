use anyhow::Context;
use clap::Parser;
use homepage_builder::JsonFileSectionStore;
use homepage_server::{router, start_reminders, AppState, Config, DEFAULT_CONFIG_NAME};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Homepage builder server
#[derive(Parser, Debug)]
#[command(name = "homepage-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_NAME)]
    config: PathBuf,

    /// HTTP port (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Do not start the appointment reminder task
    #[arg(long)]
    no_reminders: bool,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = Config::load(&args.config)?;
    let port = args.port.unwrap_or(config.port);

    let sections_path = config.sections_file(&args.config);
    tracing::info!(sections = %sections_path.display(), "Loading homepage sections");

    let store = Arc::new(JsonFileSectionStore::new(sections_path));
    let state = AppState::load(store, config.builder.clone()).await;

    let reminders = if config.reminders.enabled && !args.no_reminders {
        Some(start_reminders(&config, &args.config).await?)
    } else {
        tracing::info!("Reminder task disabled");
        None
    };

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Homepage server listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    if let Some(task) = reminders {
        task.stop().await;
    }

    tracing::info!("Homepage server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
