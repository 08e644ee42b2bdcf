use anyhow::{Context, Result};
use clap::Parser;
use telegram_gateway::config::DEFAULT_CONFIG_PATH;
use telegram_gateway::{create_router, AppState, Config, Gateway, TelegramClient};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "telegram-gateway")]
#[command(about = "HTTP API over a Telegram account")]
struct Args {
    /// Config file path (extension optional)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Override the bind address
    #[arg(long)]
    bind: Option<String>,

    /// Override the HTTP port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,telegram_gateway=debug".into()),
        )
        .init();

    let args = Args::parse();

    let mut cfg = Config::load(&args.config)?;
    if let Some(bind) = args.bind {
        cfg.service.http.bind = bind;
    }
    if let Some(port) = args.port {
        cfg.service.http.port = port;
    }

    // Abort before connecting or binding anything
    let credentials = cfg.telegram.credentials()?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!("Session file: {}", cfg.telegram.session_path.display());

    let client = TelegramClient::connect(&credentials, &cfg.telegram.session_path).await?;
    let gateway = Gateway::spawn(Box::new(client));

    let app = create_router(AppState::new(gateway.handle()));

    let addr = cfg.http_addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            gateway.shutdown().await?;
            return Err(e).with_context(|| format!("Failed to bind {}", addr));
        }
    };
    info!("HTTP server listening on {}", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    info!("HTTP server stopped, disconnecting from Telegram");
    gateway.shutdown().await?;

    served.context("HTTP server error")?;
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
