//! Roompass CLI entry point

mod cli;

use crate::cli::{Cli, Commands};
use anyhow::{Context, Result};
use clap::Parser;
use roompass::server::{run_server, AppState};
use roompass::{IssuerConfig, TokenIssuer, TokenVerifier};
use std::net::SocketAddr;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = cli.issuer_config();

    match cli.command {
        Commands::Serve { bind } => serve(config, bind, cli.environment).await,
        Commands::Issue { room } => issue(config, room),
        Commands::Inspect { token } => inspect(config, &token),
    }
}

async fn serve(config: IssuerConfig, bind: String, environment: String) -> Result<()> {
    let bind_addr: SocketAddr = bind.parse().context("Invalid bind address")?;

    if let Err(e) = config.credentials() {
        // Requests will get a 500 until this is fixed
        warn!(error = %e, "Issuer is not fully configured");
    }

    info!(
        addr = %bind_addr,
        environment = %environment,
        room_policy = %config.room_policy,
        "Roompass starting"
    );

    let state = AppState::new(TokenIssuer::new(config), environment);
    run_server(bind_addr, state, shutdown_signal()).await?;

    info!("Roompass stopped");
    Ok(())
}

fn issue(config: IssuerConfig, room: Option<String>) -> Result<()> {
    let issuer = TokenIssuer::new(config);
    let token = issuer
        .issue_for_room(room.as_deref())
        .context("Failed to issue token")?;

    let claims = token.claims();

    println!("{}", token);
    println!();
    println!("Token ID: {}", claims.jti);
    for channel in &claims.scope.app.channels {
        println!("Room:     {} {}", channel.name, channel.actions);
    }
    println!("Expires:  {} ({}s)", claims.exp, claims.lifetime());

    Ok(())
}

fn inspect(config: IssuerConfig, token: &str) -> Result<()> {
    let secret = config
        .secret
        .context("ROOMPASS_SECRET or --secret required to verify tokens")?;

    let claims = TokenVerifier::new(secret)
        .verify(token)
        .context("Token rejected")?;

    println!("{}", serde_json::to_string_pretty(&claims)?);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received, stopping server");
}
