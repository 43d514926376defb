//! CLI command definitions

use clap::{Parser, Subcommand};
use roompass::{IssuerConfig, RoomPolicy};

#[derive(Parser)]
#[command(name = "roompass")]
#[command(about = "Room-scoped access token issuer", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Application id embedded in every token scope
    #[arg(long, env = "ROOMPASS_APP_ID", global = true)]
    pub app_id: Option<String>,

    /// Token signing secret
    #[arg(long, env = "ROOMPASS_SECRET", global = true, hide_env_values = true)]
    pub secret: Option<String>,

    /// How room names are embedded: passthrough or sanitize
    #[arg(
        long,
        env = "ROOMPASS_ROOM_POLICY",
        global = true,
        default_value = "passthrough",
        value_parser = parse_room_policy
    )]
    pub room_policy: RoomPolicy,

    /// Deployment label reported by /api/config-status
    #[arg(long, env = "ROOMPASS_ENV", global = true, default_value = "development")]
    pub environment: String,

    /// Log level
    #[arg(long, env = "RUST_LOG", global = true, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    pub fn issuer_config(&self) -> IssuerConfig {
        IssuerConfig::new(self.app_id.clone(), self.secret.clone())
            .with_room_policy(self.room_policy)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP token endpoint
    Serve {
        /// Address to bind to
        #[arg(short, long, default_value = "0.0.0.0:8080", env = "ROOMPASS_BIND")]
        bind: String,
    },

    /// Issue a token locally and print it
    ///
    /// Examples:
    ///   roompass issue --room lobby-42
    ///   roompass issue              (every room of the app)
    Issue {
        /// Room to scope the token to; omit for every room
        #[arg(short, long)]
        room: Option<String>,
    },

    /// Verify a token with the configured secret and print its claims
    Inspect {
        /// Token to verify
        token: String,
    },
}

fn parse_room_policy(s: &str) -> Result<RoomPolicy, String> {
    s.parse().map_err(|e: roompass::rooms::UnknownPolicy| e.to_string())
}
