//! services/api/src/bin/users.rs
//!
//! Out-of-band account provisioning against the configured PostgreSQL database.
//!
//! ```text
//! users add --username rys --password kowalski
//! users delete --username rys
//! ```

use api_lib::{
    adapters::DbAdapter,
    config::{Config, ConfigError},
    error::ApiError,
    web::state::AppState,
};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "users", about = "Manage lesson tracker accounts")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new account.
    Add {
        #[arg(long)]
        username: String,
        /// Read from USER_PASSWORD when not given on the command line.
        #[arg(long, env = "USER_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Delete an account along with its sessions and items.
    Delete {
        #[arg(long)]
        username: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = config
        .database_url
        .as_deref()
        .ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?;
    let db_pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool));
    db_adapter.run_migrations().await?;

    let state = AppState::new(
        Arc::new(config),
        db_adapter.clone(),
        db_adapter.clone(),
        db_adapter,
    );

    match cli.command {
        Command::Add { username, password } => {
            let user = state.auth.provision(&username, &password).await?;
            info!(user_id = %user.user_id, username = %user.username, "Account created.");
        }
        Command::Delete { username } => {
            let user = state.delete_account(&username).await?;
            info!(user_id = %user.user_id, username = %user.username, "Account deleted.");
        }
    }

    Ok(())
}
