//! Tally server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store, and serves the JSON API over HTTP.
//!
//! # Bootstrapping an administrator
//!
//! ```text
//! cargo run -p tally-server -- create-admin --email admin@example.org --name "Site Admin"
//! ```

mod config;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tally_api::auth::hash_password;
use tally_core::{
  Ledger,
  volunteer::{NewVolunteer, Role},
};
use tally_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;

#[derive(Parser)]
#[command(author, version, about = "Tally volunteer-hours server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml", global = true)]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (the default).
  Serve,
  /// Print the argon2 hash for a password entered on stdin and exit.
  HashPassword,
  /// Register an administrator account; the password is read from stdin.
  CreateAdmin {
    #[arg(long)]
    email: String,
    #[arg(long)]
    name:  String,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  match cli.command.unwrap_or(Command::Serve) {
    Command::HashPassword => {
      let password = read_password()?;
      println!("{}", hash_password(&password)?);
      Ok(())
    }
    Command::CreateAdmin { email, name } => {
      let cfg = ServerConfig::load(&cli.config)?;
      let ledger = Ledger::new(open_store(&cfg).await?);
      let password = read_password()?;
      let admin = ledger
        .register(NewVolunteer {
          email,
          full_name: name,
          password_hash: hash_password(&password)?,
          role: Role::Admin,
          referred_by: None,
        })
        .await
        .context("failed to create administrator")?;
      println!("created administrator {} ({})", admin.email, admin.volunteer_id);
      Ok(())
    }
    Command::Serve => serve(ServerConfig::load(&cli.config)?).await,
  }
}

async fn open_store(cfg: &ServerConfig) -> anyhow::Result<SqliteStore> {
  if let Some(parent) = cfg.store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))
}

async fn serve(cfg: ServerConfig) -> anyhow::Result<()> {
  let ledger = Arc::new(Ledger::new(open_store(&cfg).await?));
  let app = tally_api::api_router(ledger);
  let address = cfg.address();

  tracing::info!(store = ?cfg.store_path, "Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}
