//! `educa` server binary and admin commands.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `EDUCA_*` environment variables, opens the SQLite store, and either serves
//! HTTP or runs a one-shot admin command.
//!
//! ```text
//! educa serve
//! educa create-user alice --grant all-course
//! educa create-subject Mathematics
//! educa deactivate alice
//! educa clear-sessions
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::{Context as _, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use educa_core::{
  permission::{Entity, Permission},
  principal::NewUser,
  store::CourseStore,
};
use educa_store_sqlite::SqliteStore;
use educa_web::{AppState, ServerConfig, auth};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Grants every course permission.
const ALL_COURSE: &str = "all-course";

#[derive(Parser)]
#[command(author, version, about = "Educa course manager")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml", global = true)]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve HTTP (the default).
  Serve,
  /// Print the argon2 hash for a password read from stdin.
  HashPassword,
  /// Create an active user; the password is read from stdin.
  CreateUser {
    username: String,
    /// Permission to grant, e.g. `add_course` or `all-course`. Repeatable.
    #[arg(long = "grant", value_name = "PERM")]
    grants:   Vec<String>,
  },
  /// Grant permissions to an existing user.
  Grant {
    username:    String,
    #[arg(required = true, value_name = "PERM")]
    permissions: Vec<String>,
  },
  /// Add a subject courses can be filed under.
  CreateSubject { title: String },
  /// Allow a user to log in again.
  Activate { username: String },
  /// Stop a user from logging in; their sessions stop authenticating.
  Deactivate { username: String },
  /// Delete expired sessions.
  ClearSessions,
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
    Command::Serve => {
      let (store, server_cfg) = open_store(cli.config).await?;
      serve(store, server_cfg).await
    }
    Command::HashPassword => {
      let hash = auth::hash_password(&read_password()?)
        .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
      println!("{hash}");
      Ok(())
    }
    Command::CreateUser { username, grants } => {
      let permissions = parse_permissions(&grants)?;
      let password_hash = auth::hash_password(&read_password()?)
        .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
      let (store, _) = open_store(cli.config).await?;
      let user = store
        .create_user(NewUser {
          username,
          password_hash,
        })
        .await
        .context("failed to create user")?;
      for permission in permissions {
        store.grant_permission(user.user_id, permission).await?;
      }
      tracing::info!(user = %user.username, "user created");
      println!("{}", user.user_id);
      Ok(())
    }
    Command::Grant {
      username,
      permissions,
    } => {
      let permissions = parse_permissions(&permissions)?;
      let (store, _) = open_store(cli.config).await?;
      let Some(user) = store.find_user(&username).await? else {
        bail!("no user named {username:?}");
      };
      for permission in permissions {
        if store.grant_permission(user.user_id, permission).await? {
          println!("granted {}", permission.qualified());
        }
      }
      Ok(())
    }
    Command::CreateSubject { title } => {
      let (store, _) = open_store(cli.config).await?;
      let subject = store
        .add_subject(title.trim())
        .await
        .context("failed to create subject")?;
      println!("{}", subject.subject_id);
      Ok(())
    }
    Command::Activate { username } => set_active(cli.config, &username, true).await,
    Command::Deactivate { username } => set_active(cli.config, &username, false).await,
    Command::ClearSessions => {
      let (store, _) = open_store(cli.config).await?;
      let purged = store
        .purge_expired_sessions(Utc::now())
        .await
        .context("failed to purge sessions")?;
      tracing::info!(purged, "expired sessions cleared");
      println!("{purged}");
      Ok(())
    }
  }
}

async fn set_active(config_path: PathBuf, username: &str, active: bool) -> anyhow::Result<()> {
  let (store, _) = open_store(config_path).await?;
  let Some(user) = store.find_user(username).await? else {
    bail!("no user named {username:?}");
  };
  store.set_user_active(user.user_id, active).await?;
  tracing::info!(user = %user.username, active, "user updated");
  Ok(())
}

/// Load configuration and open the SQLite store it names.
async fn open_store(config_path: PathBuf) -> anyhow::Result<(SqliteStore, ServerConfig)> {
  let settings = config::Config::builder()
    .add_source(config::File::from(config_path).required(false))
    .add_source(config::Environment::with_prefix("EDUCA"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  Ok((store, server_cfg))
}

async fn serve(store: SqliteStore, server_cfg: ServerConfig) -> anyhow::Result<()> {
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let state = AppState {
    store:  Arc::new(store),
    config: Arc::new(server_cfg),
  };
  let app = educa_web::router(state);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Parse permission names; `all-course` expands to every course permission.
fn parse_permissions(raw: &[String]) -> anyhow::Result<Vec<Permission>> {
  let mut out = Vec::new();
  for name in raw {
    if name == ALL_COURSE {
      out.extend(Permission::all_for(Entity::Course));
    } else {
      out.push(name.parse()?);
    }
  }
  Ok(out)
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  eprint!("Password: ");
  io::stderr().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  let password = line.trim_end_matches(['\n', '\r']).to_owned();
  if password.is_empty() {
    bail!("empty password");
  }
  Ok(password)
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
