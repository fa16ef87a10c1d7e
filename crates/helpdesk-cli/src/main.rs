//! `helpdesk` — command-line driver for the ticket lifecycle core.
//!
//! Stands in for the chat-platform dispatcher: the operator supplies the
//! actor identity and capability flags that a real dispatcher would resolve
//! from role membership, and each invocation maps to exactly one lifecycle
//! operation. Follow-up signals the caller would normally execute against
//! the platform (revoking access, moving channels) are printed instead.
//!
//! # Usage
//!
//! ```
//! helpdesk create --actor u-1 --category tech-support
//! helpdesk claim --actor m-1 --elevated ticket-1234
//! helpdesk history ticket-1234
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use helpdesk_core::{
  actor::{Actor, ActorId, Capabilities},
  config::CoreConfig,
  lifecycle::{FollowUp, Outcome, TicketLifecycle},
  ticket::{Category, Ticket, TicketId},
};
use helpdesk_store_sqlite::SqliteStore;
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "helpdesk", about = "Support-ticket lifecycle driver")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "helpdesk.toml")]
  config: PathBuf,

  /// Override the database path from the config file.
  #[arg(long)]
  db: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

/// Who is acting, and which capabilities the operator vouches for.
#[derive(Args)]
struct ActorArgs {
  /// Acting principal's identifier (platform user id).
  #[arg(long)]
  actor: String,

  /// Display name recorded in the audit log; defaults to the actor id.
  #[arg(long)]
  actor_name: Option<String>,

  /// The actor holds a moderator role (claim / close-others rights).
  #[arg(long)]
  elevated: bool,

  /// The actor holds the admin role (implies --elevated).
  #[arg(long)]
  admin: bool,
}

impl ActorArgs {
  fn into_actor(self) -> Actor {
    let name = self.actor_name.unwrap_or_else(|| self.actor.clone());
    Actor::new(
      self.actor,
      name,
      Capabilities { elevated: self.elevated, admin: self.admin },
    )
  }
}

#[derive(Clone, Copy, ValueEnum)]
enum CategoryArg {
  Purchase,
  TechSupport,
  GeneralSupport,
  UnbanRequest,
}

impl From<CategoryArg> for Category {
  fn from(value: CategoryArg) -> Self {
    match value {
      CategoryArg::Purchase => Self::Purchase,
      CategoryArg::TechSupport => Self::TechSupport,
      CategoryArg::GeneralSupport => Self::GeneralSupport,
      CategoryArg::UnbanRequest => Self::UnbanRequest,
    }
  }
}

#[derive(Subcommand)]
enum Command {
  /// Open a new ticket owned by the acting user.
  Create {
    #[command(flatten)]
    actor: ActorArgs,

    #[arg(long, value_enum)]
    category: CategoryArg,

    /// Ticket id (the backing channel handle); generated when omitted.
    #[arg(long)]
    id: Option<String>,
  },

  /// Assign an open ticket to the acting moderator.
  Claim {
    #[command(flatten)]
    actor: ActorArgs,
    ticket: String,
  },

  /// Close an open or claimed ticket.
  Close {
    #[command(flatten)]
    actor: ActorArgs,
    ticket: String,
  },

  /// Archive a closed ticket into its category's bucket.
  Archive {
    #[command(flatten)]
    actor: ActorArgs,
    ticket: String,
  },

  /// Remove an archived (or closed) ticket from the active store.
  Delete {
    #[command(flatten)]
    actor: ActorArgs,
    ticket: String,
  },

  /// Print a ticket's full record.
  Show { ticket: String },

  /// List all active tickets owned by a user.
  List { owner: String },

  /// Print a ticket's audit trail, oldest first.
  History { ticket: String },
}

// ─── Config file ─────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file; every field has a default, so a
/// missing file means a local `helpdesk.db` with production knobs.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct Settings {
  db_path:                  PathBuf,
  cooldown_secs:            u64,
  open_ticket_cap:          u32,
  cooldown_sweep_threshold: usize,
}

impl Default for Settings {
  fn default() -> Self {
    let core = CoreConfig::default();
    Self {
      db_path:                  PathBuf::from("helpdesk.db"),
      cooldown_secs:            core.cooldown_secs,
      open_ticket_cap:          core.open_ticket_cap,
      cooldown_sweep_threshold: core.cooldown_sweep_threshold,
    }
  }
}

impl Settings {
  fn core_config(&self) -> CoreConfig {
    CoreConfig {
      cooldown_secs:            self.cooldown_secs,
      open_ticket_cap:          self.open_ticket_cap,
      cooldown_sweep_threshold: self.cooldown_sweep_threshold,
    }
  }
}

// ─── Entry point ─────────────────────────────────────────────────────────────

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

  let settings: Settings = config::Config::builder()
    .add_source(config::File::from(cli.config.clone()).required(false))
    .add_source(config::Environment::with_prefix("HELPDESK"))
    .build()
    .context("failed to read config file")?
    .try_deserialize()
    .context("failed to deserialise settings")?;

  let db_path = cli.db.clone().unwrap_or_else(|| settings.db_path.clone());
  let store = SqliteStore::open(&db_path)
    .await
    .with_context(|| format!("failed to open store at {db_path:?}"))?;
  let lifecycle = TicketLifecycle::new(store, &settings.core_config());

  run(cli.command, &lifecycle).await
}

async fn run(
  command: Command,
  lifecycle: &TicketLifecycle<SqliteStore>,
) -> anyhow::Result<()> {
  match command {
    Command::Create { actor, category, id } => {
      let id = TicketId::new(
        id.unwrap_or_else(|| format!("ticket-{}", Uuid::new_v4())),
      );
      let ticket = lifecycle
        .create(&actor.into_actor(), id, category.into())
        .await?;
      print_ticket(&ticket)?;
    }
    Command::Claim { actor, ticket } => {
      let ticket = lifecycle
        .claim(&actor.into_actor(), TicketId::new(ticket))
        .await?;
      print_ticket(&ticket)?;
    }
    Command::Close { actor, ticket } => {
      let outcome = lifecycle
        .close(&actor.into_actor(), TicketId::new(ticket))
        .await?;
      print_outcome(&outcome)?;
    }
    Command::Archive { actor, ticket } => {
      let outcome = lifecycle
        .archive(&actor.into_actor(), TicketId::new(ticket))
        .await?;
      print_outcome(&outcome)?;
    }
    Command::Delete { actor, ticket } => {
      let outcome = lifecycle
        .delete(&actor.into_actor(), TicketId::new(ticket))
        .await?;
      print_outcome(&outcome)?;
    }
    Command::Show { ticket } => {
      let ticket = lifecycle.query(TicketId::new(ticket)).await?;
      print_ticket(&ticket)?;
    }
    Command::List { owner } => {
      let tickets = lifecycle.tickets_for_owner(ActorId::new(owner)).await?;
      println!("{}", serde_json::to_string_pretty(&tickets)?);
    }
    Command::History { ticket } => {
      let entries = lifecycle.history(TicketId::new(ticket)).await?;
      println!("{}", serde_json::to_string_pretty(&entries)?);
    }
  }
  Ok(())
}

// ─── Output ──────────────────────────────────────────────────────────────────

fn print_ticket(ticket: &Ticket) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(ticket)?);
  Ok(())
}

/// Print the resulting record plus the platform actions the operator still
/// has to carry out by hand.
fn print_outcome(outcome: &Outcome) -> anyhow::Result<()> {
  print_ticket(&outcome.ticket)?;
  for follow_up in &outcome.follow_ups {
    match follow_up {
      FollowUp::RevokeOwnerAccess { owner } => {
        println!("follow-up: revoke channel read access for {owner}");
      }
      FollowUp::MoveToBucket { bucket } => {
        println!("follow-up: move channel to the {bucket:?} archive bucket");
      }
      FollowUp::RemoveChannel => {
        println!("follow-up: remove the backing channel");
      }
    }
  }
  Ok(())
}
