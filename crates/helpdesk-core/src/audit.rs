//! The append-only audit trail.
//!
//! Every accepted lifecycle operation is recorded exactly once. Entries are
//! never edited or removed — the audit history of a deleted ticket outlives
//! the ticket itself.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  actor::Actor,
  error::Result,
  store::TicketStore,
  ticket::TicketId,
};

// ─── Records ─────────────────────────────────────────────────────────────────

/// Which lifecycle transition an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
  Create,
  Claim,
  Close,
  Archive,
  Delete,
}

impl AuditAction {
  /// The discriminant string stored in the `action` column.
  pub fn discriminant(self) -> &'static str {
    match self {
      Self::Create => "create",
      Self::Claim => "claim",
      Self::Close => "close",
      Self::Archive => "archive",
      Self::Delete => "delete",
    }
  }
}

impl fmt::Display for AuditAction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.discriminant())
  }
}

/// One immutable record of an accepted lifecycle transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
  pub timestamp:  DateTime<Utc>,
  pub action:     AuditAction,
  pub actor_id:   String,
  pub actor_name: String,
  pub ticket_id:  TicketId,
  pub detail:     String,
}

impl AuditEntry {
  /// Build the entry for an operation accepted at `timestamp`. The instant
  /// is passed in (rather than sampled here) so the entry matches the
  /// timestamps written to the ticket row.
  pub fn record(
    timestamp: DateTime<Utc>,
    action: AuditAction,
    actor: &Actor,
    ticket_id: TicketId,
    detail: impl Into<String>,
  ) -> Self {
    Self {
      timestamp,
      action,
      actor_id: actor.id.to_string(),
      actor_name: actor.name.clone(),
      ticket_id,
      detail: detail.into(),
    }
  }
}

// ─── AuditLog ────────────────────────────────────────────────────────────────

/// Append-only recorder over a [`TicketStore`]'s audit table.
///
/// A thin delegate: failures from the store propagate — an audit append is
/// never allowed to fail silently.
pub struct AuditLog<S> {
  store: S,
}

impl<S: TicketStore> AuditLog<S> {
  pub fn new(store: S) -> Self { Self { store } }

  pub async fn append(&self, entry: AuditEntry) -> Result<()> {
    self.store.append_audit(entry).await
  }

  /// Every entry ever recorded for `ticket_id`, oldest first.
  pub async fn for_ticket(&self, ticket_id: TicketId) -> Result<Vec<AuditEntry>> {
    self.store.audit_for_ticket(ticket_id).await
  }
}
