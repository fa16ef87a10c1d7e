//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Enumerations are stored as
//! their snake_case discriminants. Decode failures mean a corrupt store and
//! surface as `Persistence` errors.

use chrono::{DateTime, Utc};
use helpdesk_core::{
  Error, Result,
  actor::ActorId,
  audit::{AuditAction, AuditEntry},
  ticket::{Category, Ticket, TicketId, TicketStatus},
};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::persistence(format!("bad timestamp {s:?}: {e}")))
}

// ─── Category ────────────────────────────────────────────────────────────────

pub fn decode_category(s: &str) -> Result<Category> {
  match s {
    "purchase" => Ok(Category::Purchase),
    "tech_support" => Ok(Category::TechSupport),
    "general_support" => Ok(Category::GeneralSupport),
    "unban_request" => Ok(Category::UnbanRequest),
    other => Err(Error::persistence(format!("unknown category: {other:?}"))),
  }
}

// ─── TicketStatus ────────────────────────────────────────────────────────────

pub fn decode_status(s: &str) -> Result<TicketStatus> {
  match s {
    "open" => Ok(TicketStatus::Open),
    "claimed" => Ok(TicketStatus::Claimed),
    "closed" => Ok(TicketStatus::Closed),
    "archived" => Ok(TicketStatus::Archived),
    "deleted" => Ok(TicketStatus::Deleted),
    other => Err(Error::persistence(format!("unknown status: {other:?}"))),
  }
}

// ─── AuditAction ─────────────────────────────────────────────────────────────

pub fn decode_action(s: &str) -> Result<AuditAction> {
  match s {
    "create" => Ok(AuditAction::Create),
    "claim" => Ok(AuditAction::Claim),
    "close" => Ok(AuditAction::Close),
    "archive" => Ok(AuditAction::Archive),
    "delete" => Ok(AuditAction::Delete),
    other => Err(Error::persistence(format!("unknown audit action: {other:?}"))),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `tickets` row.
pub struct RawTicket {
  pub ticket_id:   String,
  pub owner_id:    String,
  pub category:    String,
  pub status:      String,
  pub claimed_by:  Option<String>,
  pub created_at:  String,
  pub closed_at:   Option<String>,
  pub archived_at: Option<String>,
}

impl RawTicket {
  /// Column list matching [`from_row`](Self::from_row); keep in sync with
  /// the schema.
  pub const COLUMNS: &'static str = "ticket_id, owner_id, category, status, \
                                     claimed_by, created_at, closed_at, archived_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      ticket_id:   row.get(0)?,
      owner_id:    row.get(1)?,
      category:    row.get(2)?,
      status:      row.get(3)?,
      claimed_by:  row.get(4)?,
      created_at:  row.get(5)?,
      closed_at:   row.get(6)?,
      archived_at: row.get(7)?,
    })
  }

  pub fn into_ticket(self) -> Result<Ticket> {
    Ok(Ticket {
      id:          TicketId::new(self.ticket_id),
      owner_id:    ActorId::new(self.owner_id),
      category:    decode_category(&self.category)?,
      status:      decode_status(&self.status)?,
      claimed_by:  self.claimed_by.map(ActorId::new),
      created_at:  decode_dt(&self.created_at)?,
      closed_at:   self.closed_at.as_deref().map(decode_dt).transpose()?,
      archived_at: self.archived_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Raw strings read directly from an `audit_log` row.
pub struct RawAuditEntry {
  pub at:         String,
  pub action:     String,
  pub actor_id:   String,
  pub actor_name: String,
  pub ticket_id:  String,
  pub detail:     String,
}

impl RawAuditEntry {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      at:         row.get(0)?,
      action:     row.get(1)?,
      actor_id:   row.get(2)?,
      actor_name: row.get(3)?,
      ticket_id:  row.get(4)?,
      detail:     row.get(5)?,
    })
  }

  pub fn into_entry(self) -> Result<AuditEntry> {
    Ok(AuditEntry {
      timestamp:  decode_dt(&self.at)?,
      action:     decode_action(&self.action)?,
      actor_id:   self.actor_id,
      actor_name: self.actor_name,
      ticket_id:  TicketId::new(self.ticket_id),
      detail:     self.detail,
    })
  }
}
