//! Ticket types — the tracked support request and its lifecycle status.
//!
//! A ticket moves strictly forward through
//! `Open → Claimed → Closed → Archived → Deleted` (Claimed may be skipped).
//! No operation ever moves a ticket backward; `Deleted` is terminal and the
//! record itself is removed from the active store, leaving only its audit
//! trail behind.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::actor::ActorId;

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Opaque, caller-supplied ticket identifier — in practice the handle of the
/// platform channel backing the ticket. Stable for the ticket's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(pub String);

impl TicketId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for TicketId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── Category ────────────────────────────────────────────────────────────────

/// What the ticket is about. Fixed set; determines the archive bucket the
/// caller should move the backing channel into when the ticket is archived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
  Purchase,
  TechSupport,
  GeneralSupport,
  UnbanRequest,
}

impl Category {
  /// The discriminant string stored in the `category` column.
  /// Must match the `rename_all = "snake_case"` serde tags above.
  pub fn discriminant(self) -> &'static str {
    match self {
      Self::Purchase => "purchase",
      Self::TechSupport => "tech_support",
      Self::GeneralSupport => "general_support",
      Self::UnbanRequest => "unban_request",
    }
  }

  /// Unban requests are archived away from the general ticket archive.
  pub fn archive_bucket(self) -> ArchiveBucket {
    match self {
      Self::UnbanRequest => ArchiveBucket::Unban,
      _ => ArchiveBucket::General,
    }
  }
}

impl fmt::Display for Category {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.discriminant())
  }
}

/// Where an archived ticket's channel belongs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveBucket {
  General,
  Unban,
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// Lifecycle status. Ordering of the variants mirrors the only legal
/// direction of travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
  Open,
  Claimed,
  Closed,
  Archived,
  Deleted,
}

impl TicketStatus {
  pub fn discriminant(self) -> &'static str {
    match self {
      Self::Open => "open",
      Self::Claimed => "claimed",
      Self::Closed => "closed",
      Self::Archived => "archived",
      Self::Deleted => "deleted",
    }
  }
}

impl fmt::Display for TicketStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.discriminant())
  }
}

// ─── Status changes ──────────────────────────────────────────────────────────

/// A single forward step applied to a ticket row by the store.
///
/// The timestamp is assigned by the lifecycle service so the matching audit
/// entry carries the same instant.
#[derive(Debug, Clone)]
pub enum StatusChange {
  Claim { by: ActorId, at: DateTime<Utc> },
  Close { at: DateTime<Utc> },
  Archive { at: DateTime<Utc> },
}

impl StatusChange {
  /// The status a ticket ends up in after this change is applied.
  pub fn target(&self) -> TicketStatus {
    match self {
      Self::Claim { .. } => TicketStatus::Claimed,
      Self::Close { .. } => TicketStatus::Closed,
      Self::Archive { .. } => TicketStatus::Archived,
    }
  }
}

// ─── Ticket ──────────────────────────────────────────────────────────────────

/// One tracked support request.
///
/// `claimed_by` is set exactly once, on the Open → Claimed step, and never
/// cleared afterwards. `closed_at` / `archived_at` are absent until the
/// respective transition happens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
  pub id:          TicketId,
  pub owner_id:    ActorId,
  pub category:    Category,
  pub status:      TicketStatus,
  pub claimed_by:  Option<ActorId>,
  pub created_at:  DateTime<Utc>,
  pub closed_at:   Option<DateTime<Utc>>,
  pub archived_at: Option<DateTime<Utc>>,
}

impl Ticket {
  /// A fresh ticket in `Open` state. There is no pending pre-state; creation
  /// lands directly in `Open`.
  pub fn open(
    id: TicketId,
    owner_id: ActorId,
    category: Category,
    created_at: DateTime<Utc>,
  ) -> Self {
    Self {
      id,
      owner_id,
      category,
      status: TicketStatus::Open,
      claimed_by: None,
      created_at,
      closed_at: None,
      archived_at: None,
    }
  }

  /// Open and Claimed tickets count against their owner's cap.
  pub fn counts_against_cap(&self) -> bool {
    matches!(self.status, TicketStatus::Open | TicketStatus::Claimed)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unban_requests_archive_to_their_own_bucket() {
    assert_eq!(Category::UnbanRequest.archive_bucket(), ArchiveBucket::Unban);
    for cat in [
      Category::Purchase,
      Category::TechSupport,
      Category::GeneralSupport,
    ] {
      assert_eq!(cat.archive_bucket(), ArchiveBucket::General);
    }
  }

  #[test]
  fn only_open_and_claimed_count_against_cap() {
    let mut ticket = Ticket::open(
      TicketId::new("t-1"),
      ActorId::new("u-1"),
      Category::TechSupport,
      Utc::now(),
    );
    assert!(ticket.counts_against_cap());

    ticket.status = TicketStatus::Claimed;
    assert!(ticket.counts_against_cap());

    for status in
      [TicketStatus::Closed, TicketStatus::Archived, TicketStatus::Deleted]
    {
      ticket.status = status;
      assert!(!ticket.counts_against_cap());
    }
  }
}
