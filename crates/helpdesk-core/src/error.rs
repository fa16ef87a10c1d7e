//! Error types for `helpdesk-core`.
//!
//! One enum covers every caller-facing outcome: the first five variants are
//! expected, recoverable rejections (no state was changed); `Persistence`
//! means the durable store failed mid-operation and the caller must decide
//! whether to retry or abort.

use thiserror::Error;

use crate::{
  actor::ActorId,
  policy::Operation,
  ticket::{TicketId, TicketStatus},
};

#[derive(Debug, Error)]
pub enum Error {
  #[error("actor {actor} is not permitted to {operation} ticket {ticket}")]
  PermissionDenied {
    actor:     ActorId,
    operation: Operation,
    ticket:    TicketId,
  },

  #[error("ticket not found: {0}")]
  NotFound(TicketId),

  #[error("ticket {ticket} is {from}; cannot move to {to}")]
  InvalidTransition {
    ticket: TicketId,
    from:   TicketStatus,
    to:     TicketStatus,
  },

  #[error("owner {owner} already has {cap} open tickets")]
  CapacityExceeded { owner: ActorId, cap: u32 },

  #[error("actor {actor} must wait {window_secs}s between ticket creations")]
  CooldownActive { actor: ActorId, window_secs: u64 },

  #[error("persistent store failure: {0}")]
  Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap any underlying storage failure. Accepts error values and plain
  /// strings (for corrupt-record reports from the decode layer).
  pub fn persistence(
    source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
  ) -> Self {
    Self::Persistence(source.into())
  }

  /// True for the expected rejection kinds, false for `Persistence`.
  pub fn is_rejection(&self) -> bool {
    !matches!(self, Self::Persistence(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
