//! Permission policy — one evaluation function for every operation.
//!
//! The rules live here instead of inline in each handler so that the caller
//! (dispatcher, CLI, tests) gets identical answers no matter which surface
//! the request came through.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
  actor::Actor,
  error::{Error, Result},
  ticket::{Ticket, TicketId},
};

/// The requested lifecycle operation, for policy evaluation and error
/// reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
  Create,
  Claim,
  Close,
  Archive,
  Delete,
  Query,
}

impl fmt::Display for Operation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Self::Create => "create",
      Self::Claim => "claim",
      Self::Close => "close",
      Self::Archive => "archive",
      Self::Delete => "delete",
      Self::Query => "query",
    };
    f.write_str(s)
  }
}

/// Decide whether `actor` may perform `operation` on `ticket`.
///
/// Rules:
/// - Create and Query are open to every actor (creation is bounded by the
///   cooldown and the per-owner cap, not by role).
/// - Claim requires the elevated capability.
/// - Close requires the elevated capability or ownership of the ticket.
/// - Archive carries no role requirement; it is driven by the system after a
///   close.
/// - Delete requires the admin capability.
///
/// Status preconditions are not checked here — the store validates those
/// atomically when the transition is applied.
pub fn authorize(
  operation: Operation,
  actor: &Actor,
  ticket: Option<&Ticket>,
) -> Result<()> {
  let allowed = match operation {
    Operation::Create | Operation::Query | Operation::Archive => true,
    Operation::Claim => actor.capabilities.is_elevated(),
    Operation::Close => {
      actor.capabilities.is_elevated()
        || ticket.is_some_and(|t| t.owner_id == actor.id)
    }
    Operation::Delete => actor.capabilities.is_admin(),
  };

  if allowed {
    Ok(())
  } else {
    Err(Error::PermissionDenied {
      actor: actor.id.clone(),
      operation,
      ticket: ticket
        .map(|t| t.id.clone())
        .unwrap_or_else(|| TicketId::new("?")),
    })
  }
}
