//! `TicketLifecycle` — the ticket state machine service.
//!
//! Each operation runs the same sequence: evaluate the permission policy,
//! check operation-specific gates (cooldown, capacity), apply the transition
//! atomically through the store, then append exactly one audit entry. A
//! rejected precondition returns before anything is written; once the store
//! commit has happened, a failing audit append still surfaces as an error
//! (the row and the log may diverge at that point — the caller decides
//! whether to retry).
//!
//! The core never touches the platform: follow-on effects (revoking channel
//! access, moving a channel into an archive bucket, removing the channel)
//! are returned as [`FollowUp`] signals for the caller to execute.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
  actor::{Actor, ActorId},
  audit::{AuditAction, AuditEntry, AuditLog},
  config::CoreConfig,
  cooldown::CooldownManager,
  error::{Error, Result},
  policy::{self, Operation},
  store::TicketStore,
  ticket::{ArchiveBucket, Category, StatusChange, Ticket, TicketId, TicketStatus},
};

// ─── Transition tables ───────────────────────────────────────────────────────

// Claimed may be skipped (Open → Closed), but nothing ever moves backward.
const CLAIM_FROM: &[TicketStatus] = &[TicketStatus::Open];
const CLOSE_FROM: &[TicketStatus] = &[TicketStatus::Open, TicketStatus::Claimed];
const ARCHIVE_FROM: &[TicketStatus] = &[TicketStatus::Closed];
// Deleting straight from Closed is the sanctioned emergency path.
const DELETE_FROM: &[TicketStatus] =
  &[TicketStatus::Closed, TicketStatus::Archived];

// ─── Caller signals ──────────────────────────────────────────────────────────

/// A platform action the caller must perform after a successful transition.
/// The core issues no network or UI calls of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FollowUp {
  /// Revoke the former owner's read access to the ticket's channel.
  RevokeOwnerAccess { owner: ActorId },
  /// Move the ticket's channel into the named archive bucket.
  MoveToBucket { bucket: ArchiveBucket },
  /// Remove the backing channel entirely.
  RemoveChannel,
}

/// The result of a transition that carries post-conditions for the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
  pub ticket:     Ticket,
  pub follow_ups: Vec<FollowUp>,
}

// ─── Service ─────────────────────────────────────────────────────────────────

/// The lifecycle state machine over a shared [`TicketStore`].
///
/// Cheap to share behind an `Arc`; the store handle itself is expected to be
/// reference-counted (the sqlite backend's `Clone` is an `Arc` bump).
pub struct TicketLifecycle<S> {
  store:     S,
  audit:     AuditLog<S>,
  cooldowns: CooldownManager,
  cap:       u32,
}

impl<S: TicketStore + Clone> TicketLifecycle<S> {
  pub fn new(store: S, config: &CoreConfig) -> Self {
    Self {
      audit: AuditLog::new(store.clone()),
      cooldowns: CooldownManager::new(
        config.cooldown_secs,
        config.cooldown_sweep_threshold,
      ),
      cap: config.open_ticket_cap,
      store,
    }
  }

  // ── Operations ────────────────────────────────────────────────────────────

  /// Open a new ticket owned by `actor`.
  ///
  /// The cooldown slot is consumed before the capacity check, so a
  /// `CapacityExceeded` rejection still counts as the actor's attempt for
  /// this window. The capacity count and the insert are one atomic unit
  /// inside the store.
  pub async fn create(
    &self,
    actor: &Actor,
    id: TicketId,
    category: Category,
  ) -> Result<Ticket> {
    policy::authorize(Operation::Create, actor, None)?;

    let now = Utc::now();
    if !self.cooldowns.try_acquire(&actor.id, now) {
      return Err(Error::CooldownActive {
        actor:       actor.id.clone(),
        window_secs: self.cooldowns.window_secs(),
      });
    }

    let ticket = Ticket::open(id, actor.id.clone(), category, now);
    let ticket = self.store.create(ticket, self.cap).await?;

    self
      .record(AuditEntry::record(
        now,
        AuditAction::Create,
        actor,
        ticket.id.clone(),
        format!("opened {category} ticket"),
      ))
      .await?;

    tracing::info!(ticket = %ticket.id, actor = %actor.id, %category, "ticket created");
    Ok(ticket)
  }

  /// Assign an Open ticket to an elevated actor.
  pub async fn claim(&self, actor: &Actor, id: TicketId) -> Result<Ticket> {
    let ticket = self.require(&id).await?;
    policy::authorize(Operation::Claim, actor, Some(&ticket))?;

    let now = Utc::now();
    let ticket = self
      .store
      .transition(
        id,
        CLAIM_FROM,
        StatusChange::Claim { by: actor.id.clone(), at: now },
      )
      .await?;

    self
      .record(AuditEntry::record(
        now,
        AuditAction::Claim,
        actor,
        ticket.id.clone(),
        format!("claimed by {}", actor.name),
      ))
      .await?;

    tracing::info!(ticket = %ticket.id, actor = %actor.id, "ticket claimed");
    Ok(ticket)
  }

  /// Close an Open or Claimed ticket. Allowed for elevated actors and for
  /// the ticket's own owner.
  pub async fn close(&self, actor: &Actor, id: TicketId) -> Result<Outcome> {
    let ticket = self.require(&id).await?;
    policy::authorize(Operation::Close, actor, Some(&ticket))?;

    let now = Utc::now();
    let ticket = self
      .store
      .transition(id, CLOSE_FROM, StatusChange::Close { at: now })
      .await?;

    self
      .record(AuditEntry::record(
        now,
        AuditAction::Close,
        actor,
        ticket.id.clone(),
        format!("closed by {}", actor.name),
      ))
      .await?;

    tracing::info!(ticket = %ticket.id, actor = %actor.id, "ticket closed");
    let follow_ups =
      vec![FollowUp::RevokeOwnerAccess { owner: ticket.owner_id.clone() }];
    Ok(Outcome { ticket, follow_ups })
  }

  /// Archive a Closed ticket. The archive bucket is chosen by category:
  /// unban requests go to their own bucket, everything else to the general
  /// archive.
  pub async fn archive(&self, actor: &Actor, id: TicketId) -> Result<Outcome> {
    let ticket = self.require(&id).await?;
    policy::authorize(Operation::Archive, actor, Some(&ticket))?;

    let now = Utc::now();
    let ticket = self
      .store
      .transition(id, ARCHIVE_FROM, StatusChange::Archive { at: now })
      .await?;

    let bucket = ticket.category.archive_bucket();
    self
      .record(AuditEntry::record(
        now,
        AuditAction::Archive,
        actor,
        ticket.id.clone(),
        format!("archived to {bucket:?} bucket"),
      ))
      .await?;

    tracing::info!(ticket = %ticket.id, actor = %actor.id, ?bucket, "ticket archived");
    let follow_ups = vec![FollowUp::MoveToBucket { bucket }];
    Ok(Outcome { ticket, follow_ups })
  }

  /// Remove an Archived (or, as an emergency measure, Closed) ticket from
  /// the active store. Admin only. The audit trail remains forever.
  pub async fn delete(&self, actor: &Actor, id: TicketId) -> Result<Outcome> {
    let ticket = self.require(&id).await?;
    policy::authorize(Operation::Delete, actor, Some(&ticket))?;

    let now = Utc::now();
    let mut ticket = self.store.remove(id, DELETE_FROM).await?;
    ticket.status = TicketStatus::Deleted;

    self
      .record(AuditEntry::record(
        now,
        AuditAction::Delete,
        actor,
        ticket.id.clone(),
        format!("deleted by {}", actor.name),
      ))
      .await?;

    tracing::info!(ticket = %ticket.id, actor = %actor.id, "ticket deleted");
    Ok(Outcome { ticket, follow_ups: vec![FollowUp::RemoveChannel] })
  }

  /// The full current record for a ticket.
  pub async fn query(&self, id: TicketId) -> Result<Ticket> {
    self.require(&id).await
  }

  /// Every audit entry recorded for a ticket, oldest first. Works for
  /// deleted tickets too.
  pub async fn history(&self, id: TicketId) -> Result<Vec<AuditEntry>> {
    self.audit.for_ticket(id).await
  }

  /// All active tickets owned by `owner`.
  pub async fn tickets_for_owner(&self, owner: ActorId) -> Result<Vec<Ticket>> {
    self.store.list_by_owner(owner).await
  }

  // ── Internals ─────────────────────────────────────────────────────────────

  async fn require(&self, id: &TicketId) -> Result<Ticket> {
    self
      .store
      .get(id.clone())
      .await?
      .ok_or_else(|| Error::NotFound(id.clone()))
  }

  async fn record(&self, entry: AuditEntry) -> Result<()> {
    if let Err(err) = self.audit.append(entry).await {
      tracing::warn!(error = %err, "audit append failed after commit");
      return Err(err);
    }
    Ok(())
  }
}
