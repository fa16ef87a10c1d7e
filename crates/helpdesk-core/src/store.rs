//! The `TicketStore` trait — the persistence boundary.
//!
//! Implemented by storage backends (e.g. `helpdesk-store-sqlite`). The
//! lifecycle service depends on this abstraction, never on a concrete
//! backend.
//!
//! Every mutating operation is an atomic unit: the backend performs the
//! read-validate-write sequence under its single store-wide write lock (or
//! the moral equivalent, a serialized connection running one transaction),
//! so two concurrent callers can never interleave halfway through a
//! capacity check or a status validation. This is a correctness requirement,
//! not an optimisation: a `get`-then-`put` split here would let two
//! concurrent creates both observe a below-cap count and overshoot.
//!
//! All methods return `Send` futures so the trait can be used from
//! multi-threaded async runtimes.

use std::future::Future;

use crate::{
  actor::ActorId,
  audit::AuditEntry,
  error::Result,
  ticket::{StatusChange, Ticket, TicketId, TicketStatus},
};

pub trait TicketStore: Send + Sync {
  /// Persist a freshly opened ticket, atomically enforcing the per-owner
  /// cap: if the owner already has `open_cap` tickets in Open or Claimed
  /// state, nothing is written and the call fails with
  /// [`Error::CapacityExceeded`](crate::Error::CapacityExceeded).
  fn create(
    &self,
    ticket: Ticket,
    open_cap: u32,
  ) -> impl Future<Output = Result<Ticket>> + Send + '_;

  /// Retrieve a ticket by id. Returns `None` if not found — absence is not
  /// an error at this layer.
  fn get(
    &self,
    id: TicketId,
  ) -> impl Future<Output = Result<Option<Ticket>>> + Send + '_;

  /// All active (non-deleted) tickets owned by `owner`, any status.
  fn list_by_owner(
    &self,
    owner: ActorId,
  ) -> impl Future<Output = Result<Vec<Ticket>>> + Send + '_;

  /// Apply one forward status step, atomically validating that the ticket's
  /// current status is in `allowed_from` first. Returns the updated record.
  ///
  /// Fails with `NotFound` if no such ticket exists, or `InvalidTransition`
  /// if the current status is outside `allowed_from` (state is untouched in
  /// both cases).
  fn transition(
    &self,
    id: TicketId,
    allowed_from: &'static [TicketStatus],
    change: StatusChange,
  ) -> impl Future<Output = Result<Ticket>> + Send + '_;

  /// Remove a ticket from the active set, atomically validating its current
  /// status against `allowed_from`. Returns the record as it was at removal.
  /// The ticket's audit entries are left untouched.
  fn remove(
    &self,
    id: TicketId,
    allowed_from: &'static [TicketStatus],
  ) -> impl Future<Output = Result<Ticket>> + Send + '_;

  /// Append one entry to the audit log. Strictly append-only: no update or
  /// delete is ever issued against the log.
  fn append_audit(
    &self,
    entry: AuditEntry,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  /// Every audit entry recorded for `ticket_id`, in append order.
  fn audit_for_ticket(
    &self,
    ticket_id: TicketId,
  ) -> impl Future<Output = Result<Vec<AuditEntry>>> + Send + '_;
}
