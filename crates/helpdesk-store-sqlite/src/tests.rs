//! Integration tests for `SqliteStore` and the lifecycle service against an
//! in-memory database.

use std::sync::Arc;

use helpdesk_core::{
  Error,
  actor::{Actor, ActorId, Capabilities},
  audit::AuditAction,
  config::CoreConfig,
  lifecycle::{FollowUp, TicketLifecycle},
  ticket::{ArchiveBucket, Category, TicketId, TicketStatus},
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

/// Cooldown disabled so tests can create tickets back to back.
fn quick_config() -> CoreConfig {
  CoreConfig { cooldown_secs: 0, ..CoreConfig::default() }
}

async fn lifecycle() -> TicketLifecycle<SqliteStore> {
  TicketLifecycle::new(store().await, &quick_config())
}

fn member(id: &str) -> Actor {
  Actor::new(id, format!("user-{id}"), Capabilities::member())
}

fn moderator() -> Actor {
  Actor::new("m-1", "Mora", Capabilities::elevated())
}

fn admin() -> Actor {
  Actor::new("a-1", "Ada", Capabilities::admin())
}

fn tid(s: &str) -> TicketId { TicketId::new(s) }

// ─── Create & query ──────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_query() {
  let lc = lifecycle().await;
  let owner = member("u-1");

  let ticket = lc
    .create(&owner, tid("c-1"), Category::TechSupport)
    .await
    .unwrap();
  assert_eq!(ticket.status, TicketStatus::Open);
  assert_eq!(ticket.owner_id, owner.id);
  assert_eq!(ticket.category, Category::TechSupport);
  assert!(ticket.claimed_by.is_none());

  let fetched = lc.query(tid("c-1")).await.unwrap();
  assert_eq!(fetched.id, ticket.id);
  assert_eq!(fetched.status, TicketStatus::Open);
  assert_eq!(fetched.created_at, ticket.created_at);
}

#[tokio::test]
async fn query_missing_is_not_found() {
  let lc = lifecycle().await;
  let err = lc.query(tid("no-such")).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn list_by_owner_is_scoped() {
  let lc = lifecycle().await;
  lc.create(&member("u-1"), tid("c-1"), Category::Purchase)
    .await
    .unwrap();
  lc.create(&member("u-1"), tid("c-2"), Category::TechSupport)
    .await
    .unwrap();
  lc.create(&member("u-2"), tid("c-3"), Category::TechSupport)
    .await
    .unwrap();

  let mine = lc.tickets_for_owner(ActorId::new("u-1")).await.unwrap();
  assert_eq!(mine.len(), 2);
  assert!(mine.iter().all(|t| t.owner_id == ActorId::new("u-1")));
}

// ─── Cooldown ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn second_create_within_window_is_rejected() {
  // Production window; the second attempt lands well inside it.
  let lc = TicketLifecycle::new(store().await, &CoreConfig::default());
  let owner = member("u-1");

  lc.create(&owner, tid("c-1"), Category::GeneralSupport)
    .await
    .unwrap();
  let err = lc
    .create(&owner, tid("c-2"), Category::GeneralSupport)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::CooldownActive { window_secs: 60, .. }));

  // The rejection wrote nothing.
  let err = lc.query(tid("c-2")).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn cooldown_is_per_actor() {
  let lc = TicketLifecycle::new(store().await, &CoreConfig::default());
  lc.create(&member("u-1"), tid("c-1"), Category::GeneralSupport)
    .await
    .unwrap();
  lc.create(&member("u-2"), tid("c-2"), Category::GeneralSupport)
    .await
    .unwrap();
}

// ─── Capacity ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn fourth_open_ticket_exceeds_cap() {
  let lc = lifecycle().await;
  let owner = member("u-1");

  for n in 1..=3 {
    lc.create(&owner, tid(&format!("c-{n}")), Category::TechSupport)
      .await
      .unwrap();
  }

  let err = lc
    .create(&owner, tid("c-4"), Category::TechSupport)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::CapacityExceeded { cap: 3, .. }));
}

#[tokio::test]
async fn claimed_tickets_still_count_against_cap() {
  let lc = lifecycle().await;
  let owner = member("u-1");

  for n in 1..=3 {
    lc.create(&owner, tid(&format!("c-{n}")), Category::TechSupport)
      .await
      .unwrap();
  }
  lc.claim(&moderator(), tid("c-1")).await.unwrap();

  let err = lc
    .create(&owner, tid("c-4"), Category::TechSupport)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::CapacityExceeded { .. }));
}

#[tokio::test]
async fn closing_a_ticket_frees_capacity() {
  let lc = lifecycle().await;
  let owner = member("u-1");

  for n in 1..=3 {
    lc.create(&owner, tid(&format!("c-{n}")), Category::TechSupport)
      .await
      .unwrap();
  }
  lc.close(&owner, tid("c-1")).await.unwrap();

  lc.create(&owner, tid("c-4"), Category::TechSupport)
    .await
    .unwrap();
}

#[tokio::test]
async fn concurrent_creates_never_overshoot_cap() {
  let lc = Arc::new(lifecycle().await);
  let owner = member("u-1");

  let mut handles = Vec::new();
  for n in 0..8 {
    let lc = Arc::clone(&lc);
    let owner = owner.clone();
    handles.push(tokio::spawn(async move {
      lc.create(&owner, tid(&format!("c-{n}")), Category::Purchase)
        .await
    }));
  }

  let mut ok = 0;
  let mut capacity = 0;
  for handle in handles {
    match handle.await.unwrap() {
      Ok(_) => ok += 1,
      Err(Error::CapacityExceeded { .. }) => capacity += 1,
      Err(other) => panic!("unexpected rejection: {other}"),
    }
  }

  assert_eq!(ok, 3);
  assert_eq!(capacity, 5);
  assert_eq!(
    lc.tickets_for_owner(owner.id.clone()).await.unwrap().len(),
    3
  );
}

// ─── Claim ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn claim_sets_claimed_by_once() {
  let lc = lifecycle().await;
  let owner = member("u-1");
  lc.create(&owner, tid("c-1"), Category::TechSupport)
    .await
    .unwrap();

  let ticket = lc.claim(&moderator(), tid("c-1")).await.unwrap();
  assert_eq!(ticket.status, TicketStatus::Claimed);
  assert_eq!(ticket.claimed_by, Some(moderator().id));

  // A second claim is an illegal (sideways) transition, not a reassignment.
  let err = lc.claim(&admin(), tid("c-1")).await.unwrap_err();
  assert!(matches!(
    err,
    Error::InvalidTransition { from: TicketStatus::Claimed, .. }
  ));
  let ticket = lc.query(tid("c-1")).await.unwrap();
  assert_eq!(ticket.claimed_by, Some(moderator().id));
}

#[tokio::test]
async fn claim_requires_elevated_capability() {
  let lc = lifecycle().await;
  let owner = member("u-1");
  lc.create(&owner, tid("c-1"), Category::TechSupport)
    .await
    .unwrap();

  let err = lc.claim(&owner, tid("c-1")).await.unwrap_err();
  assert!(matches!(err, Error::PermissionDenied { .. }));
  assert_eq!(
    lc.query(tid("c-1")).await.unwrap().status,
    TicketStatus::Open
  );
}

// ─── Close ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn owner_may_close_own_ticket() {
  let lc = lifecycle().await;
  let owner = member("u-1");
  lc.create(&owner, tid("c-1"), Category::GeneralSupport)
    .await
    .unwrap();

  let outcome = lc.close(&owner, tid("c-1")).await.unwrap();
  assert_eq!(outcome.ticket.status, TicketStatus::Closed);
  assert!(outcome.ticket.closed_at.is_some());
  assert_eq!(
    outcome.follow_ups,
    vec![FollowUp::RevokeOwnerAccess { owner: owner.id.clone() }]
  );
}

#[tokio::test]
async fn stranger_may_not_close_someone_elses_ticket() {
  let lc = lifecycle().await;
  lc.create(&member("u-1"), tid("c-1"), Category::GeneralSupport)
    .await
    .unwrap();

  let err = lc.close(&member("u-2"), tid("c-1")).await.unwrap_err();
  assert!(matches!(err, Error::PermissionDenied { .. }));
}

#[tokio::test]
async fn close_skipping_claim_is_legal() {
  let lc = lifecycle().await;
  lc.create(&member("u-1"), tid("c-1"), Category::GeneralSupport)
    .await
    .unwrap();

  let outcome = lc.close(&moderator(), tid("c-1")).await.unwrap();
  assert_eq!(outcome.ticket.status, TicketStatus::Closed);
  assert!(outcome.ticket.claimed_by.is_none());
}

#[tokio::test]
async fn close_is_forward_only() {
  let lc = lifecycle().await;
  lc.create(&member("u-1"), tid("c-1"), Category::GeneralSupport)
    .await
    .unwrap();
  lc.close(&moderator(), tid("c-1")).await.unwrap();

  let err = lc.close(&moderator(), tid("c-1")).await.unwrap_err();
  assert!(matches!(
    err,
    Error::InvalidTransition {
      from: TicketStatus::Closed,
      to: TicketStatus::Closed,
      ..
    }
  ));
}

// ─── Archive ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn archive_routes_general_tickets_to_general_bucket() {
  let lc = lifecycle().await;
  lc.create(&member("u-1"), tid("c-1"), Category::TechSupport)
    .await
    .unwrap();
  lc.close(&moderator(), tid("c-1")).await.unwrap();

  let outcome = lc.archive(&moderator(), tid("c-1")).await.unwrap();
  assert_eq!(outcome.ticket.status, TicketStatus::Archived);
  assert!(outcome.ticket.archived_at.is_some());
  assert_eq!(
    outcome.follow_ups,
    vec![FollowUp::MoveToBucket { bucket: ArchiveBucket::General }]
  );
}

#[tokio::test]
async fn archive_routes_unban_requests_to_unban_bucket() {
  let lc = lifecycle().await;
  lc.create(&member("u-1"), tid("u-req"), Category::UnbanRequest)
    .await
    .unwrap();
  lc.close(&moderator(), tid("u-req")).await.unwrap();

  let outcome = lc.archive(&moderator(), tid("u-req")).await.unwrap();
  assert_eq!(
    outcome.follow_ups,
    vec![FollowUp::MoveToBucket { bucket: ArchiveBucket::Unban }]
  );
}

#[tokio::test]
async fn archive_requires_closed_status() {
  let lc = lifecycle().await;
  lc.create(&member("u-1"), tid("c-1"), Category::TechSupport)
    .await
    .unwrap();

  let err = lc.archive(&moderator(), tid("c-1")).await.unwrap_err();
  assert!(matches!(
    err,
    Error::InvalidTransition { from: TicketStatus::Open, .. }
  ));
}

// ─── Delete ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn admin_deletes_archived_ticket() {
  let lc = lifecycle().await;
  lc.create(&member("u-1"), tid("c-1"), Category::TechSupport)
    .await
    .unwrap();
  lc.close(&moderator(), tid("c-1")).await.unwrap();
  lc.archive(&moderator(), tid("c-1")).await.unwrap();

  let outcome = lc.delete(&admin(), tid("c-1")).await.unwrap();
  assert_eq!(outcome.ticket.status, TicketStatus::Deleted);
  assert_eq!(outcome.follow_ups, vec![FollowUp::RemoveChannel]);

  // The record is gone from the active store.
  let err = lc.query(tid("c-1")).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn emergency_delete_from_closed_is_legal() {
  let lc = lifecycle().await;
  lc.create(&member("u-1"), tid("c-1"), Category::TechSupport)
    .await
    .unwrap();
  lc.close(&moderator(), tid("c-1")).await.unwrap();

  lc.delete(&admin(), tid("c-1")).await.unwrap();
}

#[tokio::test]
async fn delete_requires_admin() {
  let lc = lifecycle().await;
  lc.create(&member("u-1"), tid("c-1"), Category::TechSupport)
    .await
    .unwrap();
  lc.close(&moderator(), tid("c-1")).await.unwrap();
  lc.archive(&moderator(), tid("c-1")).await.unwrap();

  let err = lc.delete(&moderator(), tid("c-1")).await.unwrap_err();
  assert!(matches!(err, Error::PermissionDenied { .. }));
}

#[tokio::test]
async fn delete_from_open_is_rejected() {
  let lc = lifecycle().await;
  lc.create(&member("u-1"), tid("c-1"), Category::TechSupport)
    .await
    .unwrap();

  let err = lc.delete(&admin(), tid("c-1")).await.unwrap_err();
  assert!(matches!(
    err,
    Error::InvalidTransition { from: TicketStatus::Open, .. }
  ));
}

#[tokio::test]
async fn operations_on_deleted_tickets_report_not_found() {
  let lc = lifecycle().await;
  lc.create(&member("u-1"), tid("c-1"), Category::TechSupport)
    .await
    .unwrap();
  lc.close(&moderator(), tid("c-1")).await.unwrap();
  lc.delete(&admin(), tid("c-1")).await.unwrap();

  // Deletion removed the record, so later operations see no ticket at all.
  let err = lc.close(&moderator(), tid("c-1")).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(_)));
}

// ─── Audit ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn full_lifecycle_audits_each_step_exactly_once() {
  let lc = lifecycle().await;
  let owner = member("u-1");

  lc.create(&owner, tid("c-1"), Category::TechSupport)
    .await
    .unwrap();
  lc.claim(&moderator(), tid("c-1")).await.unwrap();
  lc.close(&moderator(), tid("c-1")).await.unwrap();
  lc.archive(&moderator(), tid("c-1")).await.unwrap();
  lc.delete(&admin(), tid("c-1")).await.unwrap();

  let history = lc.history(tid("c-1")).await.unwrap();
  let actions: Vec<_> = history.iter().map(|e| e.action).collect();
  assert_eq!(
    actions,
    vec![
      AuditAction::Create,
      AuditAction::Claim,
      AuditAction::Close,
      AuditAction::Archive,
      AuditAction::Delete,
    ]
  );

  // Actor identity and display name are captured on every entry.
  assert_eq!(history[0].actor_id, owner.id.to_string());
  assert_eq!(history[1].actor_name, moderator().name);
  assert_eq!(history[4].actor_id, admin().id.to_string());
}

#[tokio::test]
async fn rejected_operations_leave_no_audit_trace() {
  let lc = lifecycle().await;
  let owner = member("u-1");
  lc.create(&owner, tid("c-1"), Category::TechSupport)
    .await
    .unwrap();

  // Permission rejection, then an invalid transition.
  lc.claim(&owner, tid("c-1")).await.unwrap_err();
  lc.archive(&moderator(), tid("c-1")).await.unwrap_err();

  let history = lc.history(tid("c-1")).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].action, AuditAction::Create);
}

// ─── Durability ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn reopening_the_store_reproduces_tickets_and_audit() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("tickets.db");

  {
    let store = SqliteStore::open(&path).await.unwrap();
    let lc = TicketLifecycle::new(store, &quick_config());
    lc.create(&member("u-1"), tid("c-1"), Category::UnbanRequest)
      .await
      .unwrap();
    lc.create(&member("u-2"), tid("c-2"), Category::Purchase)
      .await
      .unwrap();
    lc.claim(&moderator(), tid("c-2")).await.unwrap();
  }

  let store = SqliteStore::open(&path).await.unwrap();
  let lc = TicketLifecycle::new(store, &quick_config());

  let first = lc.query(tid("c-1")).await.unwrap();
  assert_eq!(first.status, TicketStatus::Open);
  assert_eq!(first.category, Category::UnbanRequest);

  let second = lc.query(tid("c-2")).await.unwrap();
  assert_eq!(second.status, TicketStatus::Claimed);
  assert_eq!(second.claimed_by, Some(moderator().id));

  let history = lc.history(tid("c-2")).await.unwrap();
  let actions: Vec<_> = history.iter().map(|e| e.action).collect();
  assert_eq!(actions, vec![AuditAction::Create, AuditAction::Claim]);
}

// ─── End-to-end scenario ─────────────────────────────────────────────────────

/// The canonical walkthrough: a user opens a tech-support ticket, a
/// moderator works it to completion, an admin removes it, and the audit
/// trail reads [create, claim, close, archive, delete].
#[tokio::test]
async fn support_ticket_walkthrough() {
  let lc = lifecycle().await;
  let u1 = member("U1");
  let m = moderator();
  let a = admin();

  let c1 = lc.create(&u1, tid("C1"), Category::TechSupport).await.unwrap();
  assert_eq!(c1.status, TicketStatus::Open);
  assert_eq!(c1.owner_id, u1.id);

  // Reach the cap of three open tickets, then overflow.
  lc.create(&u1, tid("C2"), Category::TechSupport).await.unwrap();
  lc.create(&u1, tid("C3"), Category::TechSupport).await.unwrap();
  let err = lc
    .create(&u1, tid("C4"), Category::TechSupport)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::CapacityExceeded { .. }));

  let claimed = lc.claim(&m, tid("C1")).await.unwrap();
  assert_eq!(claimed.status, TicketStatus::Claimed);
  assert_eq!(claimed.claimed_by, Some(m.id.clone()));

  let closed = lc.close(&m, tid("C1")).await.unwrap();
  assert_eq!(closed.ticket.status, TicketStatus::Closed);

  let archived = lc.archive(&m, tid("C1")).await.unwrap();
  assert_eq!(archived.ticket.status, TicketStatus::Archived);

  lc.delete(&a, tid("C1")).await.unwrap();
  assert!(matches!(
    lc.query(tid("C1")).await.unwrap_err(),
    Error::NotFound(_)
  ));

  let actions: Vec<_> = lc
    .history(tid("C1"))
    .await
    .unwrap()
    .iter()
    .map(|e| e.action)
    .collect();
  assert_eq!(
    actions,
    vec![
      AuditAction::Create,
      AuditAction::Claim,
      AuditAction::Close,
      AuditAction::Archive,
      AuditAction::Delete,
    ]
  );
}
