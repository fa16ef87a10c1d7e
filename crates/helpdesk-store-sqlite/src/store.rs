//! [`SqliteStore`] — the SQLite implementation of [`TicketStore`].

use std::path::Path;

use helpdesk_core::{
  Error, Result,
  actor::ActorId,
  audit::AuditEntry,
  store::TicketStore,
  ticket::{StatusChange, Ticket, TicketId, TicketStatus},
};
use rusqlite::OptionalExtension as _;

use crate::{
  encode::{RawAuditEntry, RawTicket, decode_status, encode_dt},
  schema::SCHEMA,
};

// ─── Closure outcomes ────────────────────────────────────────────────────────

// Domain-level rejections decided inside a transaction travel back through
// the closure's Ok channel; the Err channel is reserved for real database
// failures.

enum CreateOutcome {
  Inserted,
  CapacityExceeded,
}

enum MutateOutcome {
  Applied(RawTicket),
  NotFound,
  /// The row exists but its current status (carried as the raw column
  /// string) is outside the allowed set.
  Conflict(String),
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A helpdesk ticket store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted, and every
/// clone funnels into the same serialized connection thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path)
      .await
      .map_err(Error::persistence)?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory()
      .await
      .map_err(Error::persistence)?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await
      .map_err(Error::persistence)
  }
}

// ─── TicketStore impl ────────────────────────────────────────────────────────

impl TicketStore for SqliteStore {
  async fn create(&self, ticket: Ticket, open_cap: u32) -> Result<Ticket> {
    let id_str      = ticket.id.as_str().to_owned();
    let owner_str   = ticket.owner_id.as_str().to_owned();
    let category    = ticket.category.discriminant();
    let status      = ticket.status.discriminant();
    let created_str = encode_dt(ticket.created_at);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        // Capacity count and insert share one transaction on the single
        // connection thread; two concurrent creates cannot both see a
        // below-cap count.
        let open_count: u32 = tx.query_row(
          "SELECT COUNT(*) FROM tickets
           WHERE owner_id = ?1 AND status IN ('open', 'claimed')",
          rusqlite::params![owner_str],
          |row| row.get(0),
        )?;
        if open_count >= open_cap {
          return Ok(CreateOutcome::CapacityExceeded);
        }

        tx.execute(
          "INSERT INTO tickets (
             ticket_id, owner_id, category, status,
             claimed_by, created_at, closed_at, archived_at
           ) VALUES (?1, ?2, ?3, ?4, NULL, ?5, NULL, NULL)",
          rusqlite::params![id_str, owner_str, category, status, created_str],
        )?;

        tx.commit()?;
        Ok(CreateOutcome::Inserted)
      })
      .await
      .map_err(Error::persistence)?;

    match outcome {
      CreateOutcome::Inserted => Ok(ticket),
      CreateOutcome::CapacityExceeded => Err(Error::CapacityExceeded {
        owner: ticket.owner_id.clone(),
        cap:   open_cap,
      }),
    }
  }

  async fn get(&self, id: TicketId) -> Result<Option<Ticket>> {
    let id_str = id.as_str().to_owned();

    let raw: Option<RawTicket> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM tickets WHERE ticket_id = ?1",
                RawTicket::COLUMNS
              ),
              rusqlite::params![id_str],
              RawTicket::from_row,
            )
            .optional()?,
        )
      })
      .await
      .map_err(Error::persistence)?;

    raw.map(RawTicket::into_ticket).transpose()
  }

  async fn list_by_owner(&self, owner: ActorId) -> Result<Vec<Ticket>> {
    let owner_str = owner.as_str().to_owned();

    let raws: Vec<RawTicket> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM tickets WHERE owner_id = ?1 ORDER BY created_at",
          RawTicket::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![owner_str], RawTicket::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(Error::persistence)?;

    raws.into_iter().map(RawTicket::into_ticket).collect()
  }

  async fn transition(
    &self,
    id: TicketId,
    allowed_from: &'static [TicketStatus],
    change: StatusChange,
  ) -> Result<Ticket> {
    let id_str = id.as_str().to_owned();
    let target = change.target();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let raw: Option<RawTicket> = tx
          .query_row(
            &format!(
              "SELECT {} FROM tickets WHERE ticket_id = ?1",
              RawTicket::COLUMNS
            ),
            rusqlite::params![id_str],
            RawTicket::from_row,
          )
          .optional()?;

        let Some(raw) = raw else {
          return Ok(MutateOutcome::NotFound);
        };
        if !allowed_from.iter().any(|s| s.discriminant() == raw.status) {
          return Ok(MutateOutcome::Conflict(raw.status));
        }

        match &change {
          StatusChange::Claim { by, .. } => {
            tx.execute(
              "UPDATE tickets SET status = 'claimed', claimed_by = ?2
               WHERE ticket_id = ?1",
              rusqlite::params![id_str, by.as_str()],
            )?;
          }
          StatusChange::Close { at } => {
            tx.execute(
              "UPDATE tickets SET status = 'closed', closed_at = ?2
               WHERE ticket_id = ?1",
              rusqlite::params![id_str, encode_dt(*at)],
            )?;
          }
          StatusChange::Archive { at } => {
            tx.execute(
              "UPDATE tickets SET status = 'archived', archived_at = ?2
               WHERE ticket_id = ?1",
              rusqlite::params![id_str, encode_dt(*at)],
            )?;
          }
        }

        let updated = tx.query_row(
          &format!(
            "SELECT {} FROM tickets WHERE ticket_id = ?1",
            RawTicket::COLUMNS
          ),
          rusqlite::params![id_str],
          RawTicket::from_row,
        )?;

        tx.commit()?;
        Ok(MutateOutcome::Applied(updated))
      })
      .await
      .map_err(Error::persistence)?;

    match outcome {
      MutateOutcome::Applied(raw) => raw.into_ticket(),
      MutateOutcome::NotFound => Err(Error::NotFound(id)),
      MutateOutcome::Conflict(status) => Err(Error::InvalidTransition {
        ticket: id,
        from:   decode_status(&status)?,
        to:     target,
      }),
    }
  }

  async fn remove(
    &self,
    id: TicketId,
    allowed_from: &'static [TicketStatus],
  ) -> Result<Ticket> {
    let id_str = id.as_str().to_owned();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let raw: Option<RawTicket> = tx
          .query_row(
            &format!(
              "SELECT {} FROM tickets WHERE ticket_id = ?1",
              RawTicket::COLUMNS
            ),
            rusqlite::params![id_str],
            RawTicket::from_row,
          )
          .optional()?;

        let Some(raw) = raw else {
          return Ok(MutateOutcome::NotFound);
        };
        if !allowed_from.iter().any(|s| s.discriminant() == raw.status) {
          return Ok(MutateOutcome::Conflict(raw.status));
        }

        tx.execute(
          "DELETE FROM tickets WHERE ticket_id = ?1",
          rusqlite::params![id_str],
        )?;

        tx.commit()?;
        Ok(MutateOutcome::Applied(raw))
      })
      .await
      .map_err(Error::persistence)?;

    match outcome {
      MutateOutcome::Applied(raw) => raw.into_ticket(),
      MutateOutcome::NotFound => Err(Error::NotFound(id)),
      MutateOutcome::Conflict(status) => Err(Error::InvalidTransition {
        ticket: id,
        from:   decode_status(&status)?,
        to:     TicketStatus::Deleted,
      }),
    }
  }

  async fn append_audit(&self, entry: AuditEntry) -> Result<()> {
    let at_str     = encode_dt(entry.timestamp);
    let action     = entry.action.discriminant();
    let actor_id   = entry.actor_id;
    let actor_name = entry.actor_name;
    let ticket_str = entry.ticket_id.as_str().to_owned();
    let detail     = entry.detail;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO audit_log (at, action, actor_id, actor_name, ticket_id, detail)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![at_str, action, actor_id, actor_name, ticket_str, detail],
        )?;
        Ok(())
      })
      .await
      .map_err(Error::persistence)
  }

  async fn audit_for_ticket(&self, ticket_id: TicketId) -> Result<Vec<AuditEntry>> {
    let ticket_str = ticket_id.as_str().to_owned();

    let raws: Vec<RawAuditEntry> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT at, action, actor_id, actor_name, ticket_id, detail
           FROM audit_log WHERE ticket_id = ?1 ORDER BY seq",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![ticket_str], RawAuditEntry::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(Error::persistence)?;

    raws.into_iter().map(RawAuditEntry::into_entry).collect()
  }
}
