//! SQLite backend for the helpdesk ticket store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on one dedicated
//! connection thread without blocking the async runtime. That single thread
//! doubles as the store-wide write lock: every read-modify-write sequence
//! executes as one closure (and one SQL transaction), so capacity checks and
//! status validations can never interleave with a concurrent writer.

mod encode;
mod schema;
mod store;

pub use store::SqliteStore;

#[cfg(test)]
mod tests;
