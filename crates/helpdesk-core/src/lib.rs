//! Core types and trait definitions for the helpdesk ticket system.
//!
//! This crate is deliberately free of database and platform dependencies.
//! It owns the ticket lifecycle state machine, the permission policy, the
//! per-actor creation cooldown, and the audit-log contract; storage backends
//! and front ends depend on it, not the other way around.

pub mod actor;
pub mod audit;
pub mod config;
pub mod cooldown;
pub mod error;
pub mod lifecycle;
pub mod policy;
pub mod store;
pub mod ticket;

pub use error::{Error, Result};
