//! Core configuration knobs.

use serde::{Deserialize, Serialize};

/// Tunables consumed by [`crate::lifecycle::TicketLifecycle`].
///
/// The defaults match production behaviour; deployments running in a test or
/// beta mode shorten `cooldown_secs` (historically to one second).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
  /// Minimum seconds between ticket creations by the same actor.
  pub cooldown_secs:            u64,
  /// Maximum simultaneously Open/Claimed tickets per owner.
  pub open_ticket_cap:          u32,
  /// Cooldown-table size above which an acquire triggers a sweep.
  pub cooldown_sweep_threshold: usize,
}

impl Default for CoreConfig {
  fn default() -> Self {
    Self {
      cooldown_secs:            60,
      open_ticket_cap:          3,
      cooldown_sweep_threshold: 1000,
    }
  }
}
