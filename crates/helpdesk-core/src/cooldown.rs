//! Per-actor creation rate limiting.
//!
//! A TTL map from actor id to last creation time, held entirely in memory
//! for the lifetime of the process. The sweep is a best-effort memory bound,
//! never required for correctness: an expired entry that survives a while
//! longer still compares as expired on the next acquire.

use std::{collections::HashMap, sync::Mutex};

use chrono::{DateTime, TimeDelta, Utc};

use crate::actor::ActorId;

/// Enforces a minimum interval between successive ticket creations by the
/// same actor. Safe to share across concurrent callers.
pub struct CooldownManager {
  window:          TimeDelta,
  sweep_threshold: usize,
  entries:         Mutex<HashMap<ActorId, DateTime<Utc>>>,
}

impl CooldownManager {
  pub fn new(window_secs: u64, sweep_threshold: usize) -> Self {
    Self {
      window: TimeDelta::seconds(window_secs as i64),
      sweep_threshold,
      entries: Mutex::new(HashMap::new()),
    }
  }

  pub fn window_secs(&self) -> u64 { self.window.num_seconds().max(0) as u64 }

  /// Atomic check-and-set: if the actor's last creation is at least a full
  /// window in the past (or absent), record `now` and return true; otherwise
  /// leave the entry untouched and return false.
  pub fn try_acquire(&self, actor: &ActorId, now: DateTime<Utc>) -> bool {
    let mut entries = self.lock();

    // Opportunistic housekeeping before the table grows unbounded.
    if entries.len() > self.sweep_threshold {
      Self::sweep_map(&mut entries, self.window, now);
    }

    match entries.get(actor) {
      Some(last) if now.signed_duration_since(*last) < self.window => false,
      _ => {
        entries.insert(actor.clone(), now);
        true
      }
    }
  }

  /// Drop every entry older than the cooldown window.
  pub fn sweep(&self, now: DateTime<Utc>) {
    let mut entries = self.lock();
    Self::sweep_map(&mut entries, self.window, now);
  }

  /// Number of live entries; exposed for housekeeping diagnostics.
  pub fn len(&self) -> usize { self.lock().len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  fn sweep_map(
    entries: &mut HashMap<ActorId, DateTime<Utc>>,
    window: TimeDelta,
    now: DateTime<Utc>,
  ) {
    entries.retain(|_, last| now.signed_duration_since(*last) < window);
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ActorId, DateTime<Utc>>> {
    // A poisoned lock only means another thread panicked mid-insert; the map
    // is still a valid map, so recover it rather than propagate the panic.
    self.entries.lock().unwrap_or_else(|e| e.into_inner())
  }
}
