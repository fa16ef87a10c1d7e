//! Actors — the principals that invoke lifecycle operations.
//!
//! Identity and role membership are resolved by the caller (the platform
//! dispatcher) before an operation reaches the core; this module only gives
//! those already-verified facts a shape.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque, caller-supplied actor identifier (platform user id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub String);

impl ActorId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ActorId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// The capability set the caller resolved for an actor.
///
/// `admin` implies the elevated capability — the admin role sits in every
/// moderator role list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
  pub elevated: bool,
  pub admin:    bool,
}

impl Capabilities {
  /// An ordinary end user: no claim/close-others rights.
  pub fn member() -> Self {
    Self { elevated: false, admin: false }
  }

  /// A moderator: may claim tickets and close any ticket.
  pub fn elevated() -> Self {
    Self { elevated: true, admin: false }
  }

  /// An administrator: moderator rights plus ticket deletion.
  pub fn admin() -> Self {
    Self { elevated: true, admin: true }
  }

  pub fn is_elevated(self) -> bool { self.elevated || self.admin }

  pub fn is_admin(self) -> bool { self.admin }
}

/// An identified principal plus the capabilities the caller vouches for.
/// The display name is carried only so audit entries stay human-readable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
  pub id:           ActorId,
  pub name:         String,
  pub capabilities: Capabilities,
}

impl Actor {
  pub fn new(
    id: impl Into<String>,
    name: impl Into<String>,
    capabilities: Capabilities,
  ) -> Self {
    Self { id: ActorId::new(id), name: name.into(), capabilities }
  }
}
