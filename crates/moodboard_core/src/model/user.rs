//! User identity record.
//!
//! Identity only: registration, credentials and token issuance live in an
//! external collaborator and never enter this crate.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable user identifier.
pub type UserId = Uuid;

/// A known identity that can own boards, tasks and journal entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable global ID.
    pub uuid: UserId,
    /// Unique login-style handle.
    pub username: String,
}

impl User {
    /// Creates a user with a generated stable ID.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            username: username.into(),
        }
    }
}
