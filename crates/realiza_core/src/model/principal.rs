//! Acting principal (staff user) referenced by record `created_by`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a principal.
pub type PrincipalId = Uuid;

/// Staff account that creates and manages records.
///
/// Principals are never soft-deleted; removing one that is still referenced
/// by a stored record is refused by storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub uuid: PrincipalId,
    pub username: String,
    pub email: Option<String>,
    pub is_active: bool,
    pub is_staff: bool,
    /// Unix epoch milliseconds, assigned by the repository on insert.
    pub created_at: i64,
}

impl Principal {
    /// Creates an active staff principal with a generated ID.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            username: username.into(),
            email: None,
            is_active: true,
            is_staff: true,
            created_at: 0,
        }
    }

    /// Whether this principal may sign in to the admin surface.
    pub fn can_access_admin(&self) -> bool {
        self.is_active && self.is_staff
    }
}
