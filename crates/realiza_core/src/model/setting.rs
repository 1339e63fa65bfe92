//! Internal key/value configuration stored in the database.

use serde::{Deserialize, Serialize};

/// One named configuration entry.
///
/// Settings are plain rows: they are not soft-deletable and `name` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    pub name: String,
    pub value: Option<String>,
    /// Disabled settings are invisible to value lookups.
    pub enabled: bool,
    pub obs: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}
