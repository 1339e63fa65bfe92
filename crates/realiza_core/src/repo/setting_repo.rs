//! Internal settings (`config_settings`) repository.
//!
//! # Invariants
//! - `name` is unique; `upsert_setting` overwrites the value of an existing
//!   name and keeps its `created_at`.
//! - `setting_value` only resolves enabled settings.
//! - `is_enabled` treats a missing setting as an enabled feature flag.

use crate::model::setting::Setting;
use crate::repo::{
    bool_to_int, ensure_connection_ready, int_to_bool, now_epoch_ms, RepoError, RepoResult,
};
use rusqlite::{params, Connection, OptionalExtension, Row};

const SETTING_COLUMNS: &[&str] = &[
    "name",
    "value",
    "enabled",
    "obs",
    "created_at",
    "updated_at",
];

const SETTING_SELECT_SQL: &str = "SELECT
    name,
    value,
    enabled,
    obs,
    created_at,
    updated_at
FROM config_settings";

pub trait SettingRepository {
    /// Inserts or replaces the value for `name`. Returns the stored row.
    fn upsert_setting(&self, name: &str, value: Option<&str>) -> RepoResult<Setting>;
    fn get_setting(&self, name: &str) -> RepoResult<Option<Setting>>;
    /// Value of an enabled setting; `None` when missing, disabled or null.
    fn setting_value(&self, name: &str) -> RepoResult<Option<String>>;
    /// Feature-flag check: the stored `enabled`, or `true` when no row exists.
    fn is_enabled(&self, name: &str) -> RepoResult<bool>;
    fn set_setting_enabled(&self, name: &str, enabled: bool) -> RepoResult<()>;
    fn list_settings(&self) -> RepoResult<Vec<Setting>>;
}

pub struct SqliteSettingRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSettingRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "config_settings", SETTING_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl SettingRepository for SqliteSettingRepository<'_> {
    fn upsert_setting(&self, name: &str, value: Option<&str>) -> RepoResult<Setting> {
        let name = normalize_name(name)?;
        let now = now_epoch_ms();

        self.conn.execute(
            "INSERT INTO config_settings (name, value, enabled, created_at, updated_at)
             VALUES (?1, ?2, 1, ?3, ?3)
             ON CONFLICT(name) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![name, value, now],
        )?;

        self.get_setting(name)?
            .ok_or_else(|| RepoError::not_found("config_settings", name))
    }

    fn get_setting(&self, name: &str) -> RepoResult<Option<Setting>> {
        let setting = self
            .conn
            .query_row(
                &format!("{SETTING_SELECT_SQL} WHERE name = ?1;"),
                [name.trim()],
                |row| Ok(parse_setting_row(row)),
            )
            .optional()?;

        setting.transpose()
    }

    fn setting_value(&self, name: &str) -> RepoResult<Option<String>> {
        Ok(self
            .get_setting(name)?
            .filter(|setting| setting.enabled)
            .and_then(|setting| setting.value))
    }

    fn is_enabled(&self, name: &str) -> RepoResult<bool> {
        Ok(self
            .get_setting(name)?
            .map_or(true, |setting| setting.enabled))
    }

    fn set_setting_enabled(&self, name: &str, enabled: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE config_settings
             SET enabled = ?1, updated_at = ?2
             WHERE name = ?3;",
            params![bool_to_int(enabled), now_epoch_ms(), name.trim()],
        )?;

        if changed == 0 {
            return Err(RepoError::not_found("config_settings", name.trim()));
        }
        Ok(())
    }

    fn list_settings(&self) -> RepoResult<Vec<Setting>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SETTING_SELECT_SQL} ORDER BY name ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut settings = Vec::new();
        while let Some(row) = rows.next()? {
            settings.push(parse_setting_row(row)?);
        }
        Ok(settings)
    }
}

fn normalize_name(name: &str) -> RepoResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(RepoError::InvalidData(
            "setting name must not be empty".to_string(),
        ));
    }
    Ok(trimmed)
}

fn parse_setting_row(row: &Row<'_>) -> RepoResult<Setting> {
    Ok(Setting {
        name: row.get("name")?,
        value: row.get("value")?,
        enabled: int_to_bool(row.get("enabled")?, "config_settings", "enabled")?,
        obs: row.get("obs")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
