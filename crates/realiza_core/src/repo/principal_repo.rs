//! Principal repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Principals are hard-deleted only.
//! - Deleting a principal still referenced by any stored record's
//!   `created_by` (alive or tombstoned) fails with `ConstraintViolation`.

use crate::model::principal::{Principal, PrincipalId};
use crate::repo::{
    bool_to_int, ensure_connection_ready, int_to_bool, now_epoch_ms, parse_uuid, RepoError,
    RepoResult,
};
use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension, Row};

const PRINCIPAL_COLUMNS: &[&str] = &[
    "uuid",
    "username",
    "email",
    "is_active",
    "is_staff",
    "created_at",
];

/// Repository interface for principals.
pub trait PrincipalRepository {
    fn create_principal(&self, principal: &mut Principal) -> RepoResult<PrincipalId>;
    fn get_principal(&self, id: PrincipalId) -> RepoResult<Option<Principal>>;
    fn list_principals(&self) -> RepoResult<Vec<Principal>>;
    fn delete_principal(&self, id: PrincipalId) -> RepoResult<()>;
}

/// SQLite-backed principal repository.
pub struct SqlitePrincipalRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePrincipalRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "principals", PRINCIPAL_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl PrincipalRepository for SqlitePrincipalRepository<'_> {
    fn create_principal(&self, principal: &mut Principal) -> RepoResult<PrincipalId> {
        if principal.username.trim().is_empty() {
            return Err(RepoError::InvalidData(
                "principal username must not be empty".to_string(),
            ));
        }
        principal.created_at = now_epoch_ms();

        self.conn.execute(
            "INSERT INTO principals (
                uuid,
                username,
                email,
                is_active,
                is_staff,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                principal.uuid.to_string(),
                principal.username.trim(),
                principal.email.as_deref(),
                bool_to_int(principal.is_active),
                bool_to_int(principal.is_staff),
                principal.created_at,
            ],
        )?;

        Ok(principal.uuid)
    }

    fn get_principal(&self, id: PrincipalId) -> RepoResult<Option<Principal>> {
        let principal = self
            .conn
            .query_row(
                "SELECT uuid, username, email, is_active, is_staff, created_at
                 FROM principals
                 WHERE uuid = ?1;",
                [id.to_string()],
                |row| Ok(parse_principal_row(row)),
            )
            .optional()?;

        principal.transpose()
    }

    fn list_principals(&self) -> RepoResult<Vec<Principal>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, username, email, is_active, is_staff, created_at
             FROM principals
             ORDER BY username ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut principals = Vec::new();
        while let Some(row) = rows.next()? {
            principals.push(parse_principal_row(row)?);
        }
        Ok(principals)
    }

    fn delete_principal(&self, id: PrincipalId) -> RepoResult<()> {
        let changed = match self
            .conn
            .execute("DELETE FROM principals WHERE uuid = ?1;", [id.to_string()])
        {
            Ok(changed) => changed,
            Err(err) => {
                let err = RepoError::from(err);
                if matches!(err, RepoError::ConstraintViolation(_)) {
                    warn!(
                        "event=principal_delete module=repo status=refused error_code=principal_referenced"
                    );
                }
                return Err(err);
            }
        };

        if changed == 0 {
            return Err(RepoError::not_found("principals", id));
        }

        info!("event=principal_delete module=repo status=ok");
        Ok(())
    }
}

fn parse_principal_row(row: &Row<'_>) -> RepoResult<Principal> {
    let uuid_text: String = row.get("uuid")?;
    Ok(Principal {
        uuid: parse_uuid(&uuid_text, "principals", "uuid")?,
        username: row.get("username")?,
        email: row.get("email")?,
        is_active: int_to_bool(row.get("is_active")?, "principals", "is_active")?,
        is_staff: int_to_bool(row.get("is_staff")?, "principals", "is_staff")?,
        created_at: row.get("created_at")?,
    })
}
