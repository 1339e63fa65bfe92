//! Soft-deletion data access layer shared by every record table.
//!
//! # Responsibility
//! - Provide two query surfaces over one table: `objects()` (alive-only
//!   default scope) and `all_objects()` (every row).
//! - Provide soft delete as the default deletion path and hard delete as a
//!   separate explicit path.
//! - Stamp `created_at`/`updated_at` on every layer-mediated write.
//!
//! # Invariants
//! - The alive-only scope filters `is_deleted = 0`.
//! - `alive()` narrows to `deleted_at IS NULL AND is_deleted = 0`; `dead()`
//!   is the exclusion of that same conjunction.
//! - Soft delete sets `is_deleted` and `deleted_at` together and never
//!   refreshes the `deleted_at` of an already deleted row.
//! - Queries are lazy: nothing touches storage until `fetch`, `count`,
//!   `exists`, `soft_delete` or `hard_delete` runs, and a query can be
//!   cloned and executed again.

use crate::model::principal::PrincipalId;
use crate::model::record::{RecordId, RecordMeta, RecordValidationError, SoftDeletable};
use crate::repo::{
    bool_to_int, ensure_connection_ready, int_or_null, int_to_bool, now_epoch_ms, parse_uuid,
    text_or_null, RepoError, RepoResult,
};
use log::{debug, info};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use std::marker::PhantomData;

/// Lifecycle columns shared by every record table, in storage order.
pub const META_COLUMNS: &[&str] = &[
    "uuid",
    "obs",
    "enabled",
    "created_at",
    "updated_at",
    "deleted_at",
    "is_deleted",
    "created_by",
];

const ALIVE_SQL: &str = "(deleted_at IS NULL AND is_deleted = 0)";
const ORDER_SQL: &str = " ORDER BY created_at DESC, uuid ASC";

/// Binding between a record type and its SQLite table.
///
/// `FIELDS` lists the record-specific columns and must be in the same order
/// as the values returned by `field_values`.
pub trait RecordTable: SoftDeletable + Sized {
    const TABLE: &'static str;
    const FIELDS: &'static [&'static str];

    /// Canonicalizes field text in place before validation.
    fn normalize_record(&mut self) {}
    /// Full validation, including `RecordMeta::validate`.
    fn validate_record(&self) -> Result<(), RecordValidationError>;
    fn field_values(&self) -> Vec<Value>;
    fn from_row(meta: RecordMeta, row: &Row<'_>) -> RepoResult<Self>;
}

/// Base visibility of a query before any refinement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Default manager: rows with `is_deleted = 0`.
    AliveOnly,
    /// Every stored row, including tombstones.
    All,
}

impl Scope {
    pub fn from_alive_only(alive_only: bool) -> Self {
        if alive_only {
            Self::AliveOnly
        } else {
            Self::All
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::AliveOnly => "alive_only",
            Self::All => "all",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    Alive,
    Dead,
    Ids(Vec<RecordId>),
    Enabled(bool),
    CreatedBy(Option<PrincipalId>),
    Eq { column: String, value: Value },
}

/// Lazily evaluated, chainable collection of records.
pub struct RecordQuery<'conn, M> {
    conn: &'conn Connection,
    scope: Scope,
    predicates: Vec<Predicate>,
    limit: Option<u32>,
    offset: u32,
    _record: PhantomData<fn() -> M>,
}

impl<M> Clone for RecordQuery<'_, M> {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn,
            scope: self.scope,
            predicates: self.predicates.clone(),
            limit: self.limit,
            offset: self.offset,
            _record: PhantomData,
        }
    }
}

impl<'conn, M: RecordTable> RecordQuery<'conn, M> {
    pub fn new(conn: &'conn Connection, scope: Scope) -> Self {
        Self {
            conn,
            scope,
            predicates: Vec::new(),
            limit: None,
            offset: 0,
            _record: PhantomData,
        }
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Narrows to rows where `deleted_at IS NULL AND is_deleted = 0`.
    pub fn alive(mut self) -> Self {
        self.predicates.push(Predicate::Alive);
        self
    }

    /// Narrows to rows failing the alive conjunction.
    pub fn dead(mut self) -> Self {
        self.predicates.push(Predicate::Dead);
        self
    }

    /// Narrows to the given ids. An empty id set matches nothing.
    pub fn with_ids(mut self, ids: impl IntoIterator<Item = RecordId>) -> Self {
        self.predicates
            .push(Predicate::Ids(ids.into_iter().collect()));
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.predicates.push(Predicate::Enabled(enabled));
        self
    }

    /// `None` matches rows without a recorded creator.
    pub fn created_by(mut self, principal: Option<PrincipalId>) -> Self {
        self.predicates.push(Predicate::CreatedBy(principal));
        self
    }

    /// Equality filter on any table column; `Value::Null` matches `IS NULL`.
    ///
    /// Unknown columns surface as `RepoError::UnknownColumn` when the query
    /// executes.
    pub fn where_eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate::Eq {
            column: column.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Executes the query, newest records first.
    pub fn fetch(&self) -> RepoResult<Vec<M>> {
        let (selection, bind_values) = self.selection_sql()?;
        let sql = format!(
            "SELECT {} FROM {} {selection}",
            column_list::<M>(),
            M::TABLE
        );
        debug!(
            "event=record_query module=repo table={} scope={}",
            M::TABLE,
            self.scope.as_str()
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let meta = parse_meta(row, M::TABLE)?;
            records.push(M::from_row(meta, row)?);
        }
        Ok(records)
    }

    pub fn first(&self) -> RepoResult<Option<M>> {
        Ok(self.single_row().fetch()?.into_iter().next())
    }

    pub fn count(&self) -> RepoResult<u64> {
        let (selection, bind_values) = self.selection_sql()?;
        let count: i64 = self.conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM (SELECT uuid FROM {} {selection});",
                M::TABLE
            ),
            params_from_iter(bind_values),
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative row count `{count}`")))
    }

    pub fn exists(&self) -> RepoResult<bool> {
        Ok(self.single_row().count()? > 0)
    }

    /// Narrows the page to at most one row without widening a smaller limit.
    fn single_row(&self) -> Self {
        let limit = self.limit.map_or(1, |limit| limit.min(1));
        self.clone().limit(limit)
    }

    /// Marks every matched row deleted and returns how many rows changed.
    ///
    /// Rows already carrying both tombstone fields are skipped, so repeated
    /// calls keep the first `deleted_at`. A half-deleted row is completed and
    /// keeps whichever `deleted_at` it already had.
    pub fn soft_delete(&self) -> RepoResult<usize> {
        let (selection, selection_values) = self.selection_sql()?;
        let now = now_epoch_ms();
        let mut bind_values = vec![Value::Integer(now), Value::Integer(now)];
        bind_values.extend(selection_values);

        let affected = self.conn.execute(
            &format!(
                "UPDATE {table}
                 SET
                    is_deleted = 1,
                    deleted_at = COALESCE(deleted_at, ?),
                    updated_at = ?
                 WHERE NOT (is_deleted = 1 AND deleted_at IS NOT NULL)
                   AND uuid IN (SELECT uuid FROM {table} {selection});",
                table = M::TABLE
            ),
            params_from_iter(bind_values),
        )?;

        info!(
            "event=record_soft_delete module=repo table={} scope={} status=ok affected={}",
            M::TABLE,
            self.scope.as_str(),
            affected
        );
        Ok(affected)
    }

    /// Physically removes every matched row. Irreversible.
    pub fn hard_delete(&self) -> RepoResult<usize> {
        let (selection, bind_values) = self.selection_sql()?;
        let affected = self.conn.execute(
            &format!(
                "DELETE FROM {table}
                 WHERE uuid IN (SELECT uuid FROM {table} {selection});",
                table = M::TABLE
            ),
            params_from_iter(bind_values),
        )?;

        info!(
            "event=record_hard_delete module=repo table={} scope={} status=ok affected={}",
            M::TABLE,
            self.scope.as_str(),
            affected
        );
        Ok(affected)
    }

    /// Renders `WHERE ... ORDER BY ... [LIMIT ... OFFSET ...]` with binds.
    fn selection_sql(&self) -> RepoResult<(String, Vec<Value>)> {
        let mut sql = String::from("WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if self.scope == Scope::AliveOnly {
            sql.push_str(" AND is_deleted = 0");
        }

        for predicate in &self.predicates {
            match predicate {
                Predicate::Alive => {
                    sql.push_str(" AND ");
                    sql.push_str(ALIVE_SQL);
                }
                Predicate::Dead => {
                    sql.push_str(" AND NOT ");
                    sql.push_str(ALIVE_SQL);
                }
                Predicate::Ids(ids) if ids.is_empty() => sql.push_str(" AND 0 = 1"),
                Predicate::Ids(ids) => {
                    let placeholders = vec!["?"; ids.len()].join(", ");
                    sql.push_str(&format!(" AND uuid IN ({placeholders})"));
                    bind_values.extend(ids.iter().map(|id| Value::Text(id.to_string())));
                }
                Predicate::Enabled(enabled) => {
                    sql.push_str(" AND enabled = ?");
                    bind_values.push(Value::Integer(bool_to_int(*enabled)));
                }
                Predicate::CreatedBy(Some(principal)) => {
                    sql.push_str(" AND created_by = ?");
                    bind_values.push(Value::Text(principal.to_string()));
                }
                Predicate::CreatedBy(None) => sql.push_str(" AND created_by IS NULL"),
                Predicate::Eq { column, value } => {
                    if !is_known_column::<M>(column) {
                        return Err(RepoError::UnknownColumn {
                            table: M::TABLE,
                            column: column.clone(),
                        });
                    }
                    if *value == Value::Null {
                        sql.push_str(&format!(" AND {column} IS NULL"));
                    } else {
                        sql.push_str(&format!(" AND {column} = ?"));
                        bind_values.push(value.clone());
                    }
                }
            }
        }

        sql.push_str(ORDER_SQL);

        if let Some(limit) = self.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if self.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(self.offset)));
            }
        } else if self.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(self.offset)));
        }

        Ok((sql, bind_values))
    }
}

/// Repository contract for soft-deletable records.
///
/// Listing is split into two named operations so callers state which
/// visibility they need.
pub trait RecordRepository<M: RecordTable> {
    /// Stamps `created_at`/`updated_at`, validates and inserts.
    fn insert(&self, record: &mut M) -> RepoResult<RecordId>;
    /// Normalizes, validates, refreshes `updated_at` and overwrites every
    /// mutable column.
    fn update(&self, record: &mut M) -> RepoResult<()>;
    fn get(&self, id: RecordId, include_deleted: bool) -> RepoResult<Option<M>>;
    /// Rows visible through the default alive-only scope.
    fn list_alive(&self) -> RepoResult<Vec<M>>;
    /// Every stored row, including tombstones.
    fn list_all(&self) -> RepoResult<Vec<M>>;
    /// Tombstones one record. Repeated calls succeed without changes.
    fn soft_delete(&self, id: RecordId) -> RepoResult<()>;
    /// Physically removes one record.
    fn hard_delete(&self, id: RecordId) -> RepoResult<()>;
}

/// SQLite-backed repository for any `RecordTable`.
pub struct SqliteRecordRepository<'conn, M> {
    conn: &'conn Connection,
    _record: PhantomData<fn() -> M>,
}

impl<'conn, M: RecordTable> SqliteRecordRepository<'conn, M> {
    /// Creates a repository after verifying the connection schema.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, M::TABLE, META_COLUMNS.iter().chain(M::FIELDS.iter()))?;
        Ok(Self {
            conn,
            _record: PhantomData,
        })
    }

    /// Starts a query in alive-only (`true`) or unfiltered (`false`) scope.
    pub fn query(&self, alive_only: bool) -> RecordQuery<'conn, M> {
        RecordQuery::new(self.conn, Scope::from_alive_only(alive_only))
    }

    /// Default access path: hides rows with `is_deleted = 1`.
    pub fn objects(&self) -> RecordQuery<'conn, M> {
        self.query(true)
    }

    /// Unfiltered access path for "show deleted" views.
    pub fn all_objects(&self) -> RecordQuery<'conn, M> {
        self.query(false)
    }
}

impl<M: RecordTable> RecordRepository<M> for SqliteRecordRepository<'_, M> {
    fn insert(&self, record: &mut M) -> RepoResult<RecordId> {
        record.normalize_record();
        record.validate_record()?;

        let now = now_epoch_ms();
        let meta = record.meta_mut();
        meta.created_at = now;
        meta.updated_at = now;

        let mut bind_values: Vec<Value> = meta_values(record.meta())
            .into_iter()
            .map(|(_, value)| value)
            .collect();
        bind_values.extend(checked_field_values(record)?);
        let placeholders = vec!["?"; bind_values.len()].join(", ");

        self.conn.execute(
            &format!(
                "INSERT INTO {} ({}) VALUES ({placeholders});",
                M::TABLE,
                column_list::<M>()
            ),
            params_from_iter(bind_values),
        )?;

        info!(
            "event=record_insert module=repo table={} status=ok",
            M::TABLE
        );
        Ok(record.id())
    }

    fn update(&self, record: &mut M) -> RepoResult<()> {
        record.normalize_record();
        record.validate_record()?;
        record.meta_mut().updated_at = now_epoch_ms();

        let mut assignments = Vec::new();
        let mut bind_values = Vec::new();
        for (column, value) in meta_values(record.meta()) {
            if column == "uuid" || column == "created_at" {
                continue;
            }
            assignments.push(format!("{column} = ?"));
            bind_values.push(value);
        }
        for (column, value) in M::FIELDS.iter().zip(checked_field_values(record)?) {
            assignments.push(format!("{column} = ?"));
            bind_values.push(value);
        }
        bind_values.push(Value::Text(record.id().to_string()));

        let changed = self.conn.execute(
            &format!(
                "UPDATE {} SET {} WHERE uuid = ?;",
                M::TABLE,
                assignments.join(", ")
            ),
            params_from_iter(bind_values),
        )?;

        if changed == 0 {
            return Err(RepoError::not_found(M::TABLE, record.id()));
        }
        Ok(())
    }

    fn get(&self, id: RecordId, include_deleted: bool) -> RepoResult<Option<M>> {
        self.query(!include_deleted).with_ids([id]).first()
    }

    fn list_alive(&self) -> RepoResult<Vec<M>> {
        self.objects().fetch()
    }

    fn list_all(&self) -> RepoResult<Vec<M>> {
        self.all_objects().fetch()
    }

    fn soft_delete(&self, id: RecordId) -> RepoResult<()> {
        let target = self.all_objects().with_ids([id]);
        if target.soft_delete()? == 0 && !target.exists()? {
            return Err(RepoError::not_found(M::TABLE, id));
        }
        Ok(())
    }

    fn hard_delete(&self, id: RecordId) -> RepoResult<()> {
        let affected = self.all_objects().with_ids([id]).hard_delete()?;
        if affected == 0 {
            return Err(RepoError::not_found(M::TABLE, id));
        }
        Ok(())
    }
}

fn column_list<M: RecordTable>() -> String {
    META_COLUMNS
        .iter()
        .chain(M::FIELDS.iter())
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
}

fn is_known_column<M: RecordTable>(column: &str) -> bool {
    META_COLUMNS
        .iter()
        .chain(M::FIELDS.iter())
        .any(|known| *known == column)
}

fn meta_values(meta: &RecordMeta) -> Vec<(&'static str, Value)> {
    vec![
        ("uuid", Value::Text(meta.uuid.to_string())),
        ("obs", text_or_null(meta.obs.as_deref())),
        ("enabled", Value::Integer(bool_to_int(meta.enabled))),
        ("created_at", Value::Integer(meta.created_at)),
        ("updated_at", Value::Integer(meta.updated_at)),
        ("deleted_at", int_or_null(meta.deleted_at)),
        ("is_deleted", Value::Integer(bool_to_int(meta.is_deleted))),
        (
            "created_by",
            text_or_null(meta.created_by.map(|id| id.to_string()).as_deref()),
        ),
    ]
}

fn checked_field_values<M: RecordTable>(record: &M) -> RepoResult<Vec<Value>> {
    let values = record.field_values();
    if values.len() != M::FIELDS.len() {
        return Err(RepoError::InvalidData(format!(
            "{} expects {} field values, got {}",
            M::TABLE,
            M::FIELDS.len(),
            values.len()
        )));
    }
    Ok(values)
}

/// Decodes lifecycle columns.
///
/// Deletion pairing is not checked here: externally mutated rows must still
/// load so they can be classified as dead.
fn parse_meta(row: &Row<'_>, table: &'static str) -> RepoResult<RecordMeta> {
    let uuid_text: String = row.get("uuid")?;
    let created_by = match row.get::<_, Option<String>>("created_by")? {
        Some(value) => Some(parse_uuid(&value, table, "created_by")?),
        None => None,
    };

    Ok(RecordMeta {
        uuid: parse_uuid(&uuid_text, table, "uuid")?,
        obs: row.get("obs")?,
        enabled: int_to_bool(row.get("enabled")?, table, "enabled")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
        is_deleted: int_to_bool(row.get("is_deleted")?, table, "is_deleted")?,
        created_by,
    })
}
