//! Shared record metadata and soft-delete liveness rules.
//!
//! # Responsibility
//! - Define the lifecycle columns every soft-deletable record carries.
//! - Classify records as alive or dead with one canonical predicate.
//!
//! # Invariants
//! - A record is alive iff `is_deleted == false` and `deleted_at == None`.
//! - Layer-mediated mutations set/clear `is_deleted` and `deleted_at` together.
//! - Dead is the negation of the alive conjunction, so a half-deleted record
//!   (only one of the two fields set) is dead.

use crate::model::principal::PrincipalId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identity key of a soft-deletable record.
pub type RecordId = Uuid;

/// Upper bound for the internal `obs` note.
pub const OBS_MAX_CHARS: usize = 500;

/// Validation failures shared by all records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordValidationError {
    NilUuid,
    /// `is_deleted` and `deleted_at` disagree.
    InconsistentDeletion {
        is_deleted: bool,
        deleted_at: Option<i64>,
    },
    ObsTooLong(usize),
    /// A record-specific field failed validation.
    Field {
        field: &'static str,
        message: String,
    },
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilUuid => write!(f, "record uuid must not be nil"),
            Self::InconsistentDeletion {
                is_deleted,
                deleted_at,
            } => write!(
                f,
                "is_deleted={is_deleted} disagrees with deleted_at={deleted_at:?}"
            ),
            Self::ObsTooLong(len) => write!(
                f,
                "obs has {len} characters, maximum is {OBS_MAX_CHARS}"
            ),
            Self::Field { field, message } => write!(f, "invalid `{field}`: {message}"),
        }
    }
}

impl Error for RecordValidationError {}

/// Lifecycle columns embedded in every soft-deletable record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
    pub uuid: RecordId,
    /// Internal notes, never shown to customers.
    pub obs: Option<String>,
    /// Business visibility flag. Independent from deletion.
    pub enabled: bool,
    /// Unix epoch milliseconds, assigned by the repository on insert.
    pub created_at: i64,
    /// Unix epoch milliseconds, refreshed by the repository on every write.
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
    pub is_deleted: bool,
    pub created_by: Option<PrincipalId>,
}

impl RecordMeta {
    /// Creates alive metadata with a generated id.
    ///
    /// Timestamps start at `0` until the repository assigns them on insert.
    pub fn new(created_by: Option<PrincipalId>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            obs: None,
            enabled: true,
            created_at: 0,
            updated_at: 0,
            deleted_at: None,
            is_deleted: false,
            created_by,
        }
    }

    /// Creates alive metadata for an externally known id.
    pub fn with_id(
        uuid: RecordId,
        created_by: Option<PrincipalId>,
    ) -> Result<Self, RecordValidationError> {
        if uuid.is_nil() {
            return Err(RecordValidationError::NilUuid);
        }
        Ok(Self {
            uuid,
            ..Self::new(created_by)
        })
    }

    /// Returns whether the alive conjunction holds.
    pub fn is_alive(&self) -> bool {
        !self.is_deleted && self.deleted_at.is_none()
    }

    /// Returns whether the record fails the alive conjunction.
    pub fn is_dead(&self) -> bool {
        !self.is_alive()
    }

    /// Marks the record deleted at `now`.
    ///
    /// A record that is already fully deleted keeps its original `deleted_at`.
    pub fn soft_delete(&mut self, now: i64) {
        self.is_deleted = true;
        if self.deleted_at.is_none() {
            self.deleted_at = Some(now);
        }
    }

    /// Clears both deletion fields.
    pub fn restore(&mut self) {
        self.is_deleted = false;
        self.deleted_at = None;
    }

    /// Checks id and deletion pairing before persistence.
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        if self.uuid.is_nil() {
            return Err(RecordValidationError::NilUuid);
        }
        if self.is_deleted != self.deleted_at.is_some() {
            return Err(RecordValidationError::InconsistentDeletion {
                is_deleted: self.is_deleted,
                deleted_at: self.deleted_at,
            });
        }
        if let Some(obs) = &self.obs {
            let len = obs.chars().count();
            if len > OBS_MAX_CHARS {
                return Err(RecordValidationError::ObsTooLong(len));
            }
        }
        Ok(())
    }
}

/// Access to the embedded lifecycle metadata.
pub trait SoftDeletable {
    fn meta(&self) -> &RecordMeta;
    fn meta_mut(&mut self) -> &mut RecordMeta;

    fn id(&self) -> RecordId {
        self.meta().uuid
    }

    fn is_alive(&self) -> bool {
        self.meta().is_alive()
    }
}

impl SoftDeletable for RecordMeta {
    fn meta(&self) -> &RecordMeta {
        self
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        self
    }
}

/// Keeps only alive records, preserving order.
pub fn filter_alive<T, I>(records: I) -> Vec<T>
where
    T: SoftDeletable,
    I: IntoIterator<Item = T>,
{
    records
        .into_iter()
        .filter(|record| record.meta().is_alive())
        .collect()
}

/// Keeps only records that fail the alive conjunction, preserving order.
pub fn filter_dead<T, I>(records: I) -> Vec<T>
where
    T: SoftDeletable,
    I: IntoIterator<Item = T>,
{
    records
        .into_iter()
        .filter(|record| record.meta().is_dead())
        .collect()
}

/// Splits records into `(alive, dead)` in one pass.
pub fn partition_liveness<T, I>(records: I) -> (Vec<T>, Vec<T>)
where
    T: SoftDeletable,
    I: IntoIterator<Item = T>,
{
    records
        .into_iter()
        .partition(|record| record.meta().is_alive())
}
