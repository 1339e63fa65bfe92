//! `people` table binding for the soft-deletion layer.
//!
//! Emails are stored trimmed and lowercased; the caller's record is
//! normalized in place on insert and update.

use crate::model::person::Person;
use crate::model::record::{RecordMeta, RecordValidationError};
use crate::repo::record_repo::{RecordTable, SqliteRecordRepository};
use crate::repo::{text_or_null, RepoResult};
use rusqlite::types::Value;
use rusqlite::Row;

pub type SqlitePersonRepository<'conn> = SqliteRecordRepository<'conn, Person>;

impl RecordTable for Person {
    const TABLE: &'static str = "people";
    const FIELDS: &'static [&'static str] = &["full_name", "email", "phone"];

    fn normalize_record(&mut self) {
        self.normalize();
    }

    fn validate_record(&self) -> Result<(), RecordValidationError> {
        self.validate()
    }

    fn field_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.full_name.clone()),
            text_or_null(self.email.as_deref()),
            text_or_null(self.phone.as_deref()),
        ]
    }

    fn from_row(meta: RecordMeta, row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            meta,
            full_name: row.get("full_name")?,
            email: row.get("email")?,
            phone: row.get("phone")?,
        })
    }
}
