//! `vehicles` table binding for the soft-deletion layer.

use crate::model::record::{RecordMeta, RecordValidationError};
use crate::model::vehicle::{normalize_plate, Vehicle};
use crate::repo::record_repo::{RecordTable, SqliteRecordRepository};
use crate::repo::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::Row;

/// SQLite repository over `vehicles`.
pub type SqliteVehicleRepository<'conn> = SqliteRecordRepository<'conn, Vehicle>;

impl RecordTable for Vehicle {
    const TABLE: &'static str = "vehicles";
    const FIELDS: &'static [&'static str] = &["plate", "brand", "model", "model_year"];

    fn normalize_record(&mut self) {
        self.plate = normalize_plate(&self.plate);
    }

    fn validate_record(&self) -> Result<(), RecordValidationError> {
        self.validate()
    }

    fn field_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.plate.clone()),
            Value::Text(self.brand.clone()),
            Value::Text(self.model.clone()),
            self.model_year
                .map_or(Value::Null, |year| Value::Integer(i64::from(year))),
        ]
    }

    fn from_row(meta: RecordMeta, row: &Row<'_>) -> RepoResult<Self> {
        let model_year = match row.get::<_, Option<i64>>("model_year")? {
            Some(year) => Some(u16::try_from(year).map_err(|_| {
                RepoError::InvalidData(format!(
                    "invalid model_year value `{year}` in vehicles.model_year"
                ))
            })?),
            None => None,
        };

        Ok(Self {
            meta,
            plate: row.get("plate")?,
            brand: row.get("brand")?,
            model: row.get("model")?,
            model_year,
        })
    }
}
