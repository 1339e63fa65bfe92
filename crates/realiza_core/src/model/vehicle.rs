//! Vehicle stock record.
//!
//! # Invariants
//! - `plate` is stored uppercase without separators.
//! - `plate` matches either the legacy (`ABC1234`) or Mercosul (`ABC1D23`)
//!   layout.
//! - `model_year`, when set, lies in `1900..=2100`.

use crate::model::principal::PrincipalId;
use crate::model::record::{RecordId, RecordMeta, RecordValidationError, SoftDeletable};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static PLATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z]{3}[0-9][A-Z0-9][0-9]{2}$").expect("plate regex must compile")
});

const MIN_MODEL_YEAR: u16 = 1900;
const MAX_MODEL_YEAR: u16 = 2100;

/// A vehicle held or listed by the dealership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub plate: String,
    pub brand: String,
    pub model: String,
    pub model_year: Option<u16>,
}

impl Vehicle {
    /// Creates an alive vehicle with a generated ID and normalized plate.
    pub fn new(
        plate: &str,
        brand: impl Into<String>,
        model: impl Into<String>,
        created_by: Option<PrincipalId>,
    ) -> Self {
        Self {
            meta: RecordMeta::new(created_by),
            plate: normalize_plate(plate),
            brand: brand.into(),
            model: model.into(),
            model_year: None,
        }
    }

    /// Creates a vehicle for a caller-provided ID.
    pub fn with_id(
        uuid: RecordId,
        plate: &str,
        brand: impl Into<String>,
        model: impl Into<String>,
        created_by: Option<PrincipalId>,
    ) -> Result<Self, RecordValidationError> {
        Ok(Self {
            meta: RecordMeta::with_id(uuid, created_by)?,
            plate: normalize_plate(plate),
            brand: brand.into(),
            model: model.into(),
            model_year: None,
        })
    }

    /// Validates lifecycle metadata and vehicle fields.
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        self.meta.validate()?;

        if !PLATE_RE.is_match(&self.plate) {
            return Err(RecordValidationError::Field {
                field: "plate",
                message: format!("`{}` is not a recognised plate", self.plate),
            });
        }
        if self.brand.trim().is_empty() {
            return Err(RecordValidationError::Field {
                field: "brand",
                message: "must not be empty".to_string(),
            });
        }
        if self.model.trim().is_empty() {
            return Err(RecordValidationError::Field {
                field: "model",
                message: "must not be empty".to_string(),
            });
        }
        if let Some(year) = self.model_year {
            if !(MIN_MODEL_YEAR..=MAX_MODEL_YEAR).contains(&year) {
                return Err(RecordValidationError::Field {
                    field: "model_year",
                    message: format!("{year} outside {MIN_MODEL_YEAR}..={MAX_MODEL_YEAR}"),
                });
            }
        }
        Ok(())
    }
}

impl SoftDeletable for Vehicle {
    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

/// Uppercases and strips separators (`abc-1d23` -> `ABC1D23`).
pub fn normalize_plate(raw: &str) -> String {
    raw.chars()
        .filter(|ch| ch.is_ascii_alphanumeric())
        .map(|ch| ch.to_ascii_uppercase())
        .collect()
}
