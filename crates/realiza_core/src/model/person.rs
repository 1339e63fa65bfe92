//! Customer/contact record.

use crate::model::principal::PrincipalId;
use crate::model::record::{RecordMeta, RecordValidationError, SoftDeletable};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex must compile")
});

/// A person known to the dealership (customer, seller, contact).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl Person {
    pub fn new(full_name: impl Into<String>, created_by: Option<PrincipalId>) -> Self {
        Self {
            meta: RecordMeta::new(created_by),
            full_name: full_name.into(),
            email: None,
            phone: None,
        }
    }

    /// Replaces the email with its canonical form.
    pub fn set_email(&mut self, email: Option<&str>) {
        self.email = email.and_then(normalize_email);
    }

    /// Trims text fields and canonicalizes the email. Blank optionals become
    /// `None`.
    pub fn normalize(&mut self) {
        self.full_name = self.full_name.trim().to_string();
        self.email = self.email.as_deref().and_then(normalize_email);
        self.phone = self
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|phone| !phone.is_empty())
            .map(str::to_string);
    }

    /// Validates lifecycle metadata and contact fields.
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        self.meta.validate()?;

        if self.full_name.trim().is_empty() {
            return Err(RecordValidationError::Field {
                field: "full_name",
                message: "must not be empty".to_string(),
            });
        }
        if let Some(email) = &self.email {
            if !EMAIL_RE.is_match(email) {
                return Err(RecordValidationError::Field {
                    field: "email",
                    message: format!("`{email}` is not an email address"),
                });
            }
        }
        Ok(())
    }
}

/// Trimmed, lowercased email; `None` when blank.
pub fn normalize_email(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

impl SoftDeletable for Person {
    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}
