//! Domain model for dealership back-office records.
//!
//! # Responsibility
//! - Define canonical data structures used by repositories and services.
//! - Own the alive/dead classification shared by every soft-deletable record.
//!
//! # Invariants
//! - Every soft-deletable record embeds `RecordMeta` and is identified by a
//!   stable `RecordId`.
//! - Deletion is a soft-delete tombstone unless a caller explicitly hard
//!   deletes through the repository.

pub mod person;
pub mod principal;
pub mod record;
pub mod setting;
pub mod vehicle;
