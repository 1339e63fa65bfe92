//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep admin/CLI layers decoupled from storage details.

pub mod vehicle_service;
