//! Core data access for the Realiza dealership back office.
//! This crate owns the soft-deletion rules every record table follows.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{AppConfig, ConfigError};
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, log_level_for_debug, logging_status,
    LoggingError,
};
pub use model::person::Person;
pub use model::principal::{Principal, PrincipalId};
pub use model::record::{
    filter_alive, filter_dead, partition_liveness, RecordId, RecordMeta, RecordValidationError,
    SoftDeletable,
};
pub use model::setting::Setting;
pub use model::vehicle::Vehicle;
pub use repo::person_repo::SqlitePersonRepository;
pub use repo::principal_repo::{PrincipalRepository, SqlitePrincipalRepository};
pub use repo::record_repo::{
    RecordQuery, RecordRepository, RecordTable, Scope, SqliteRecordRepository,
};
pub use repo::setting_repo::{SettingRepository, SqliteSettingRepository};
pub use repo::vehicle_repo::SqliteVehicleRepository;
pub use repo::{RepoError, RepoResult};
pub use service::vehicle_service::{RegisterVehicleRequest, VehicleService};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
