//! CLI smoke entry point.
//!
//! # Responsibility
//! - Resolve configuration, start logging and open the configured database.
//! - Print deterministic alive/all counts for a quick storage sanity check.

use log::error;
use realiza_core::db::open_db;
use realiza_core::{
    init_logging_from_config, AppConfig, Person, SqlitePersonRepository,
    SqliteVehicleRepository, Vehicle,
};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_run module=cli status=error error={err}");
            eprintln!("realiza_cli: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::from_env()?;
    init_logging_from_config(&config)?;

    println!("realiza_core ping={}", realiza_core::ping());
    println!("realiza_core version={}", realiza_core::core_version());
    println!("database={}", config.database_path.display());

    let conn = open_db(&config.database_path)?;
    let vehicles = SqliteVehicleRepository::try_new(&conn)?;
    let people = SqlitePersonRepository::try_new(&conn)?;

    print_counts::<Vehicle>(
        vehicles.objects().count()?,
        vehicles.all_objects().count()?,
    );
    print_counts::<Person>(people.objects().count()?, people.all_objects().count()?);

    Ok(())
}

fn print_counts<M: realiza_core::RecordTable>(alive: u64, all: u64) {
    println!("{} alive={alive} all={all}", M::TABLE);
}
