//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `contactbook_core` linkage, config and store bootstrap.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Reads `CONTACTBOOK_DB_PATH`, `CONTACTBOOK_LOG_LEVEL` and
//! `CONTACTBOOK_LOG_DIR`.

use contactbook_core::{CoreConfig, DataService, SqliteKvStore};
use log::info;
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("contactbook_core ping={}", contactbook_core::ping());
    println!("contactbook_core version={}", contactbook_core::core_version());

    match run() {
        Ok(users) => {
            println!("users={users}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<usize, Box<dyn std::error::Error>> {
    let config = CoreConfig::from_env()?;
    config.init_logging()?;

    let conn = config.open_connection()?;
    let service = DataService::new(SqliteKvStore::new(&conn));
    let users = service.list_user_views()?.len();

    info!("event=cli_smoke module=cli status=ok users={users}");
    Ok(users)
}
