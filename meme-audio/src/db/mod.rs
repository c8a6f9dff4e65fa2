// SPDX-License-Identifier: GPL-2.0-or-later
//
// Provides structures and functions for interacting with the database.
use std::str::FromStr;

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use tracing::{debug, instrument};

use crate::config::Config;

mod clip;

pub use clip::{add_clip, clips_list, get_clip, AudioClip};

static MIGRATIONS: sqlx::migrate::Migrator = sqlx::migrate!("./migrations/");

/// Open a connection pool to the configured database, creating the database if it
/// doesn't exist yet.
#[instrument(skip_all, fields(database_url = %config.database_url))]
pub async fn connect(config: &Config) -> Result<SqlitePool, crate::Error> {
    let options = SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Bring the schema up to date.
#[instrument(skip_all)]
pub async fn migrate(pool: &SqlitePool) -> Result<(), crate::Error> {
    debug!("Running database migrations");
    MIGRATIONS.run(pool).await?;
    Ok(())
}
