use std::time::Duration;

use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use crate::migration::Migrator;

pub type OrmConn = DatabaseConnection;

/// Create a SeaORM connection.
pub async fn create_orm_conn(database_url: &str) -> Result<OrmConn> {
    let mut opts = ConnectOptions::new(database_url.to_owned());
    opts.connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    // Every connection to an in-memory SQLite database opens a fresh, empty
    // database, so the pool has to stay pinned to a single connection.
    if database_url.starts_with("sqlite::memory:") {
        opts.max_connections(1).min_connections(1);
    } else {
        opts.max_connections(20);
    }

    let conn = Database::connect(opts).await?;
    Ok(conn)
}

/// Apply every pending schema migration.
pub async fn run_migrations(conn: &OrmConn) -> Result<()> {
    Migrator::up(conn, None).await?;
    Ok(())
}
