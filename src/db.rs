use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use tracing::debug;

use crate::error::AppResult;

// Database-wide settings only. sqlx already enables foreign keys on every pooled connection.
const PRAGMAS: &[&str] = &["PRAGMA journal_mode=WAL", "PRAGMA synchronous=NORMAL"];

pub async fn connect(database_url: &str) -> AppResult<DatabaseConnection> {
    let db = Database::connect(database_url).await?;

    for pragma in PRAGMAS {
        db.execute(Statement::from_string(db.get_database_backend(), pragma.to_string())).await?;
    }

    debug!(url = %database_url, "database connected");
    Ok(db)
}

/// Rolls back every applied migration, child tables first, then reapplies them all.
pub async fn rebuild_schema(db: &DatabaseConnection) -> AppResult<()> {
    Migrator::reset(db).await?;
    Migrator::up(db, None).await?;
    debug!("schema rebuilt");
    Ok(())
}

/// Applies pending migrations without touching existing rows.
pub async fn migrate(db: &DatabaseConnection) -> AppResult<()> {
    Migrator::up(db, None).await?;
    Ok(())
}

pub async fn close(db: DatabaseConnection) -> AppResult<()> {
    db.close().await?;
    debug!("database closed");
    Ok(())
}
