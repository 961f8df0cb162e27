use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::fs;
use std::path::Path;

use crate::store::StoreError;

pub type DbPool = SqlitePool;

/// Initialize the database connection pool and run migrations. The shell
/// supplies the platform data directory; the file lands at
/// `<data_dir>/swim-tribe.db`.
pub async fn initialize_db(data_dir: &Path) -> Result<DbPool, StoreError> {
  fs::create_dir_all(data_dir)?;
  let db_path = data_dir.join("swim-tribe.db");
  let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

  tracing::info!(path = %db_path.display(), "initializing database");

  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect(&db_url)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  Ok(pool)
}
