use std::time::Duration;

use anyhow::Context;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use tracing::{debug, info};

/// Columns the `users` table must carry, in declaration order. `id` is created
/// with the table and never added afterwards.
const USER_COLUMNS: &[(&str, &str)] = &[
    ("created_at", "DATETIME"),
    ("updated_at", "DATETIME"),
    ("deleted_at", "DATETIME"),
    ("name", "VARCHAR(255)"),
    ("email", "VARCHAR(100)"),
    ("password", "VARCHAR(255)"),
];

/// Open (or create) the SQLite file at `path` and reconcile the users schema.
pub async fn open(path: &str) -> anyhow::Result<SqlitePool> {
    let opts = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5));

    let db = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(opts)
        .await
        .with_context(|| format!("open database `{path}`"))?;

    ensure_schema(&db).await?;
    info!(path, "database initialized");
    Ok(db)
}

/// Single-connection in-memory pool. Every connection to `sqlite::memory:`
/// sees its own database, so the pool must never open a second one.
#[cfg(test)]
pub async fn open_in_memory() -> anyhow::Result<SqlitePool> {
    use std::str::FromStr;

    let opts = SqliteConnectOptions::from_str("sqlite::memory:")?;
    let db = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(opts)
        .await
        .context("open in-memory database")?;

    ensure_schema(&db).await?;
    Ok(db)
}

/// Create the users table if absent and add any column an older table lacks.
pub async fn ensure_schema(db: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created_at DATETIME,
            updated_at DATETIME,
            deleted_at DATETIME,
            name VARCHAR(255),
            email VARCHAR(100),
            password VARCHAR(255)
        )
        "#,
    )
    .execute(db)
    .await
    .context("create users table")?;

    let existing: Vec<String> =
        sqlx::query_scalar("SELECT name FROM pragma_table_info('users')")
            .fetch_all(db)
            .await
            .context("inspect users table")?;

    for (column, ty) in USER_COLUMNS {
        if existing.iter().any(|c| c.eq_ignore_ascii_case(column)) {
            continue;
        }
        debug!(column, "adding missing users column");
        sqlx::query(&format!("ALTER TABLE users ADD COLUMN {column} {ty}"))
            .execute(db)
            .await
            .with_context(|| format!("add column users.{column}"))?;
    }

    // Uniqueness only applies to live rows so a soft-deleted email can be reused.
    // Older databases carry a full unique index under the same name; replace it.
    let index_sql: Option<Option<String>> = sqlx::query_scalar(
        "SELECT sql FROM sqlite_master WHERE type = 'index' AND name = 'uix_users_email'",
    )
    .fetch_optional(db)
    .await
    .context("inspect uix_users_email")?;
    if let Some(sql) = index_sql {
        let partial = sql
            .map(|s| s.to_ascii_uppercase().contains("WHERE"))
            .unwrap_or(false);
        if !partial {
            debug!("replacing full uix_users_email with partial index");
            sqlx::query("DROP INDEX uix_users_email")
                .execute(db)
                .await
                .context("drop legacy uix_users_email")?;
        }
    }

    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS uix_users_email ON users(email) WHERE deleted_at IS NULL",
    )
    .execute(db)
    .await
    .context("create uix_users_email")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_deleted_at ON users(deleted_at)")
        .execute(db)
        .await
        .context("create idx_users_deleted_at")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn columns(db: &SqlitePool) -> Vec<String> {
        sqlx::query_scalar("SELECT name FROM pragma_table_info('users')")
            .fetch_all(db)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn creates_users_table() {
        let db = open_in_memory().await.unwrap();
        let cols = columns(&db).await;
        for expected in ["id", "created_at", "updated_at", "deleted_at", "name", "email", "password"] {
            assert!(cols.iter().any(|c| c == expected), "missing column {expected}");
        }
    }

    #[tokio::test]
    async fn ensure_schema_is_idempotent() {
        let db = open_in_memory().await.unwrap();
        ensure_schema(&db).await.unwrap();
        ensure_schema(&db).await.unwrap();
        assert_eq!(columns(&db).await.len(), 7);
    }

    #[tokio::test]
    async fn adds_columns_missing_from_outdated_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.db");
        let path = path.to_str().unwrap();

        {
            let opts = SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true);
            let old = SqlitePoolOptions::new()
                .max_connections(1)
                .connect_with(opts)
                .await
                .unwrap();
            sqlx::query("CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT, email TEXT)")
                .execute(&old)
                .await
                .unwrap();
            sqlx::query("INSERT INTO users (name, email) VALUES ('Old', 'old@x.com')")
                .execute(&old)
                .await
                .unwrap();
            old.close().await;
        }

        let db = open(path).await.unwrap();
        let cols = columns(&db).await;
        assert!(cols.iter().any(|c| c == "password"));
        assert!(cols.iter().any(|c| c == "deleted_at"));

        let name: String = sqlx::query_scalar("SELECT name FROM users WHERE email = 'old@x.com'")
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(name, "Old");
    }

    #[tokio::test]
    async fn replaces_full_email_index_with_partial_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.db");
        let path = path.to_str().unwrap();

        {
            let opts = SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true);
            let old = SqlitePoolOptions::new()
                .max_connections(1)
                .connect_with(opts)
                .await
                .unwrap();
            sqlx::query(
                "CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, created_at DATETIME, \
                 updated_at DATETIME, deleted_at DATETIME, name VARCHAR(255), \
                 email VARCHAR(100), password VARCHAR(255))",
            )
            .execute(&old)
            .await
            .unwrap();
            sqlx::query("CREATE UNIQUE INDEX uix_users_email ON users(email)")
                .execute(&old)
                .await
                .unwrap();
            old.close().await;
        }

        let db = open(path).await.unwrap();
        let sql: String = sqlx::query_scalar(
            "SELECT sql FROM sqlite_master WHERE type = 'index' AND name = 'uix_users_email'",
        )
        .fetch_one(&db)
        .await
        .unwrap();
        assert!(sql.contains("WHERE deleted_at IS NULL"));

        sqlx::query("INSERT INTO users (name, email, password, deleted_at) VALUES ('Gone', 'a@x.com', 'p', '2024-01-01 00:00:00')")
            .execute(&db)
            .await
            .unwrap();
        sqlx::query("INSERT INTO users (name, email, password) VALUES ('Live', 'a@x.com', 'p')")
            .execute(&db)
            .await
            .unwrap();

        // Reopening leaves the partial index alone.
        db.close().await;
        let db = open(path).await.unwrap();
        let live: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE deleted_at IS NULL")
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(live, 1);
    }

    #[tokio::test]
    async fn open_fails_for_unreachable_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("users.db");
        assert!(open(path.to_str().unwrap()).await.is_err());
    }
}
