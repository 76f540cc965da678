mod models;
mod seeders;

pub use models::*;
pub use seeders::seed_course_catalog;

use anyhow::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

pub type DbPool = SqlitePool;

/// Execute a SQL migration file, properly handling comments
async fn execute_sql(pool: &SqlitePool, sql: &str) -> Result<()> {
    for statement in sql.split(';') {
        // Strip SQL comment lines (lines starting with --)
        let cleaned: String = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n");
        let trimmed = cleaned.trim();
        if !trimmed.is_empty() {
            sqlx::query(trimmed).execute(pool).await?;
        }
    }
    Ok(())
}

pub async fn init(data_dir: &Path) -> Result<DbPool> {
    let db_path = data_dir.join("uniplan.db");
    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    info!("Initializing database at {}", db_path.display());

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    // Enable WAL mode for better concurrency
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;

    info!("Database initialized successfully");
    Ok(pool)
}

async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Running database migrations...");

    // Migration 001: Initial schema
    execute_sql(pool, include_str!("../../migrations/001_initial.sql")).await?;

    // Seed/update the built-in course catalog (runs on every startup to pick
    // up new catalog entries)
    seeders::seed_course_catalog(pool).await?;

    info!("Migrations completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_creates_schema_and_seeds_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let pool = init(dir.path()).await.unwrap();

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        let names: Vec<&str> = tables.iter().map(|t| t.0.as_str()).collect();
        for expected in [
            "users",
            "sessions",
            "verification_codes",
            "courses",
            "enrollments",
            "semesters",
            "semester_courses",
            "activities",
            "activity_types",
            "templates",
        ] {
            assert!(names.contains(&expected), "missing table {expected}");
        }

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM courses")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert!(count.0 > 0, "catalog should be seeded");
    }

    #[tokio::test]
    async fn test_init_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let pool = init(dir.path()).await.unwrap();
        let first: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM courses")
            .fetch_one(&pool)
            .await
            .unwrap();
        drop(pool);

        let pool = init(dir.path()).await.unwrap();
        let second: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM courses")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(first.0, second.0);
    }
}
