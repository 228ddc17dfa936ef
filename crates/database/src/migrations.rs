//! Database migrations for the tracked business tables

use crate::DbPool;
use billstage_core::AppError;

/// Current database schema version
pub const CURRENT_VERSION: i64 = 1;

const CREATE_CUSTOMER: &str = r#"
CREATE TABLE IF NOT EXISTS customer (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    company TEXT,
    phone TEXT NOT NULL UNIQUE,
    email TEXT,
    gst TEXT,
    address TEXT,
    businessType TEXT,
    createdAt TEXT NOT NULL
)
"#;

const CREATE_ITEM: &str = r#"
CREATE TABLE IF NOT EXISTS item (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    hsn TEXT,
    unitPrice REAL NOT NULL,
    quantity REAL NOT NULL DEFAULT 1,
    taxPercentage REAL
)
"#;

const CREATE_INVOICE: &str = r#"
CREATE TABLE IF NOT EXISTS invoice (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    invoiceId TEXT NOT NULL UNIQUE,
    customerId INTEGER NOT NULL REFERENCES customer(id),
    createdAt TEXT NOT NULL,
    pdfPath TEXT NOT NULL,
    totalAmount REAL NOT NULL
)
"#;

const CREATE_INVOICE_ITEM: &str = r#"
CREATE TABLE IF NOT EXISTS invoice_item (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    invoiceId INTEGER NOT NULL REFERENCES invoice(id),
    itemId INTEGER NOT NULL REFERENCES item(id),
    quantity INTEGER NOT NULL DEFAULT 1,
    rate REAL NOT NULL,
    discount REAL NOT NULL DEFAULT 0.0,
    taxPercentage REAL NOT NULL DEFAULT 0.0,
    line_total REAL NOT NULL
)
"#;

/// Returns the current migration version
pub fn current_version() -> i64 {
    CURRENT_VERSION
}

/// Runs all pending migrations
pub async fn run_migrations(pool: &DbPool) -> Result<(), AppError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now') * 1000)
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| AppError::database("Failed to create migrations table", e))?;

    run_migration(
        pool,
        1,
        &[
            CREATE_CUSTOMER,
            CREATE_ITEM,
            CREATE_INVOICE,
            CREATE_INVOICE_ITEM,
        ],
    )
    .await?;

    Ok(())
}

/// Runs a single migration if not already applied
async fn run_migration(pool: &DbPool, version: i64, statements: &[&str]) -> Result<(), AppError> {
    let applied: Option<i64> =
        sqlx::query_scalar("SELECT version FROM schema_migrations WHERE version = ?")
            .bind(version)
            .fetch_optional(pool)
            .await
            .map_err(|e| AppError::database("Failed to check migration status", e))?;

    if applied.is_some() {
        return Ok(());
    }

    for sql in statements {
        sqlx::query(sql)
            .execute(pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to run migration {}", version), e))?;
    }

    sqlx::query("INSERT INTO schema_migrations (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await
        .map_err(|e| AppError::database("Failed to record migration", e))?;

    Ok(())
}

/// Verifies database integrity
pub async fn verify_integrity(pool: &DbPool) -> Result<(), AppError> {
    let result: String = sqlx::query_scalar("PRAGMA integrity_check")
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::database("Failed to check integrity", e))?;

    if result != "ok" {
        return Err(AppError::database(
            format!("Database integrity check failed: {}", result),
            std::io::Error::new(std::io::ErrorKind::InvalidData, "Integrity check failed"),
        ));
    }

    Ok(())
}
