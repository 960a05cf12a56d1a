use crate::db::now_utc_seconds;
use crate::domain::model::{CustomerRecord, ValidRecord, TIMESTAMP_FORMAT};
use crate::domain::ports::{CustomerStore, ImportSession, InsertError};
use crate::utils::error::{ImportError, Result};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

const CREATE_CUSTOMERS: &str = r#"
    CREATE TABLE IF NOT EXISTS customers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        age INTEGER NOT NULL,
        created_at TEXT NOT NULL
    )
"#;

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if needed) the database file and its parent directory.
    pub async fn connect(database_path: &str, max_connections: u32) -> Result<Self> {
        if let Some(parent) = Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        info!("Opening customer database at {}", database_path);
        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.create_tables().await?;
        Ok(store)
    }

    /// Private in-memory database. A single connection keeps every query on the same database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.create_tables().await?;
        Ok(store)
    }

    async fn create_tables(&self) -> Result<()> {
        sqlx::query(CREATE_CUSTOMERS).execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

struct SqliteSession {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl CustomerStore for SqliteStore {
    async fn begin(&self) -> Result<Box<dyn ImportSession>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(SqliteSession { tx }))
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<CustomerRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(
            "SELECT id, name, email, age, created_at FROM customers ORDER BY id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(customer_from_row).collect()
    }

    async fn list_all(&self) -> Result<Vec<CustomerRecord>> {
        let rows = sqlx::query("SELECT id, name, email, age, created_at FROM customers ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(customer_from_row).collect()
    }
}

#[async_trait]
impl ImportSession for SqliteSession {
    async fn insert(&mut self, record: &ValidRecord) -> std::result::Result<CustomerRecord, InsertError> {
        let created_at = now_utc_seconds();

        let result = sqlx::query(
            "INSERT INTO customers (name, email, age, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&record.name)
        .bind(&record.email)
        .bind(i64::from(record.age))
        .bind(created_at.format(TIMESTAMP_FORMAT).to_string())
        .execute(&mut *self.tx)
        .await;

        match result {
            Ok(done) => Ok(CustomerRecord {
                id: done.last_insert_rowid(),
                name: record.name.clone(),
                email: record.email.clone(),
                age: record.age,
                created_at,
            }),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(InsertError::Conflict {
                    email: record.email.clone(),
                })
            }
            Err(e) => Err(InsertError::Fault(ImportError::StoreFault(e))),
        }
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

fn customer_from_row(row: &SqliteRow) -> Result<CustomerRecord> {
    let age: i64 = row.try_get("age")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(CustomerRecord {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        age: u8::try_from(age).map_err(|_| ImportError::StoreUnavailable {
            message: format!("stored age out of range: {}", age),
        })?,
        created_at: NaiveDateTime::parse_from_str(&created_at, TIMESTAMP_FORMAT)
            .map_err(|e| ImportError::StoreUnavailable {
                message: format!("stored created_at '{}' is malformed: {}", created_at, e),
            })?
            .and_utc(),
    })
}
