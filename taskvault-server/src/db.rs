//! Database access: the connector seam, schema bootstrap, and the todos table.

use async_trait::async_trait;
use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{AnyPool, Row};

use crate::models::TodoItem;

/// Kept low; the service holds one long-lived session.
const MAX_CONNECTIONS: u32 = 5;

/// Opens a pool for a database URL.
///
/// The seam exists so tests can dial an in-memory database regardless of what
/// the vault yields.
#[async_trait]
pub trait DbConnector: Send + Sync + 'static {
    async fn connect(&self, url: &str) -> Result<AnyPool, sqlx::Error>;
}

/// sqlx-backed connector for the URL schemes sqlx ships drivers for.
#[derive(Debug, Clone, Default)]
pub struct SqlxConnector;

#[async_trait]
impl DbConnector for SqlxConnector {
    async fn connect(&self, url: &str) -> Result<AnyPool, sqlx::Error> {
        sqlx::any::install_default_drivers();
        AnyPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(url)
            .await
    }
}

/// Create the todos table when absent. Runs after every successful connect.
pub async fn ensure_schema(pool: &AnyPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS todos (
            id INTEGER PRIMARY KEY,
            title VARCHAR(200) NOT NULL,
            completed BOOLEAN NOT NULL DEFAULT FALSE
        );
    "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn list_todos(pool: &AnyPool) -> Result<Vec<TodoItem>, sqlx::Error> {
    let rows = sqlx::query("SELECT id, title, completed FROM todos ORDER BY id")
        .fetch_all(pool)
        .await?;
    rows.iter().map(row_to_todo).collect()
}

pub async fn insert_todo(pool: &AnyPool, title: &str) -> Result<TodoItem, sqlx::Error> {
    let row = sqlx::query(
        "INSERT INTO todos (title, completed) VALUES ($1, FALSE) RETURNING id, title, completed",
    )
    .bind(title)
    .fetch_one(pool)
    .await?;
    row_to_todo(&row)
}

fn row_to_todo(row: &AnyRow) -> Result<TodoItem, sqlx::Error> {
    Ok(TodoItem {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        completed: decode_completed(row)?,
    })
}

// sqlite surfaces booleans as integers through the Any driver; postgres
// reports a real boolean.
fn decode_completed(row: &AnyRow) -> Result<bool, sqlx::Error> {
    row.try_get::<bool, _>("completed")
        .or_else(|_| row.try_get::<i64, _>("completed").map(|v| v != 0))
}
