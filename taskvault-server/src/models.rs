use serde::{Deserialize, Serialize};

/// Stored todo row. `id` is assigned by the database on insert.
#[derive(Debug, Clone, Serialize)]
pub struct TodoItem {
    pub id: i64,
    pub title: String,
    pub completed: bool,
}

/// Body of `POST /todos`.
#[derive(Debug, Deserialize)]
pub struct TodoCreate {
    pub title: String,
}

/// `GET /` payload.
#[derive(Debug, Serialize)]
pub struct RootStatus {
    pub message: &'static str,
    pub database_connected: bool,
}

/// `GET /test-kv` payload.
#[derive(Debug, Serialize)]
pub struct KeyVaultProbe {
    pub status: &'static str,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_preview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
}
