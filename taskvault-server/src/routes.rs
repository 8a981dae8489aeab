//! HTTP surface: root status, the todos table, and the vault diagnostic probe.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use sqlx::AnyPool;
use taskvault_core::keyvault::SecretSource;

use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::{KeyVaultProbe, RootStatus, TodoCreate, TodoItem};
use crate::session::SessionManager;

const ROOT_MESSAGE: &str = "Hello World! Backend dziala i jest gotowy na test Key Vaulta.";
const SECRET_PREVIEW_LEN: usize = 30;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<SessionManager>,
    pub secrets: Arc<dyn SecretSource>,
    pub secret_name: String,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/todos", get(list_todos).post(create_todo))
        .route("/test-kv", get(test_key_vault))
        .with_state(state)
}

/// `GET /` - reports the connection flag without side effects.
async fn root(State(state): State<AppState>) -> Json<RootStatus> {
    Json(RootStatus {
        message: ROOT_MESSAGE,
        database_connected: state.session.is_connected().await,
    })
}

/// `GET /todos`
async fn list_todos(State(state): State<AppState>) -> ApiResult<Json<Vec<TodoItem>>> {
    let pool = require_session(&state).await?;
    let todos = db::list_todos(&pool)
        .await
        .map_err(|err| ApiError::Database(err.to_string()))?;
    Ok(Json(todos))
}

/// `POST /todos`
async fn create_todo(
    State(state): State<AppState>,
    Json(body): Json<TodoCreate>,
) -> ApiResult<Json<TodoItem>> {
    let pool = require_session(&state).await?;
    let todo = db::insert_todo(&pool, &body.title)
        .await
        .map_err(|err| ApiError::Write(err.to_string()))?;
    Ok(Json(todo))
}

/// Connect-if-needed gate shared by the todo handlers.
async fn require_session(state: &AppState) -> Result<AnyPool, ApiError> {
    if !state.session.ensure_connected().await {
        let reason = state
            .session
            .last_error()
            .await
            .unwrap_or_else(|| "nieznany błąd połączenia".to_string());
        return Err(ApiError::Database(reason));
    }
    state
        .session
        .pool()
        .await
        .ok_or_else(|| ApiError::Database("brak aktywnej sesji".to_string()))
}

/// `GET /test-kv` - diagnostic probe; always 200, never echoes the full secret.
async fn test_key_vault(State(state): State<AppState>) -> Json<KeyVaultProbe> {
    match state.secrets.get_secret(&state.secret_name).await {
        Ok(value) => {
            let preview: String = value.chars().take(SECRET_PREVIEW_LEN).collect();
            Json(KeyVaultProbe {
                status: "SUCCESS ✅",
                message: "Połączono z Key Vault i pobrano sekret!",
                secret_preview: Some(format!("{preview}...")),
                error_details: None,
            })
        }
        Err(err) => Json(KeyVaultProbe {
            status: "ERROR ❌",
            message: "Nie udało się pobrać sekretu.",
            secret_preview: None,
            error_details: Some(err.to_string()),
        }),
    }
}
