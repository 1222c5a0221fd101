//! REST service for the to-do list.
//!
//! # Design
//! One resource, `/todos`, with a handler per store operation. Request
//! bodies are validated here before they reach the store: missing fields and
//! malformed JSON are reported as `400` with an `{error}` body rather than
//! axum's default `422`. Path ids that do not parse as an id cannot name any
//! item and are reported as `404`.

pub mod config;
pub mod store;

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub use config::{Config, ConfigError};
pub use store::{Item, ItemPatch, Store, StoreError};

/// Request payload for creating an item.
///
/// Fields are optional so that a missing field is a validation failure
/// with a readable message instead of a deserialization rejection.
#[derive(Debug, Default, Deserialize)]
pub struct CreateItem {
    pub text: Option<String>,
    pub category: Option<String>,
    /// Also accepted as the legacy `disabled`. A body carrying both keys is
    /// a duplicate field and is rejected with 400.
    #[serde(alias = "disabled")]
    pub completed: Option<bool>,
}

impl CreateItem {
    /// Presence check on `text` and `category`.
    pub fn validate(self) -> Result<(String, String, bool), StoreError> {
        let text = self
            .text
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| StoreError::Validation("text is required".to_string()))?;
        let category = self
            .category
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| StoreError::Validation("category is required".to_string()))?;
        Ok((text, category, self.completed.unwrap_or(false)))
    }
}

/// Request payload for a partial update.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateItem {
    pub text: Option<String>,
    pub category: Option<String>,
    /// Same aliasing as [`CreateItem::completed`].
    #[serde(alias = "disabled")]
    pub completed: Option<bool>,
}

impl UpdateItem {
    pub fn validate(self) -> Result<ItemPatch, StoreError> {
        for (field, value) in [("text", &self.text), ("category", &self.category)] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(StoreError::Validation(format!("{field} must not be empty")));
            }
        }
        Ok(ItemPatch {
            text: self.text,
            category: self.category,
            completed: self.completed,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = match &self {
            StoreError::Validation(_) => StatusCode::BAD_REQUEST,
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(%status, error = %self, "request rejected");
        }
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

pub type SharedStore = Arc<Store>;

/// Router over a fresh in-memory store.
pub fn app() -> Router {
    router(Arc::new(Store::in_memory()))
}

pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route("/todos", get(list_items).post(create_item))
        .route(
            "/todos/{id}",
            get(get_item).put(update_item).delete(delete_item),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(store)
}

pub async fn serve(listener: TcpListener, store: Store) -> Result<(), std::io::Error> {
    axum::serve(listener, router(Arc::new(store))).await
}

/// Serve a fresh in-memory store.
pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, Store::in_memory()).await
}

fn parse_id(raw: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(raw).map_err(|_| StoreError::NotFound(raw.to_string()))
}

fn bad_body(rejection: JsonRejection) -> StoreError {
    StoreError::Validation(rejection.body_text())
}

async fn list_items(State(store): State<SharedStore>) -> Json<Vec<Item>> {
    Json(store.get_all().await)
}

async fn create_item(
    State(store): State<SharedStore>,
    payload: Result<Json<CreateItem>, JsonRejection>,
) -> Result<(StatusCode, Json<Item>), StoreError> {
    let Json(input) = payload.map_err(bad_body)?;
    let (text, category, completed) = input.validate()?;
    let item = store.insert(text, category, completed).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn get_item(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<Json<Item>, StoreError> {
    let id = parse_id(&id)?;
    store.get(id).await.map(Json)
}

async fn update_item(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateItem>, JsonRejection>,
) -> Result<Json<Item>, StoreError> {
    let id = parse_id(&id)?;
    let Json(input) = payload.map_err(bad_body)?;
    let item = store.update(id, input.validate()?).await?;
    Ok(Json(item))
}

async fn delete_item(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<Json<MessageBody>, StoreError> {
    let id = parse_id(&id)?;
    store.delete(id).await?;
    Ok(Json(MessageBody {
        message: "Todo deleted.".to_string(),
    }))
}
