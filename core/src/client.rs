//! Stateless HTTP request builder and response parser for the to-do API.
//!
//! # Design
//! `TodoClient` holds only a `base_url`. Each CRUD operation is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method
//! that consumes an `HttpResponse`; the round-trip in between belongs to a
//! `Transport`.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{CreateItem, Deleted, Item, ItemId, UpdateItem};

#[derive(Debug, Clone)]
pub struct TodoClient {
    base_url: String,
}

impl TodoClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn build_list_items(&self) -> HttpRequest {
        self.request(HttpMethod::Get, format!("{}/todos", self.base_url), None)
    }

    pub fn build_get_item(&self, id: ItemId) -> HttpRequest {
        self.request(HttpMethod::Get, format!("{}/todos/{id}", self.base_url), None)
    }

    pub fn build_create_item(&self, input: &CreateItem) -> Result<HttpRequest, ApiError> {
        let body = to_json(input)?;
        Ok(self.request(HttpMethod::Post, format!("{}/todos", self.base_url), Some(body)))
    }

    pub fn build_update_item(&self, id: ItemId, input: &UpdateItem) -> Result<HttpRequest, ApiError> {
        let body = to_json(input)?;
        Ok(self.request(
            HttpMethod::Put,
            format!("{}/todos/{id}", self.base_url),
            Some(body),
        ))
    }

    pub fn build_delete_item(&self, id: ItemId) -> HttpRequest {
        self.request(HttpMethod::Delete, format!("{}/todos/{id}", self.base_url), None)
    }

    pub fn parse_list_items(&self, response: HttpResponse) -> Result<Vec<Item>, ApiError> {
        check_status(&response, 200)?;
        from_json(&response.body)
    }

    pub fn parse_get_item(&self, response: HttpResponse) -> Result<Item, ApiError> {
        check_status(&response, 200)?;
        from_json(&response.body)
    }

    pub fn parse_create_item(&self, response: HttpResponse) -> Result<Item, ApiError> {
        check_status(&response, 201)?;
        from_json(&response.body)
    }

    pub fn parse_update_item(&self, response: HttpResponse) -> Result<Item, ApiError> {
        check_status(&response, 200)?;
        from_json(&response.body)
    }

    pub fn parse_delete_item(&self, response: HttpResponse) -> Result<Deleted, ApiError> {
        check_status(&response, 200)?;
        from_json(&response.body)
    }

    fn request(&self, method: HttpMethod, url: String, body: Option<String>) -> HttpRequest {
        let headers = match body {
            Some(_) => vec![("content-type".to_string(), "application/json".to_string())],
            None => Vec::new(),
        };
        HttpRequest {
            method,
            url,
            headers,
            body,
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string(value).map_err(|e| ApiError::SerializationError(e.to_string()))
}

fn from_json<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Map non-success status codes to the appropriate `ApiError` variant,
/// preferring the server's `{error}` message over the raw body.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    let message = serde_json::from_str::<ErrorBody>(&response.body)
        .map(|b| b.error)
        .unwrap_or_else(|_| response.body.clone());
    match response.status {
        404 => Err(ApiError::NotFound),
        400 => Err(ApiError::Validation(message)),
        status => Err(ApiError::HttpError { status, message }),
    }
}
