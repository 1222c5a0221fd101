//! Client core for the to-do service.
//!
//! # Overview
//! `TodoClient` builds `HttpRequest` values and parses `HttpResponse`
//! values without touching the network. `ListState` drives it through a
//! `Transport` and keeps the front end's mirror of the server list.
//!
//! # Design
//! - `TodoClient` is stateless; it holds only `base_url`.
//! - Each CRUD operation is split into `build_*` and `parse_*`, so the I/O
//!   boundary is explicit and the parsing is testable on plain data.
//! - DTOs are defined independently from the server crate; the integration
//!   tests catch schema drift.

pub mod client;
pub mod error;
pub mod http;
pub mod sync;
pub mod transport;
pub mod types;

pub use client::TodoClient;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use sync::{ListState, Notice, Outcome};
pub use transport::{Transport, UreqTransport};
pub use types::{Category, CategoryFilter, CreateItem, Deleted, Item, ItemId, UpdateItem};
