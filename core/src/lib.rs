//! Synchronous client for the Wekan kanban REST API.
//!
//! # Overview
//! `WekanClient` logs in once, keeps the bearer token, and exposes board,
//! list and card queries plus card creation. Request construction and
//! response parsing live in the I/O-free `WekanApi`; a `Transport` executes
//! the round trips (`UreqTransport` by default).
//!
//! # Design
//! - Title lookups are linear scans over freshly fetched collections and
//!   return `Option`; composite operations apply `MissPolicy` to a miss.
//! - The generic `api_call` never turns an HTTP status into an error; typed
//!   operations do, as `ApiError::Status`.
//! - `cards` walks a board lazily, so callers can stop early without paying
//!   for every card.
//!
//! ```no_run
//! use wekan_core::{ClientConfig, FormData, WekanClient};
//!
//! let client = WekanClient::connect(ClientConfig::from_env()?)?;
//! for card in client.cards("Sprint 12")? {
//!     println!("{:?}", card?.title);
//! }
//! let data = FormData::new().field("title", "Ship it").field("authorId", client.user_id());
//! client.add_card("Sprint 12", "To Do", &data)?;
//! # Ok::<(), wekan_core::ApiError>(())
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod resolve;
pub mod session;
pub mod transport;
pub mod types;

pub use client::WekanApi;
pub use config::{ClientConfig, MissPolicy};
pub use error::ApiError;
pub use http::{ApiResponse, HttpMethod, HttpRequest, HttpResponse};
pub use session::{CardStream, WekanClient};
pub use transport::{Transport, UreqTransport};
pub use types::{BoardSummary, Card, CardSummary, CreatedCard, FormData, ListSummary, Session};
