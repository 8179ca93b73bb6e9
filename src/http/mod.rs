//! HTTP API server for the assistant's clients
//!
//! This module provides a REST API over the speech session, the
//! shopping list, and recipe generation:
//! - POST /speech/start|stop|reset, GET /speech/status
//! - GET/DELETE /list, POST /list/items, item toggle/delete,
//!   progress, suggestions
//! - GET /recipes, POST /recipes/generate
//! - GET /health - Health check
//!
//! All routes except /health require a bearer token when one is
//! configured.

mod auth;
mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
