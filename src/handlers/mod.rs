//! # API Handlers
//!
//! HTTP endpoint handlers for webhook intake, the recent-events feed, and health.

use axum::response::Html;

use crate::error::{ApiError, ErrorType};

pub mod events;
pub mod health;
pub mod webhooks;

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Root handler serving the polling page that renders `/data`
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Activity feed page", content_type = "text/html", body = String)
    ),
    tag = "root"
)]
pub async fn root() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Fallback for unknown routes
pub async fn not_found() -> ApiError {
    ErrorType::NotFound.into()
}

#[cfg(test)]
mod tests;
