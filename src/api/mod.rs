//! REST API layer: route handlers, DTOs, and router composition.
//!
//! All endpoints are mounted under `/api`, which is the base URL clients
//! configure as `API_BASE_URL`.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document for the REST contract.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "event-planner", description = "Event planning REST backend"),
    paths(
        handlers::event::list_events,
        handlers::event::get_event,
        handlers::event::create_event,
        handlers::event::update_event,
        handlers::event::delete_event,
        handlers::system::health_handler,
    ),
    components(schemas(
        crate::domain::Event,
        crate::domain::NewEvent,
        crate::domain::EventPatch,
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
    )),
    tags(
        (name = "Events", description = "Event CRUD"),
        (name = "System", description = "Health"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new().nest("/api", handlers::routes())
}
