//! Event CRUD handlers: list, get, create, update, delete.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::DataEnvelope;
use crate::app_state::AppState;
use crate::domain::{Event, EventId, EventPatch, NewEvent};
use crate::error::{ErrorResponse, PlannerError};

/// `GET /events` — List the caller's events.
///
/// # Errors
///
/// Returns [`PlannerError`] if the store fails.
#[utoipa::path(
    get,
    path = "/api/events",
    tag = "Events",
    summary = "List events",
    description = "Returns the caller's events, newest first.",
    params(
        ("x-user-id" = Option<String>, Header, description = "Caller identity"),
    ),
    responses(
        (status = 200, description = "Event list", body = DataEnvelope<Vec<Event>>),
        (status = 500, description = "Store failure", body = ErrorResponse),
    )
)]
pub async fn list_events(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, PlannerError> {
    let ctx = state.context(&headers);
    let events = state.events.list(&ctx).await?;
    Ok(Json(DataEnvelope::new(events)))
}

/// `GET /events/{id}` — Get one event.
///
/// # Errors
///
/// Returns [`PlannerError::EventNotFound`] if the event does not exist.
#[utoipa::path(
    get,
    path = "/api/events/{id}",
    tag = "Events",
    summary = "Get event",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
        ("x-user-id" = Option<String>, Header, description = "Caller identity"),
    ),
    responses(
        (status = 200, description = "Event", body = DataEnvelope<Event>),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn get_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<EventId>,
) -> Result<impl IntoResponse, PlannerError> {
    let ctx = state.context(&headers);
    let event = state
        .events
        .get(&ctx, id)
        .await?
        .ok_or(PlannerError::EventNotFound(id))?;
    Ok(Json(DataEnvelope::new(event)))
}

/// `POST /events` — Create an event owned by the caller.
///
/// # Errors
///
/// Returns [`PlannerError::Unauthenticated`] without an identity header,
/// or [`PlannerError::InvalidRequest`] on invalid input.
#[utoipa::path(
    post,
    path = "/api/events",
    tag = "Events",
    summary = "Create event",
    description = "Creates an event owned by the caller. Input fields are camelCase.",
    request_body = NewEvent,
    params(
        ("x-user-id" = String, Header, description = "Caller identity"),
    ),
    responses(
        (status = 201, description = "Event created", body = DataEnvelope<Event>),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "No caller identity", body = ErrorResponse),
    )
)]
pub async fn create_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(new): Json<NewEvent>,
) -> Result<impl IntoResponse, PlannerError> {
    let ctx = state.context(&headers);
    let event = state.events.create(&ctx, &new).await?;
    tracing::info!(id = %event.id, "event created");
    Ok((StatusCode::CREATED, Json(DataEnvelope::new(event))))
}

/// `PUT /events/{id}` — Partially update an event.
///
/// # Errors
///
/// Returns [`PlannerError::EventNotFound`] if the event does not exist,
/// or [`PlannerError::InvalidRequest`] on an invalid patch.
#[utoipa::path(
    put,
    path = "/api/events/{id}",
    tag = "Events",
    summary = "Update event",
    description = "Overwrites the fields present in the body; other fields are kept.",
    request_body = EventPatch,
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
        ("x-user-id" = Option<String>, Header, description = "Caller identity"),
    ),
    responses(
        (status = 200, description = "Updated event", body = DataEnvelope<Event>),
        (status = 400, description = "Invalid patch", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn update_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<EventId>,
    Json(patch): Json<EventPatch>,
) -> Result<impl IntoResponse, PlannerError> {
    let ctx = state.context(&headers);
    let event = state.events.update(&ctx, id, &patch).await?;
    Ok(Json(DataEnvelope::new(event)))
}

/// `DELETE /events/{id}` — Delete an event and its generated content.
///
/// # Errors
///
/// Returns [`PlannerError::EventNotFound`] if the event does not exist.
#[utoipa::path(
    delete,
    path = "/api/events/{id}",
    tag = "Events",
    summary = "Delete event",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
        ("x-user-id" = Option<String>, Header, description = "Caller identity"),
    ),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn delete_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<EventId>,
) -> Result<impl IntoResponse, PlannerError> {
    let ctx = state.context(&headers);
    if !state.events.delete(&ctx, id).await? {
        return Err(PlannerError::EventNotFound(id));
    }
    tracing::info!(%id, "event deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Event routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route(
            "/events/{id}",
            get(get_event).put(update_event).delete(delete_event),
        )
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::provider::EventMirror;
    use crate::provider::rest::USER_ID_HEADER;
    use crate::storage::MemoryStore;

    fn app() -> Router {
        let mirror = EventMirror::new(Arc::new(MemoryStore::new()));
        Router::new()
            .merge(routes())
            .with_state(AppState::new(Arc::new(mirror)))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let Ok(response) = app.clone().oneshot(request).await else {
            panic!("request failed");
        };
        let status = response.status();
        let Ok(bytes) = to_bytes(response.into_body(), usize::MAX).await else {
            panic!("body read failed");
        };
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    fn create_request(body: &str, user: Option<&str>) -> Request<Body> {
        let mut builder = Request::post("/events").header("content-type", "application/json");
        if let Some(user) = user {
            builder = builder.header(USER_ID_HEADER, user);
        }
        let Ok(request) = builder.body(Body::from(body.to_string())) else {
            panic!("request build failed");
        };
        request
    }

    fn empty(method: &str, uri: &str, user: &str) -> Request<Body> {
        let Ok(request) = Request::builder()
            .method(method)
            .uri(uri)
            .header(USER_ID_HEADER, user)
            .body(Body::empty())
        else {
            panic!("request build failed");
        };
        request
    }

    #[tokio::test]
    async fn create_requires_identity_header() {
        let app = app();
        let (status, body) = send(&app, create_request(r#"{"eventName":"Launch"}"#, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], 1002);
    }

    #[tokio::test]
    async fn create_get_update_delete() {
        let app = app();
        let (status, body) = send(
            &app,
            create_request(
                r#"{"eventName":"Launch","eventType":"conference","audienceSize":50}"#,
                Some("u1"),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["user_id"], "u1");
        assert_eq!(body["data"]["audience_size"], 50);
        let Some(id) = body["data"]["id"].as_str().map(str::to_string) else {
            panic!("missing id");
        };

        let (status, body) = send(&app, empty("GET", "/events", "u1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

        let Ok(put) = Request::put(format!("/events/{id}"))
            .header("content-type", "application/json")
            .header(USER_ID_HEADER, "u1")
            .body(Body::from(r#"{"city":"Oslo"}"#))
        else {
            panic!("request build failed");
        };
        let (status, body) = send(&app, put).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["city"], "Oslo");
        assert_eq!(body["data"]["event_name"], "Launch");

        let (status, _) = send(&app, empty("DELETE", &format!("/events/{id}"), "u1")).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(&app, empty("GET", &format!("/events/{id}"), "u1")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], 2001);

        let (status, _) = send(&app, empty("DELETE", &format!("/events/{id}"), "u1")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn events_are_scoped_to_the_caller() {
        let app = app();
        let (status, body) =
            send(&app, create_request(r#"{"eventName":"Private"}"#, Some("u1"))).await;
        assert_eq!(status, StatusCode::CREATED);
        let Some(id) = body["data"]["id"].as_str().map(str::to_string) else {
            panic!("missing id");
        };

        let (status, body) = send(&app, empty("GET", "/events", "u2")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().map(Vec::len), Some(0));

        let (status, _) = send(&app, empty("GET", &format!("/events/{id}"), "u2")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, empty("DELETE", &format!("/events/{id}"), "u2")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let Ok(anonymous) = Request::delete(format!("/events/{id}")).body(Body::empty()) else {
            panic!("request build failed");
        };
        let (status, _) = send(&app, anonymous).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, empty("GET", &format!("/events/{id}"), "u1")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn invalid_input_is_bad_request() {
        let app = app();
        let (status, body) = send(
            &app,
            create_request(r#"{"eventName":"Gala","audienceSize":-3}"#, Some("u1")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], 1001);
    }
}
