//! REST backend provider and liveness probe.
//!
//! Talks to the contract served under `/api` (see [`crate::api`]): every
//! response wraps its payload as `{ "data": ... }`, and the caller's
//! identity travels in the [`USER_ID_HEADER`] header.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::{Backend, CallContext, DEFAULT_PROBE_TIMEOUT, EventProvider};
use crate::api::dto::DataEnvelope;
use crate::domain::{Event, EventId, EventPatch, NewEvent};
use crate::error::{ErrorResponse, PlannerError};

/// Header carrying the caller's identity to the REST backend.
pub const USER_ID_HEADER: &str = "x-user-id";

/// HTTP client for the REST backend.
#[derive(Debug, Clone)]
pub struct RestProvider {
    http: reqwest::Client,
    base_url: String,
    probe_timeout: Duration,
}

impl RestProvider {
    /// Creates a provider for the API rooted at `base_url`
    /// (e.g. `http://localhost:3000/api`).
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Overrides the liveness probe timeout.
    #[must_use]
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Single short-timeout read of `GET /events`. `true` only for a 2xx
    /// answer. No retries.
    pub async fn probe(&self) -> bool {
        let result = self
            .http
            .get(self.url("/events"))
            .timeout(self.probe_timeout)
            .send()
            .await;
        match result {
            Ok(resp) if resp.status().is_success() => {
                tracing::debug!(base_url = %self.base_url, "rest backend is live");
                true
            }
            Ok(resp) => {
                tracing::debug!(base_url = %self.base_url, status = %resp.status(), "rest backend unhealthy");
                false
            }
            Err(e) => {
                tracing::debug!(base_url = %self.base_url, error = %e, "rest backend unreachable");
                false
            }
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str, ctx: &CallContext) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match &ctx.identity {
            Some(user_id) => builder.header(USER_ID_HEADER, user_id.as_str()),
            None => builder,
        }
    }

    async fn read_data<T: DeserializeOwned>(response: Response) -> Result<T, PlannerError> {
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        let envelope: DataEnvelope<T> = response.json().await?;
        Ok(envelope.data)
    }

    async fn error_from(response: Response) -> PlannerError {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorResponse>(&text) {
            Ok(body) => body.error.message,
            Err(_) => text,
        };
        PlannerError::Backend { status, message }
    }
}

#[async_trait]
impl EventProvider for RestProvider {
    fn backend(&self) -> Backend {
        Backend::Rest
    }

    async fn list(&self, ctx: &CallContext) -> Result<Vec<Event>, PlannerError> {
        let response = self.request(Method::GET, "/events", ctx).send().await?;
        Self::read_data(response).await
    }

    async fn get(&self, ctx: &CallContext, id: EventId) -> Result<Option<Event>, PlannerError> {
        let response = self
            .request(Method::GET, &format!("/events/{id}"), ctx)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::read_data(response).await.map(Some)
    }

    async fn create(&self, ctx: &CallContext, new: &NewEvent) -> Result<Event, PlannerError> {
        ctx.require_identity()?;
        new.validate()?;
        let response = self
            .request(Method::POST, "/events", ctx)
            .json(new)
            .send()
            .await?;
        Self::read_data(response).await
    }

    async fn update(
        &self,
        ctx: &CallContext,
        id: EventId,
        patch: &EventPatch,
    ) -> Result<Event, PlannerError> {
        patch.validate()?;
        let response = self
            .request(Method::PUT, &format!("/events/{id}"), ctx)
            .json(patch)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(PlannerError::EventNotFound(id));
        }
        Self::read_data(response).await
    }

    async fn delete(&self, ctx: &CallContext, id: EventId) -> Result<bool, PlannerError> {
        let response = self
            .request(Method::DELETE, &format!("/events/{id}"), ctx)
            .send()
            .await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            s if s.is_success() => Ok(true),
            _ => Err(Self::error_from(response).await),
        }
    }
}
