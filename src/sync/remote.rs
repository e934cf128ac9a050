//! Remote side of the sync session: the record gateway, in-process or over HTTP.

use crate::core::{Result, TrackerError, UserRecord};
use crate::gateway::RecordGateway;
use crate::plan::SupplementPlan;
use crate::web::ErrorResponse;
use crate::web::models::{OkResponse, SetDayRequest};
use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde_json::Value;
use std::time::Duration;

#[async_trait]
pub trait RemoteRecords: Send + Sync {
    /// Visible record for `user`.
    async fn fetch(&self, user: &str) -> Result<UserRecord>;

    /// Stores the full list for one date.
    async fn push(&self, user: &str, date: &str, supplements: &[String]) -> Result<()>;
}

#[async_trait]
impl RemoteRecords for RecordGateway {
    async fn fetch(&self, user: &str) -> Result<UserRecord> {
        self.get_visible(user).await
    }

    async fn push(&self, user: &str, date: &str, supplements: &[String]) -> Result<()> {
        self.set_day(user, date, supplements.to_vec()).await
    }
}

/// Talks to a running server's `/api/get` and `/api/set`.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRemote {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TrackerError::remote(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// The plan the server is configured with.
    pub async fn fetch_plan(&self) -> Result<SupplementPlan> {
        let response = self
            .client
            .get(self.url("/api/plan"))
            .send()
            .await
            .map_err(|e| TrackerError::remote(format!("GET /api/plan failed: {e}")))?;
        let response = check_status(response).await?;
        let plan: SupplementPlan = response
            .json()
            .await
            .map_err(|e| TrackerError::remote(format!("invalid /api/plan body: {e}")))?;
        plan.validate()?;
        Ok(plan)
    }
}

#[async_trait]
impl RemoteRecords for HttpRemote {
    async fn fetch(&self, user: &str) -> Result<UserRecord> {
        let response = self
            .client
            .get(self.url("/api/get"))
            .query(&[("user", user)])
            .send()
            .await
            .map_err(|e| TrackerError::remote(format!("GET /api/get failed: {e}")))?;
        let response = check_status(response).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| TrackerError::remote(format!("invalid /api/get body: {e}")))?;
        UserRecord::from_json(body, user)
    }

    async fn push(&self, user: &str, date: &str, supplements: &[String]) -> Result<()> {
        let request = SetDayRequest {
            user: user.to_string(),
            date: date.to_string(),
            supplements: supplements.to_vec(),
        };
        let response = self
            .client
            .post(self.url("/api/set"))
            .json(&request)
            .send()
            .await
            .map_err(|e| TrackerError::remote(format!("POST /api/set failed: {e}")))?;
        let response = check_status(response).await?;
        let ack: OkResponse = response
            .json()
            .await
            .map_err(|e| TrackerError::remote(format!("invalid /api/set body: {e}")))?;
        if !ack.ok {
            return Err(TrackerError::remote("server did not acknowledge write"));
        }
        Ok(())
    }
}

/// Maps a non-2xx response onto the error taxonomy: 400 stays a validation
/// error, 405 stays method-not-allowed, anything else is a remote failure.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .json::<ErrorResponse>()
        .await
        .map(|body| body.error)
        .unwrap_or_else(|_| status.to_string());
    Err(match status {
        StatusCode::BAD_REQUEST => TrackerError::Validation(message),
        StatusCode::METHOD_NOT_ALLOWED => TrackerError::MethodNotAllowed,
        _ => TrackerError::remote(format!("{status}: {message}")),
    })
}
