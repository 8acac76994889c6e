//! HTTP client for the Firecast job endpoints.

use reqwest::{Client, Response, StatusCode};
use tracing::debug;

use firecast_models::{JobIdRequest, LeasedJob};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};

/// Client for `/job/get`, `/job/done` and `/job/fail`.
#[derive(Clone)]
pub struct QueueClient {
    http: Client,
    base_url: String,
    secret: String,
}

impl QueueClient {
    /// Create a new client.
    pub fn new(config: &WorkerConfig) -> WorkerResult<Self> {
        let http = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self {
            http,
            base_url: config.server_url.trim_end_matches('/').to_string(),
            secret: config.secret.clone(),
        })
    }

    /// Lease the next job. `None` means the queue is empty.
    pub async fn lease(&self) -> WorkerResult<Option<LeasedJob>> {
        let response = self
            .http
            .get(format!("{}/job/get", self.base_url))
            .bearer_auth(&self.secret)
            .send()
            .await?;

        if response.status() == StatusCode::NO_CONTENT {
            debug!("No jobs available");
            return Ok(None);
        }

        let response = check_status(response).await?;
        Ok(Some(response.json().await?))
    }

    /// Report a job as done.
    pub async fn complete(&self, id: &str) -> WorkerResult<()> {
        self.report("done", id).await
    }

    /// Report a job as failed.
    pub async fn fail(&self, id: &str) -> WorkerResult<()> {
        self.report("fail", id).await
    }

    async fn report(&self, outcome: &str, id: &str) -> WorkerResult<()> {
        let response = self
            .http
            .post(format!("{}/job/{}", self.base_url, outcome))
            .bearer_auth(&self.secret)
            .json(&JobIdRequest::new(id))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

async fn check_status(response: Response) -> WorkerResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(WorkerError::Server {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer) -> QueueClient {
        QueueClient::new(&WorkerConfig {
            server_url: server.uri(),
            secret: "s3cret".to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_lease_no_content_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/job/get"))
            .and(header("Authorization", "Bearer s3cret"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        assert!(client_for(&server).lease().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lease_parses_job() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/job/get"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "A",
                "url": "https://youtu.be/u1",
                "playlistId": 6,
                "retries": 1,
                "addedAt": 1752416738,
                "lastAttemptAt": 1752416738
            })))
            .mount(&server)
            .await;

        let job = client_for(&server).lease().await.unwrap().unwrap();
        assert_eq!(job.id.as_str(), "A");
        assert_eq!(job.playlist_id, 6);
        assert_eq!(job.retries, 1);
    }

    #[tokio::test]
    async fn test_report_sends_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/job/fail"))
            .and(body_json(serde_json::json!({ "id": "A" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({ "status": true, "message": "Job marked as failed" }),
            ))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).fail("A").await.unwrap();
    }

    #[tokio::test]
    async fn test_conflict_is_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/job/done"))
            .respond_with(ResponseTemplate::new(409).set_body_string("already done"))
            .mount(&server)
            .await;

        let err = client_for(&server).complete("A").await.unwrap_err();
        assert!(matches!(err, WorkerError::Server { status: 409, .. }));
    }
}
