//! HTTP implementation of the verification service contract

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use bgv_engine::VerificationService;
use bgv_types::*;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// REST client for the remote verification service
pub struct HttpVerificationService {
    client: Client,
    base_url: Url,
    api_token: Option<String>,
}

/// Body of the consent status endpoint
#[derive(Debug, Deserialize)]
struct ConsentStatusBody {
    status: ConsentStatus,
}

impl HttpVerificationService {
    /// Create a new client from its configuration
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|e| ClientError::InvalidEndpoint(format!("{} ({})", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidEndpoint(config.base_url));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_token: config.api_token,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ========== Internal HTTP helpers ==========

    /// Append percent-encoded path segments to the base URL
    fn url(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidEndpoint(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> ClientResult<RequestBuilder> {
        let url = self.url(segments)?;
        tracing::debug!(method = %method, url = %url, "Sending request");

        let builder = self.client.request(method, url);
        Ok(match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> ClientResult<T> {
        let response = self.request(Method::GET, segments)?.send().await?;
        self.handle_response(response).await
    }

    /// GET where a 404 means "nothing there yet"
    async fn get_optional<T: DeserializeOwned>(&self, segments: &[&str]) -> ClientResult<Option<T>> {
        let response = self.request(Method::GET, segments)?.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        self.handle_response(response).await.map(Some)
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> ClientResult<T> {
        let response = self.request(Method::POST, segments)?.json(body).send().await?;
        self.handle_response(response).await
    }

    async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> ClientResult<T> {
        let response = self.request(Method::PUT, segments)?.json(body).send().await?;
        self.handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> ClientResult<T> {
        let status = response.status();

        if status.is_success() {
            // 204 and empty bodies decode as JSON null, which fits `()` and `Option`
            let bytes = response.bytes().await?;
            let body: &[u8] = if bytes.is_empty() { b"null" } else { &bytes[..] };
            Ok(serde_json::from_slice(body)?)
        } else {
            let text = response.text().await.unwrap_or_default();
            let message = error_detail(&text).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
            tracing::debug!(status = status.as_u16(), message = %message, "Request rejected");
            Err(ClientError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// The server's own explanation of a failure.
///
/// Prefers a `message`, `detail` or `error` string field of a JSON body,
/// falling back to the raw body text.
pub(crate) fn error_detail(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        for key in ["message", "detail", "error"] {
            if let Some(Value::String(text)) = map.get(key) {
                if !text.trim().is_empty() {
                    return Some(text.clone());
                }
            }
        }
    }
    Some(trimmed.to_string())
}

#[async_trait]
impl VerificationService for HttpVerificationService {
    async fn list_offered_checks(&self, organization: &OrganizationId) -> BgvResult<Vec<OfferedCheck>> {
        Ok(self
            .get(&["api", "v1", "organizations", organization.as_str(), "checks"])
            .await?)
    }

    async fn get_verification(&self, candidate: &CandidateId) -> BgvResult<Option<VerificationRecord>> {
        Ok(self
            .get_optional(&["api", "v1", "candidates", candidate.as_str(), "verification"])
            .await?)
    }

    async fn initiate_stage_checks(&self, request: &InitiateStageRequest) -> BgvResult<VerificationRecord> {
        Ok(self
            .post(&["api", "v1", "verifications", "initiate"], request)
            .await?)
    }

    async fn run_stage(&self, verification: &VerificationId, stage: Stage) -> BgvResult<StageRunOutcome> {
        Ok(self
            .post(
                &["api", "v1", "verifications", verification.as_str(), "stages", stage.as_str(), "run"],
                &serde_json::json!({}),
            )
            .await?)
    }

    async fn start_check(
        &self,
        verification: &VerificationId,
        stage: Stage,
        check: &CheckId,
    ) -> BgvResult<CheckRunOutcome> {
        Ok(self
            .post(
                &[
                    "api",
                    "v1",
                    "verifications",
                    verification.as_str(),
                    "stages",
                    stage.as_str(),
                    "checks",
                    check.as_str(),
                    "start",
                ],
                &serde_json::json!({}),
            )
            .await?)
    }

    async fn retry_check(
        &self,
        verification: &VerificationId,
        stage: Stage,
        check: &CheckId,
    ) -> BgvResult<RetryOutcome> {
        Ok(self
            .post(
                &[
                    "api",
                    "v1",
                    "verifications",
                    verification.as_str(),
                    "stages",
                    stage.as_str(),
                    "checks",
                    check.as_str(),
                    "retry",
                ],
                &serde_json::json!({}),
            )
            .await?)
    }

    async fn get_consent_status(&self, candidate: &CandidateId) -> BgvResult<ConsentStatus> {
        let body: ConsentStatusBody = self
            .get(&["api", "v1", "candidates", candidate.as_str(), "consent"])
            .await?;
        Ok(body.status)
    }

    async fn send_consent(&self, candidate: &CandidateId) -> BgvResult<ConsentDispatch> {
        Ok(self
            .post(
                &["api", "v1", "candidates", candidate.as_str(), "consent", "send"],
                &serde_json::json!({}),
            )
            .await?)
    }

    async fn update_manual_check(
        &self,
        verification: &VerificationId,
        stage: Stage,
        check: &CheckId,
        update: &ManualCheckUpdate,
    ) -> BgvResult<()> {
        Ok(self
            .put(
                &[
                    "api",
                    "v1",
                    "verifications",
                    verification.as_str(),
                    "stages",
                    stage.as_str(),
                    "checks",
                    check.as_str(),
                ],
                update,
            )
            .await?)
    }
}
