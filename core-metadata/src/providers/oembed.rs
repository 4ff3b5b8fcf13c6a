//! Instagram oEmbed Client
//!
//! ## API Endpoint
//!
//! - **oEmbed**: `{graph_api_base}/instagram_oembed?url={post}[&access_token={token}]`
//!
//! Calls use the API timeout (10 s by default) and the retry policy.

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest};
use core_library::models::ImageMetadata;
use core_runtime::config::InstagramConfig;
use core_runtime::logging::redact_if_sensitive;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::{MetadataError, Result};
use crate::instagram::{self, OEmbedResponse};
use crate::providers::MetadataStrategy;
use crate::retry::{retry_request, RetryPolicy};

/// Graph API oEmbed client shared by the strategies.
pub struct OEmbedClient {
    http_client: Arc<dyn HttpClient>,
    endpoint: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl OEmbedClient {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        graph_api_base: &str,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            http_client,
            endpoint: format!("{}/instagram_oembed", graph_api_base.trim_end_matches('/')),
            timeout,
            retry,
        }
    }

    pub fn from_config(
        http_client: Arc<dyn HttpClient>,
        config: &InstagramConfig,
        retry: RetryPolicy,
    ) -> Self {
        Self::new(http_client, &config.graph_api_base, config.api_timeout, retry)
    }

    /// Fetch the oEmbed document for `post_url`, retrying per policy.
    pub async fn fetch(&self, post_url: &str, access_token: Option<&str>) -> Result<OEmbedResponse> {
        retry_request(self.retry, "instagram_oembed", || {
            self.fetch_once(post_url, access_token)
        })
        .await
    }

    async fn fetch_once(&self, post_url: &str, access_token: Option<&str>) -> Result<OEmbedResponse> {
        let mut request = HttpRequest::get(self.endpoint.as_str())
            .query("url", post_url)
            .header("Accept", "application/json")
            .timeout(self.timeout);
        if let Some(token) = access_token {
            request = request.query("access_token", token);
        }

        debug!(
            url = post_url,
            access_token = ?access_token.map(|t| redact_if_sensitive("access_token", t)),
            "Querying oEmbed"
        );

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| MetadataError::NetworkError(format!("oEmbed request failed: {}", e)))?;

        if !response.is_success() {
            return Err(MetadataError::HttpError {
                status: response.status,
                body: String::from_utf8_lossy(&response.body).to_string(),
            });
        }

        serde_json::from_slice(&response.body)
            .map_err(|e| MetadataError::JsonParse(format!("Failed to parse oEmbed response: {}", e)))
    }
}

/// oEmbed with the configured access token. Fails immediately without one.
pub struct AuthenticatedOEmbed {
    client: Arc<OEmbedClient>,
    access_token: Option<String>,
}

impl AuthenticatedOEmbed {
    pub fn new(client: Arc<OEmbedClient>, access_token: Option<String>) -> Self {
        Self {
            client,
            access_token: access_token.filter(|t| !t.is_empty()),
        }
    }
}

#[async_trait]
impl MetadataStrategy for AuthenticatedOEmbed {
    fn name(&self) -> &'static str {
        "authenticated_oembed"
    }

    async fn fetch(&self, url: &str) -> Result<ImageMetadata> {
        let token = self
            .access_token
            .as_deref()
            .ok_or(MetadataError::MissingCredentials)?;
        let oembed = self.client.fetch(url, Some(token)).await?;
        Ok(instagram::from_oembed(url, oembed))
    }
}

/// oEmbed without credentials.
pub struct PublicOEmbed {
    client: Arc<OEmbedClient>,
}

impl PublicOEmbed {
    pub fn new(client: Arc<OEmbedClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MetadataStrategy for PublicOEmbed {
    fn name(&self) -> &'static str {
        "public_oembed"
    }

    async fn fetch(&self, url: &str) -> Result<ImageMetadata> {
        let oembed = self.client.fetch(url, None).await?;
        Ok(instagram::from_oembed(url, oembed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::http::HttpResponse;
    use std::sync::Mutex;

    const URL: &str = "https://www.instagram.com/p/CxYz123/";

    /// Replays canned responses and records requests.
    struct ScriptedHttp {
        responses: Mutex<Vec<BridgeResult<HttpResponse>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedHttp {
        fn new(responses: Vec<BridgeResult<HttpResponse>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into_iter().rev().collect()),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl HttpClient for ScriptedHttp {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(BridgeError::OperationFailed("exhausted".to_string())))
        }
    }

    fn client(http: Arc<ScriptedHttp>) -> Arc<OEmbedClient> {
        Arc::new(OEmbedClient::new(
            http,
            "https://graph.example.com/v18.0/",
            Duration::from_secs(10),
            RetryPolicy::new(3, Duration::from_millis(1)),
        ))
    }

    fn ok_json(body: &str) -> BridgeResult<HttpResponse> {
        Ok(HttpResponse::new(200, body.to_string()))
    }

    #[tokio::test]
    async fn test_authenticated_sends_token_and_timeout() {
        let http = ScriptedHttp::new(vec![ok_json(
            r#"{"author_name":"natgeo","title":"Sunrise","thumbnail_url":"https://cdn/t.jpg"}"#,
        )]);
        let strategy = AuthenticatedOEmbed::new(client(http.clone()), Some("tok".to_string()));

        let metadata = strategy.fetch(URL).await.unwrap();
        assert_eq!(metadata.author_name, "natgeo");

        let requests = http.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "https://graph.example.com/v18.0/instagram_oembed");
        assert_eq!(requests[0].query_value("url"), Some(URL));
        assert_eq!(requests[0].query_value("access_token"), Some("tok"));
        assert_eq!(requests[0].timeout, Some(Duration::from_secs(10)));
    }

    #[tokio::test]
    async fn test_authenticated_without_token_makes_no_request() {
        let http = ScriptedHttp::new(vec![]);
        let strategy = AuthenticatedOEmbed::new(client(http.clone()), Some(String::new()));

        let result = strategy.fetch(URL).await;
        assert!(matches!(result, Err(MetadataError::MissingCredentials)));
        assert!(http.requests.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_public_retries_then_succeeds() {
        let http = ScriptedHttp::new(vec![
            Ok(HttpResponse::new(500, "oops")),
            Err(BridgeError::Timeout(Duration::from_secs(10))),
            ok_json(r#"{"title":"Third time"}"#),
        ]);
        let strategy = PublicOEmbed::new(client(http.clone()));

        let metadata = strategy.fetch(URL).await.unwrap();
        assert_eq!(metadata.title, "Third time");
        assert_eq!(metadata.author_name, "Unknown");

        let requests = http.requests.lock().unwrap();
        assert_eq!(requests.len(), 3);
        assert!(requests.iter().all(|r| r.query_value("access_token").is_none()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_public_gives_up_after_three_attempts() {
        let http = ScriptedHttp::new(vec![
            Ok(HttpResponse::new(400, "bad")),
            Ok(HttpResponse::new(400, "bad")),
            Ok(HttpResponse::new(400, "bad")),
            ok_json("{}"),
        ]);
        let strategy = PublicOEmbed::new(client(http.clone()));

        let result = strategy.fetch(URL).await;
        assert!(matches!(result, Err(MetadataError::HttpError { status: 400, .. })));
        assert_eq!(http.requests.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_malformed_json_is_parse_error() {
        let http = ScriptedHttp::new(vec![
            ok_json("not json"),
            ok_json("not json"),
            ok_json("not json"),
        ]);
        let result = client(http).fetch(URL, None).await;
        assert!(matches!(result, Err(MetadataError::JsonParse(_))));
    }
}
