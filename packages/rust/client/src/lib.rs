//! HTTP client for the Deploy API.
//!
//! Every operation is scoped to an organization and deployment. Responses
//! are returned as untyped JSON so that unknown fields survive enrichment
//! untouched.

use std::time::Duration;

use docbridge_shared::{ApiConfig, DocBridgeError, Result};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::{Value, json};
use tracing::{debug, instrument, warn};
use url::Url;

/// Header carrying the deploy token.
pub const AUTH_HEADER: &str = "X-Deploy-API-Auth";

/// User-Agent string for API requests.
const USER_AGENT: &str = concat!("docbridge/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 3;

// ---------------------------------------------------------------------------
// ContentQuery
// ---------------------------------------------------------------------------

/// Selector for a single document. Empty values are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentQuery {
    pub for_path: Option<String>,
    pub for_id: Option<String>,
}

impl ContentQuery {
    fn params(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [("for-path", &self.for_path), ("for-id", &self.for_id)]
            .into_iter()
            .filter_map(|(key, value)| {
                value
                    .as_deref()
                    .filter(|v| !v.is_empty())
                    .map(|v| (key, v))
            })
    }
}

// ---------------------------------------------------------------------------
// DeployClient
// ---------------------------------------------------------------------------

/// Thin async wrapper over the Deploy API endpoints.
#[derive(Debug, Clone)]
pub struct DeployClient {
    http: Client,
    base_url: Url,
    token: Option<String>,
}

impl DeployClient {
    /// Build a client from resolved API settings.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base = config.base_url.trim_end_matches('/');
        let base_url = Url::parse(base).map_err(|e| {
            DocBridgeError::config(format!("invalid API base URL '{}': {e}", config.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(DocBridgeError::config(format!(
                "invalid API base URL '{}': cannot be a base",
                config.base_url
            )));
        }

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DocBridgeError::Network(format!("failed to build HTTP client: {e}")))?;

        if config.token.is_none() {
            warn!("no deploy token configured; API calls may be rejected");
        }

        Ok(Self {
            http,
            base_url,
            token: config.token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Full-text search within a deployment.
    #[instrument(skip(self), fields(org = %org, deployment = %deployment))]
    pub async fn search(&self, org: &str, deployment: &str, query: &str) -> Result<Value> {
        let url = self.deployment_url(org, deployment, &["search"]);
        let request = self
            .request(Method::POST, url)
            .json(&json!({ "queryString": query }));
        self.send_json(request).await
    }

    /// Deployment metadata.
    #[instrument(skip(self), fields(org = %org, deployment = %deployment))]
    pub async fn get_deployment(&self, org: &str, deployment: &str) -> Result<Value> {
        let url = self.deployment_url(org, deployment, &[]);
        self.send_json(self.request(Method::GET, url)).await
    }

    /// Navigation tree of a deployment.
    #[instrument(skip(self), fields(org = %org, deployment = %deployment))]
    pub async fn get_structure(&self, org: &str, deployment: &str) -> Result<Value> {
        let url = self.deployment_url(org, deployment, &["structure"]);
        self.send_json(self.request(Method::GET, url)).await
    }

    /// UI strings for `locale`.
    #[instrument(skip(self), fields(org = %org, deployment = %deployment))]
    pub async fn get_html_strings(
        &self,
        org: &str,
        deployment: &str,
        locale: &str,
    ) -> Result<Value> {
        let mut url = self.deployment_url(org, deployment, &["html-strings"]);
        url.query_pairs_mut().append_pair("locale", locale);
        self.send_json(self.request(Method::GET, url)).await
    }

    /// A single document selected by path or id.
    #[instrument(skip(self, query), fields(org = %org, deployment = %deployment))]
    pub async fn get_content(
        &self,
        org: &str,
        deployment: &str,
        query: &ContentQuery,
    ) -> Result<Value> {
        let mut url = self.deployment_url(org, deployment, &["content"]);
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query.params() {
                pairs.append_pair(key, value);
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        self.send_json(self.request(Method::GET, url)).await
    }

    /// An OpenAPI document, returned verbatim.
    #[instrument(skip(self), fields(org = %org, deployment = %deployment))]
    pub async fn get_open_api_specification(
        &self,
        org: &str,
        deployment: &str,
        specification_id: &str,
    ) -> Result<String> {
        let url = self.deployment_url(org, deployment, &["api-specification", specification_id]);
        let response = self.send(self.request(Method::GET, url)).await?;
        read_body(response).await
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// `{base}/org/{org}/deployments/{deployment}/{extra...}` with each
    /// segment percent-encoded.
    fn deployment_url(&self, org: &str, deployment: &str, extra: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["org", org, "deployments", deployment])
                .extend(extra);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(%method, %url, "deploy API request");
        let request = self.http.request(method, url);
        match &self.token {
            Some(token) => request.header(AUTH_HEADER, token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| DocBridgeError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), "deploy API error response");
            return Err(DocBridgeError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    async fn send_json(&self, request: RequestBuilder) -> Result<Value> {
        let response = self.send(request).await?;
        let body = read_body(response).await?;
        serde_json::from_str(&body)
            .map_err(|e| DocBridgeError::parse(format!("invalid JSON from deploy API: {e}")))
    }
}

async fn read_body(response: Response) -> Result<String> {
    response
        .text()
        .await
        .map_err(|e| DocBridgeError::Network(format!("failed to read body: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, token: Option<&str>) -> DeployClient {
        let config = ApiConfig {
            base_url: format!("{}/v3/", server.uri()),
            token: token.map(str::to_string),
            timeout_secs: 5,
        };
        DeployClient::new(&config).expect("client")
    }

    #[test]
    fn deployment_urls_keep_base_prefix() {
        let client = DeployClient::new(&ApiConfig::default()).expect("client");
        let url = client.deployment_url("acme", "docs", &["search"]);
        assert_eq!(
            url.as_str(),
            "https://deploy.heretto.com/v3/org/acme/deployments/docs/search"
        );
        assert_eq!(client.base_url(), "https://deploy.heretto.com/v3");
    }

    #[test]
    fn deployment_url_segments_are_encoded() {
        let client = DeployClient::new(&ApiConfig::default()).expect("client");
        let url = client.deployment_url("a b", "x/y", &[]);
        assert_eq!(
            url.as_str(),
            "https://deploy.heretto.com/v3/org/a%20b/deployments/x%2Fy"
        );
    }

    #[test]
    fn invalid_base_url_is_a_config_error() {
        let config = ApiConfig {
            base_url: "not a url".into(),
            ..ApiConfig::default()
        };
        let err = DeployClient::new(&config).unwrap_err();
        assert!(matches!(err, DocBridgeError::Config { .. }));
    }

    #[test]
    fn content_query_skips_empty_values() {
        let query = ContentQuery {
            for_path: Some(String::new()),
            for_id: Some("abc".into()),
        };
        let params: Vec<_> = query.params().collect();
        assert_eq!(params, vec![("for-id", "abc")]);
    }

    #[tokio::test]
    async fn search_posts_query_with_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/org/acme/deployments/docs/search"))
            .and(header(AUTH_HEADER, "secret"))
            .and(body_json(json!({"queryString": "webhooks"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"results": [{"path": "/a"}]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server, Some("secret"))
            .search("acme", "docs", "webhooks")
            .await
            .expect("search");
        assert_eq!(result["results"][0]["path"], "/a");
    }

    #[tokio::test]
    async fn html_strings_send_locale() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/org/acme/deployments/docs/html-strings"))
            .and(query_param("locale", "fr"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hello": "bonjour"})))
            .mount(&server)
            .await;

        let result = client_for(&server, None)
            .get_html_strings("acme", "docs", "fr")
            .await
            .expect("html strings");
        assert_eq!(result["hello"], "bonjour");
    }

    #[tokio::test]
    async fn content_sends_path_selector() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/org/acme/deployments/docs/content"))
            .and(query_param("for-path", "/guides/setup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"title": "Setup"})))
            .mount(&server)
            .await;

        let result = client_for(&server, None)
            .get_content("acme", "docs", &ContentQuery {
                for_path: Some("/guides/setup".into()),
                ..ContentQuery::default()
            })
            .await
            .expect("content");
        assert_eq!(result["title"], "Setup");
    }

    #[tokio::test]
    async fn deployment_and_structure_endpoints() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/org/acme/deployments/docs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "Docs"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v3/org/acme/deployments/docs/structure"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"children": []})))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let info = client.get_deployment("acme", "docs").await.expect("info");
        assert_eq!(info["name"], "Docs");
        let structure = client.get_structure("acme", "docs").await.expect("structure");
        assert_eq!(structure["children"], json!([]));
    }

    #[tokio::test]
    async fn open_api_spec_is_raw_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/org/acme/deployments/docs/api-specification/spec-1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("openapi: 3.0.0\n"))
            .mount(&server)
            .await;

        let text = client_for(&server, None)
            .get_open_api_specification("acme", "docs", "spec-1")
            .await
            .expect("spec");
        assert_eq!(text, "openapi: 3.0.0\n");
    }

    #[tokio::test]
    async fn non_success_status_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such deployment"))
            .mount(&server)
            .await;

        let err = client_for(&server, None)
            .get_deployment("acme", "missing")
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "API returned HTTP 404: no such deployment");
    }

    #[tokio::test]
    async fn invalid_json_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client_for(&server, None)
            .get_structure("acme", "docs")
            .await
            .unwrap_err();
        assert!(matches!(err, DocBridgeError::Parse { .. }));
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        let config = ApiConfig {
            base_url: "http://127.0.0.1:9".into(),
            token: None,
            timeout_secs: 2,
        };
        let err = DeployClient::new(&config)
            .expect("client")
            .get_deployment("acme", "docs")
            .await
            .unwrap_err();
        assert!(matches!(err, DocBridgeError::Network(_)));
    }
}
