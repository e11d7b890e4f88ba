//! Tool catalogue and dispatch.
//!
//! Each tool maps onto one Deploy API call (or a local portal-URL helper)
//! and runs the response through the enrichment pipeline. Every failure is
//! rendered as tool output with `isError` set so the assistant can read it.

use docbridge_client::{ContentQuery, DeployClient};
use docbridge_core::{Enricher, PortalUrls};
use docbridge_shared::{BridgeConfig, DocBridgeError, Result};
use serde_json::{Map, Value, json};
use tracing::{info, instrument, warn};

use crate::protocol::{ToolDefinition, ToolResult};

/// Locale used by `get_html_strings` when none is given.
const DEFAULT_LOCALE: &str = "en";

/// Environment variables that provide the organization and deployment
/// defaults, named in error messages.
pub const ORG_ENV: &str = "DOCBRIDGE_ORGANIZATION_ID";
pub const DEPLOYMENT_ENV: &str = "DOCBRIDGE_DEPLOYMENT_ID";
pub const PORTAL_ENV: &str = "DOCBRIDGE_PORTAL_BASE_URL";

// ---------------------------------------------------------------------------
// Tool
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    SearchDeployment,
    GetContent,
    GetDeploymentStructure,
    GetDeploymentInfo,
    GetHtmlStrings,
    GetOpenApiSpec,
    GeneratePortalUrls,
    TestPortalUrl,
}

impl Tool {
    /// All tools in listing order.
    pub const ALL: [Tool; 8] = [
        Self::SearchDeployment,
        Self::GetContent,
        Self::GetDeploymentStructure,
        Self::GetDeploymentInfo,
        Self::GetHtmlStrings,
        Self::GetOpenApiSpec,
        Self::GeneratePortalUrls,
        Self::TestPortalUrl,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::SearchDeployment => "search_deployment",
            Self::GetContent => "get_content",
            Self::GetDeploymentStructure => "get_deployment_structure",
            Self::GetDeploymentInfo => "get_deployment_info",
            Self::GetHtmlStrings => "get_html_strings",
            Self::GetOpenApiSpec => "get_open_api_spec",
            Self::GeneratePortalUrls => "generate_portal_urls",
            Self::TestPortalUrl => "test_portal_url",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    fn description(&self) -> &'static str {
        match self {
            Self::SearchDeployment => {
                "Search the documentation deployment. Use this first for any question about \
                 the product; results carry titles, paths, portal URLs, ranked snippets and \
                 a quick answer when one can be found."
            }
            Self::GetContent => {
                "Fetch the full content of one document by path or id, usually taken from \
                 search results. Adds key facts, section headings and the portal link."
            }
            Self::GetDeploymentStructure => {
                "Get the navigation tree of the deployment, with portal URLs on every node."
            }
            Self::GetDeploymentInfo => {
                "Get deployment metadata such as title, description and configuration."
            }
            Self::GetHtmlStrings => "Get the UI strings of the deployment for a locale.",
            Self::GetOpenApiSpec => "Get an OpenAPI specification published in the deployment.",
            Self::GeneratePortalUrls => "Turn document paths into clickable portal URLs.",
            Self::TestPortalUrl => "Show the portal URL configuration with example links.",
        }
    }

    /// Whether the tool talks to a deployment and so needs org/deployment ids.
    fn is_scoped(&self) -> bool {
        !matches!(self, Self::GeneratePortalUrls | Self::TestPortalUrl)
    }

    /// Tool-specific properties as (name, schema, required).
    fn own_properties(&self) -> Vec<(&'static str, Value, bool)> {
        match self {
            Self::SearchDeployment => vec![(
                "query",
                json!({"type": "string", "description": "Search terms taken from the user's question"}),
                true,
            )],
            Self::GetContent => vec![
                (
                    "for_path",
                    json!({"type": "string", "description": "Document path from search results (e.g. '/guides/getting-started')"}),
                    false,
                ),
                (
                    "for_id",
                    json!({"type": "string", "description": "Document id from search results"}),
                    false,
                ),
            ],
            Self::GetHtmlStrings => vec![(
                "locale",
                json!({"type": "string", "description": "Locale code", "default": DEFAULT_LOCALE}),
                false,
            )],
            Self::GetOpenApiSpec => vec![(
                "specification_id",
                json!({"type": "string", "description": "The specification id"}),
                true,
            )],
            Self::GeneratePortalUrls => vec![(
                "paths",
                json!({"type": "array", "items": {"type": "string"}, "description": "Document paths to turn into URLs"}),
                true,
            )],
            Self::GetDeploymentStructure | Self::GetDeploymentInfo | Self::TestPortalUrl => {
                Vec::new()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ToolRouter
// ---------------------------------------------------------------------------

/// Resolves tool calls against the Deploy API and the enrichment pipeline.
#[derive(Debug, Clone)]
pub struct ToolRouter {
    client: DeployClient,
    enricher: Enricher,
    default_org: Option<String>,
    default_deployment: Option<String>,
}

impl ToolRouter {
    pub fn new(config: &BridgeConfig) -> Result<Self> {
        let client = DeployClient::new(&config.api)?;
        let enricher = Enricher::new(PortalUrls::new(config.portal_base_url.as_str()));
        Ok(Self::with_parts(
            client,
            enricher,
            config.default_organization_id.clone(),
            config.default_deployment_id.clone(),
        ))
    }

    pub fn with_parts(
        client: DeployClient,
        enricher: Enricher,
        default_org: Option<String>,
        default_deployment: Option<String>,
    ) -> Self {
        Self {
            client,
            enricher,
            default_org,
            default_deployment,
        }
    }

    pub fn portal(&self) -> &PortalUrls {
        self.enricher.portal()
    }

    /// Tool listing. Org and deployment ids are only required in the
    /// schema when no default is configured.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        Tool::ALL
            .iter()
            .map(|tool| ToolDefinition {
                name: tool.name(),
                description: tool.description(),
                input_schema: self.input_schema(*tool),
            })
            .collect()
    }

    fn input_schema(&self, tool: Tool) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        if tool.is_scoped() {
            for (key, default) in [
                ("organization_id", &self.default_org),
                ("deployment_id", &self.default_deployment),
            ] {
                let label = key.replace('_', " ").replace(" id", " ID");
                let description = match default {
                    Some(value) => format!("The {label} (default: {value})"),
                    None => {
                        required.push(key);
                        format!("The {label}")
                    }
                };
                properties.insert(
                    key.to_string(),
                    json!({"type": "string", "description": description}),
                );
            }
        }

        for (key, schema, is_required) in tool.own_properties() {
            if is_required {
                required.push(key);
            }
            properties.insert(key.to_string(), schema);
        }

        let mut schema = json!({"type": "object", "properties": properties});
        if !required.is_empty() {
            schema["required"] = json!(required);
        }
        schema
    }

    /// Run a tool. Never fails at the protocol level.
    #[instrument(skip_all, fields(tool = %name))]
    pub async fn call(&self, name: &str, arguments: &Map<String, Value>) -> ToolResult {
        let outcome = match Tool::from_name(name) {
            Some(tool) => self.dispatch(tool, arguments).await,
            None => Err(DocBridgeError::Tool(format!("unknown tool: {name}"))),
        };

        match outcome {
            Ok(text) => {
                info!(bytes = text.len(), "tool call succeeded");
                ToolResult::text(text)
            }
            Err(err) => {
                warn!(error = %err, "tool call failed");
                ToolResult::error(error_text(name, &err))
            }
        }
    }

    async fn dispatch(&self, tool: Tool, args: &Map<String, Value>) -> Result<String> {
        match tool {
            Tool::SearchDeployment => {
                let (org, deployment) = self.scope(args)?;
                let query = required_str(args, "query", "query is required")?;
                let raw = self.client.search(org, deployment, query).await?;
                pretty(&self.enricher.enrich(&raw, query))
            }
            Tool::GetContent => {
                let (org, deployment) = self.scope(args)?;
                let query = ContentQuery {
                    for_path: optional_str(args, "for_path").map(str::to_string),
                    for_id: optional_str(args, "for_id").map(str::to_string),
                };
                let raw = self.client.get_content(org, deployment, &query).await?;
                pretty(&self.enricher.enrich_content(&raw, query.for_path.as_deref()))
            }
            Tool::GetDeploymentStructure => {
                let (org, deployment) = self.scope(args)?;
                let raw = self.client.get_structure(org, deployment).await?;
                pretty(&self.enricher.decorate(&raw))
            }
            Tool::GetDeploymentInfo => {
                let (org, deployment) = self.scope(args)?;
                let raw = self.client.get_deployment(org, deployment).await?;
                pretty(&self.enricher.decorate(&raw))
            }
            Tool::GetHtmlStrings => {
                let (org, deployment) = self.scope(args)?;
                let locale = optional_str(args, "locale").unwrap_or(DEFAULT_LOCALE);
                let raw = self.client.get_html_strings(org, deployment, locale).await?;
                pretty(&raw)
            }
            Tool::GetOpenApiSpec => {
                let (org, deployment) = self.scope(args)?;
                let id = required_str(args, "specification_id", "specification_id is required")?;
                self.client
                    .get_open_api_specification(org, deployment, id)
                    .await
            }
            Tool::GeneratePortalUrls => self.generate_portal_urls(args),
            Tool::TestPortalUrl => pretty(&self.portal().diagnostics()),
        }
    }

    /// Organization and deployment for a call: explicit arguments first,
    /// then the configured defaults.
    fn scope<'a>(&'a self, args: &'a Map<String, Value>) -> Result<(&'a str, &'a str)> {
        let org = scoped_arg(args, "organization_id", &self.default_org, ORG_ENV)?;
        let deployment =
            scoped_arg(args, "deployment_id", &self.default_deployment, DEPLOYMENT_ENV)?;
        Ok((org, deployment))
    }

    fn generate_portal_urls(&self, args: &Map<String, Value>) -> Result<String> {
        let paths = args
            .get("paths")
            .and_then(Value::as_array)
            .ok_or_else(|| DocBridgeError::validation("paths array is required"))?;

        if !self.portal().is_configured() {
            return Err(DocBridgeError::validation(format!(
                "portal base URL not configured (set {PORTAL_ENV} or [portal].base_url)"
            )));
        }

        pretty(&self.portal().generate(paths))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Non-empty string argument.
fn optional_str<'a>(args: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

/// String argument that must be present. Empty strings are accepted.
fn required_str<'a>(args: &'a Map<String, Value>, key: &str, message: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| DocBridgeError::validation(message))
}

/// Explicit argument, else the configured default.
fn scoped_arg<'a>(
    args: &'a Map<String, Value>,
    key: &str,
    default: &'a Option<String>,
    env_var: &str,
) -> Result<&'a str> {
    optional_str(args, key)
        .or(default.as_deref())
        .ok_or_else(|| {
            DocBridgeError::validation(format!(
                "{key} is required (set {env_var} to provide a default)"
            ))
        })
}

fn pretty(value: &Value) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| DocBridgeError::parse(format!("failed to render response: {e}")))
}

/// Tool-output text for a failed call.
fn error_text(tool: &str, err: &DocBridgeError) -> String {
    match err {
        DocBridgeError::Validation { message } => format!("Error: {message}"),
        DocBridgeError::Tool(message) => format!("Error calling {tool}: {message}"),
        DocBridgeError::Api { status, body } => {
            format!("Error calling {tool}: {err}\nStatus code: {status}\nResponse: {body}")
        }
        other => format!("Error calling {tool}: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use docbridge_shared::ApiConfig;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn router(base_url: &str, org: Option<&str>, deployment: Option<&str>, portal: &str) -> ToolRouter {
        let config = BridgeConfig {
            api: ApiConfig {
                base_url: base_url.to_string(),
                token: Some("token".into()),
                timeout_secs: 5,
            },
            default_organization_id: org.map(str::to_string),
            default_deployment_id: deployment.map(str::to_string),
            portal_base_url: portal.to_string(),
        };
        ToolRouter::new(&config).expect("router")
    }

    fn offline_router() -> ToolRouter {
        router("http://127.0.0.1:9", Some("acme"), Some("docs"), "https://help.example.com")
    }

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn tool_names_round_trip() {
        for tool in Tool::ALL {
            assert_eq!(Tool::from_name(tool.name()), Some(tool));
        }
        assert_eq!(Tool::from_name("nope"), None);
    }

    #[test]
    fn schemas_require_ids_only_without_defaults() {
        let defs = router("http://127.0.0.1:9", None, Some("docs"), "").definitions();
        assert_eq!(defs.len(), 8);

        let search = &defs[0];
        assert_eq!(search.name, "search_deployment");
        assert_eq!(search.input_schema["required"], json!(["organization_id", "query"]));
        assert_eq!(
            search.input_schema["properties"]["deployment_id"]["description"],
            "The deployment ID (default: docs)"
        );

        let content = defs.iter().find(|d| d.name == "get_content").expect("get_content");
        assert_eq!(content.input_schema["required"], json!(["organization_id"]));

        let test = defs.iter().find(|d| d.name == "test_portal_url").expect("test_portal_url");
        assert_eq!(test.input_schema, json!({"type": "object", "properties": {}}));
    }

    #[test]
    fn schemas_with_all_defaults_have_no_required_ids() {
        let defs = offline_router().definitions();
        let info = defs.iter().find(|d| d.name == "get_deployment_info").expect("info");
        assert!(info.input_schema.get("required").is_none());

        let urls = defs.iter().find(|d| d.name == "generate_portal_urls").expect("urls");
        assert_eq!(urls.input_schema["required"], json!(["paths"]));
        assert!(urls.input_schema["properties"].get("organization_id").is_none());
    }

    #[tokio::test]
    async fn missing_org_names_the_variable() {
        let result = router("http://127.0.0.1:9", None, None, "")
            .call("get_deployment_info", &Map::new())
            .await;
        assert!(result.is_error);
        assert_eq!(
            result.text_content(),
            "Error: organization_id is required (set DOCBRIDGE_ORGANIZATION_ID to provide a default)"
        );
    }

    #[tokio::test]
    async fn missing_query_is_reported() {
        let result = offline_router().call("search_deployment", &Map::new()).await;
        assert!(result.is_error);
        assert_eq!(result.text_content(), "Error: query is required");
    }

    #[tokio::test]
    async fn missing_specification_id_is_reported() {
        let result = offline_router().call("get_open_api_spec", &Map::new()).await;
        assert_eq!(result.text_content(), "Error: specification_id is required");
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error_result() {
        let result = offline_router().call("delete_everything", &Map::new()).await;
        assert!(result.is_error);
        assert_eq!(
            result.text_content(),
            "Error calling delete_everything: unknown tool: delete_everything"
        );
    }

    #[tokio::test]
    async fn non_string_query_is_rejected() {
        let result = offline_router()
            .call("search_deployment", &args(json!({"query": 42})))
            .await;
        assert_eq!(result.text_content(), "Error: query is required");
    }

    #[tokio::test]
    async fn empty_query_reaches_the_api() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/org/acme/deployments/docs/search"))
            .and(body_json(json!({"queryString": ""})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .expect(1)
            .mount(&server)
            .await;

        let result = router(&server.uri(), Some("acme"), Some("docs"), "")
            .call("search_deployment", &args(json!({"query": ""})))
            .await;
        assert!(!result.is_error, "{}", result.text_content());

        let body: Value = serde_json::from_str(&result.text_content()).unwrap();
        assert_eq!(body["enhanced_search"]["total_results"], 0);
    }

    #[tokio::test]
    async fn generate_portal_urls_joins_paths() {
        let result = offline_router()
            .call("generate_portal_urls", &args(json!({"paths": ["/a", "b", 3]})))
            .await;
        assert!(!result.is_error);
        let body: Value = serde_json::from_str(&result.text_content()).unwrap();
        assert_eq!(body["base_url"], "https://help.example.com");
        assert_eq!(body["urls"][1]["portal_url"], "https://help.example.com/b");
        assert_eq!(body["urls"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn generate_portal_urls_requires_paths_and_base() {
        let result = offline_router().call("generate_portal_urls", &Map::new()).await;
        assert_eq!(result.text_content(), "Error: paths array is required");

        let result = router("http://127.0.0.1:9", None, None, "")
            .call("generate_portal_urls", &args(json!({"paths": ["/a"]})))
            .await;
        assert!(result.is_error);
        assert!(result.text_content().contains("portal base URL not configured"));
    }

    #[tokio::test]
    async fn test_portal_url_reports_unset_base() {
        let result = router("http://127.0.0.1:9", None, None, "")
            .call("test_portal_url", &Map::new())
            .await;
        let body: Value = serde_json::from_str(&result.text_content()).unwrap();
        assert_eq!(body["portal_base_url"], "NOT SET");
        assert_eq!(body["generated_urls"], json!([]));
    }

    #[tokio::test]
    async fn search_is_enriched() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/org/acme/deployments/docs/search"))
            .and(body_json(json!({"queryString": "webhooks"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {"title": "Webhooks", "path": "/guides/webhooks", "content": "Webhooks notify you."}
                ]
            })))
            .mount(&server)
            .await;

        let result = router(&server.uri(), Some("acme"), Some("docs"), "https://help.example.com")
            .call("search_deployment", &args(json!({"query": "webhooks"})))
            .await;
        assert!(!result.is_error);

        let body: Value = serde_json::from_str(&result.text_content()).unwrap();
        assert_eq!(body["results"][0]["portal_url"], "https://help.example.com/guides/webhooks");
        assert_eq!(body["enhanced_search"]["categories"], json!({"guides": 1}));
        assert_eq!(body["quick_links"][0]["title"], "Webhooks");
    }

    #[tokio::test]
    async fn explicit_ids_override_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/org/other/deployments/beta/html-strings"))
            .and(query_param("locale", "en"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"k": "v"})))
            .mount(&server)
            .await;

        let result = router(&server.uri(), Some("acme"), Some("docs"), "")
            .call(
                "get_html_strings",
                &args(json!({"organization_id": "other", "deployment_id": "beta"})),
            )
            .await;
        assert!(!result.is_error);
        let body: Value = serde_json::from_str(&result.text_content()).unwrap();
        assert_eq!(body, json!({"k": "v"}));
    }

    #[tokio::test]
    async fn content_gets_structure_and_parent_topic() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/org/acme/deployments/docs/content"))
            .and(query_param("for-path", "/guides/setup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "title": "Setup",
                "path": "/guides/setup",
                "content": "# Setup\n- Install it"
            })))
            .mount(&server)
            .await;

        let result = router(&server.uri(), Some("acme"), Some("docs"), "https://help.example.com")
            .call("get_content", &args(json!({"for_path": "/guides/setup"})))
            .await;
        let body: Value = serde_json::from_str(&result.text_content()).unwrap();
        assert_eq!(body["key_facts"], json!(["Install it"]));
        assert_eq!(body["related_suggestions"]["parent_topic"], "/guides");
        assert_eq!(body["direct_link"]["url"], "https://help.example.com/guides/setup");
    }

    #[tokio::test]
    async fn api_errors_include_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let result = router(&server.uri(), Some("acme"), Some("docs"), "")
            .call("get_deployment_structure", &Map::new())
            .await;
        assert!(result.is_error);
        assert_eq!(
            result.text_content(),
            "Error calling get_deployment_structure: API returned HTTP 403: forbidden\n\
             Status code: 403\nResponse: forbidden"
        );
    }

    #[tokio::test]
    async fn open_api_spec_is_returned_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/org/acme/deployments/docs/api-specification/main"))
            .respond_with(ResponseTemplate::new(200).set_body_string("openapi: 3.1.0"))
            .mount(&server)
            .await;

        let result = router(&server.uri(), Some("acme"), Some("docs"), "")
            .call("get_open_api_spec", &args(json!({"specification_id": "main"})))
            .await;
        assert_eq!(result.text_content(), "openapi: 3.1.0");
    }
}
