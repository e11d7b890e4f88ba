//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Result, eyre};
use docbridge_core::PortalUrls;
use docbridge_mcp::{DEPLOYMENT_ENV, ORG_ENV, PORTAL_ENV, ToolRouter, serve_stdio};
use docbridge_shared::{
    AppConfig, BridgeConfig, ConfigOverrides, config_file_path, init_config, load_config,
    load_config_from,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Map, Value, json};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// docbridge: documentation Deploy API tools for AI assistants.
#[derive(Parser)]
#[command(
    name = "docbridge",
    version,
    about = "Expose a documentation Deploy API as enriched, assistant-friendly tools.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.docbridge/docbridge.toml.
    #[arg(long = "config", global = true)]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Connection settings that override the config file.
#[derive(Args, Debug, Default)]
pub(crate) struct ConnectionArgs {
    /// Deploy API base URL.
    #[arg(long, env = "DOCBRIDGE_API_BASE_URL", global = true)]
    pub api_base_url: Option<String>,

    /// Deploy token (defaults to the env var named by `api.token_env`).
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Default organization id.
    #[arg(long = "org", env = ORG_ENV, global = true)]
    pub organization_id: Option<String>,

    /// Default deployment id.
    #[arg(long = "deployment", env = DEPLOYMENT_ENV, global = true)]
    pub deployment_id: Option<String>,

    /// Public documentation portal base URL.
    #[arg(long, env = PORTAL_ENV, global = true)]
    pub portal_base_url: Option<String>,
}

impl ConnectionArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            api_base_url: self.api_base_url.clone(),
            token: self.token.clone(),
            organization_id: self.organization_id.clone(),
            deployment_id: self.deployment_id.clone(),
            portal_base_url: self.portal_base_url.clone(),
        }
    }
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the tool server on stdio.
    Serve,

    /// Run one enriched search and print the result as JSON.
    Search {
        /// Search query.
        query: String,
    },

    /// Fetch one document with key facts and sections.
    Content {
        /// Document path.
        #[arg(long, required_unless_present = "id", conflicts_with = "id")]
        path: Option<String>,

        /// Document id.
        #[arg(long)]
        id: Option<String>,
    },

    /// Print portal URLs for document paths.
    Urls {
        /// Document paths.
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Print client configuration snippets for the tool server.
    McpConfig {
        /// Target client.
        #[arg(long, value_enum, default_value = "vscode")]
        target: McpTarget,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Assistant clients we can emit configuration for.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum McpTarget {
    Vscode,
    ClaudeDesktop,
    Cursor,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Output goes to stderr so stdout
/// stays free for protocol traffic and JSON results.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "docbridge=info",
        1 => "docbridge=debug",
        _ => "docbridge=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Serve => cmd_serve(&resolve(&cli)?).await,
        Command::Search { ref query } => cmd_search(&resolve(&cli)?, query).await,
        Command::Content { ref path, ref id } => {
            cmd_content(&resolve(&cli)?, path.as_deref(), id.as_deref()).await
        }
        Command::Urls { ref paths } => cmd_urls(&resolve(&cli)?, paths),
        Command::McpConfig { target } => cmd_mcp_config(target, &cli.connection),
        Command::Config { ref action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&cli),
        },
    }
}

fn file_config(cli: &Cli) -> Result<AppConfig> {
    let config = match &cli.config_file {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

/// File config merged with flags and environment.
fn resolve(cli: &Cli) -> Result<BridgeConfig> {
    Ok(BridgeConfig::resolve(
        &file_config(cli)?,
        &cli.connection.overrides(),
    )?)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_serve(config: &BridgeConfig) -> Result<()> {
    if let Some(org) = &config.default_organization_id {
        info!(%org, "default organization");
    }
    if let Some(deployment) = &config.default_deployment_id {
        info!(%deployment, "default deployment");
    }
    if !config.portal_base_url.is_empty() {
        info!(portal = %config.portal_base_url, "portal base URL");
    }

    let router = ToolRouter::new(config)?;
    serve_stdio(router).await?;
    Ok(())
}

async fn cmd_search(config: &BridgeConfig, query: &str) -> Result<()> {
    let mut args = Map::new();
    args.insert("query".into(), Value::String(query.to_string()));
    run_tool(config, "search_deployment", args, format!("Searching for '{query}'...")).await
}

async fn cmd_content(config: &BridgeConfig, path: Option<&str>, id: Option<&str>) -> Result<()> {
    let mut args = Map::new();
    if let Some(path) = path {
        args.insert("for_path".into(), Value::String(path.to_string()));
    }
    if let Some(id) = id {
        args.insert("for_id".into(), Value::String(id.to_string()));
    }
    run_tool(config, "get_content", args, "Fetching document...".to_string()).await
}

/// Run a tool once with a spinner and print its text output.
async fn run_tool(
    config: &BridgeConfig,
    tool: &str,
    args: Map<String, Value>,
    message: String,
) -> Result<()> {
    let router = ToolRouter::new(config)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")?
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(80));

    let result = router.call(tool, &args).await;
    spinner.finish_and_clear();

    let text = result.text_content();
    if result.is_error {
        return Err(eyre!(text));
    }
    println!("{text}");
    Ok(())
}

fn cmd_urls(config: &BridgeConfig, paths: &[String]) -> Result<()> {
    let portal = PortalUrls::new(config.portal_base_url.as_str());
    if !portal.is_configured() {
        return Err(eyre!(
            "portal base URL not configured: pass --portal-base-url or set {PORTAL_ENV}"
        ));
    }

    let paths: Vec<Value> = paths.iter().cloned().map(Value::String).collect();
    println!("{}", serde_json::to_string_pretty(&portal.generate(&paths))?);
    Ok(())
}

fn cmd_mcp_config(target: McpTarget, connection: &ConnectionArgs) -> Result<()> {
    let binary = std::env::current_exe()
        .map(|path| path.to_string_lossy().to_string())
        .unwrap_or_else(|_| "docbridge".to_string());

    let (header, config) = mcp_client_config(target, &binary, connection);
    println!("{header}");
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// Snippet header and JSON for a client's server configuration.
fn mcp_client_config(
    target: McpTarget,
    binary: &str,
    connection: &ConnectionArgs,
) -> (&'static str, Value) {
    let placeholder = |value: &Option<String>, hint: &str| {
        value.clone().unwrap_or_else(|| format!("<{hint}>"))
    };
    let env = json!({
        "DOCBRIDGE_DEPLOY_TOKEN": "<deploy token>",
        ORG_ENV: placeholder(&connection.organization_id, "organization id"),
        DEPLOYMENT_ENV: placeholder(&connection.deployment_id, "deployment id"),
        PORTAL_ENV: placeholder(&connection.portal_base_url, "portal base URL"),
    });

    match target {
        McpTarget::Vscode => (
            "// .vscode/mcp.json",
            json!({
                "servers": {
                    "docbridge": {
                        "type": "stdio",
                        "command": binary,
                        "args": ["serve"],
                        "env": env,
                    }
                }
            }),
        ),
        McpTarget::ClaudeDesktop => (
            "// claude_desktop_config.json",
            json!({
                "mcpServers": {
                    "docbridge": {
                        "command": binary,
                        "args": ["serve"],
                        "env": env,
                    }
                }
            }),
        ),
        McpTarget::Cursor => (
            "// Cursor MCP settings",
            json!({
                "mcpServers": {
                    "docbridge": {
                        "command": binary,
                        "args": ["serve"],
                        "env": env,
                    }
                }
            }),
        ),
    }
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(cli: &Cli) -> Result<()> {
    let path = match &cli.config_file {
        Some(path) => path.clone(),
        None => config_file_path()?,
    };
    let config = file_config(cli)?;
    println!("# {}", path.display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
