// Dooray MCP server binary
//
// Reads configuration from flags or the environment, builds the capability
// registry and serves it to the MCP host over stdio. Logs go to stderr.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use dooray_mcp::capabilities::catalogue;
use dooray_mcp::config::DEFAULT_BASE_URL;
use dooray_mcp::{
	CapabilityRegistry, ClientConfig, DoorayClient, McpServer, parse_duration, parse_with_report,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const INSTRUCTIONS: &str = "Tools for the Dooray collaboration suite: wiki pages, project tasks, \
	messenger channels, calendars and drive files. Every tool returns JSON; failures carry \
	isError together with an error kind and code.";

#[derive(Parser)]
#[command(name = "dooray-mcp", version, about = "Serve the Dooray API as MCP tools over stdio")]
struct Args {
	/// Dooray API base URL
	#[arg(long, env = "DOORAY_BASE_URL", default_value = DEFAULT_BASE_URL)]
	base_url: String,

	/// Personal API token
	#[arg(long, env = "DOORAY_API_KEY", hide_env_values = true)]
	api_key: String,

	/// Comma separated categories to expose (WIKI, PROJECT, MESSENGER, CALENDAR, DRIVE)
	#[arg(long, env = "DOORAY_ENABLED_CATEGORIES")]
	enabled_categories: Option<String>,

	/// Per-request timeout, e.g. 30s, 500ms, 2m
	#[arg(long, env = "DOORAY_REQUEST_TIMEOUT", default_value = "30s", value_parser = parse_duration)]
	request_timeout: Duration,

	#[arg(long, env = "DOORAY_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
	log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
	Text,
	Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();
	init_tracing(args.log_format);

	let config = ClientConfig::new(&args.base_url, args.api_key)
		.context("invalid Dooray configuration")?
		.with_request_timeout(args.request_timeout);
	let client = DoorayClient::new(&config).context("failed to create the Dooray client")?;

	let categories = parse_with_report(args.enabled_categories.as_deref());
	info!(
		target: "dooray::app",
		configured = args.enabled_categories.as_deref().unwrap_or("<all>"),
		enabled = ?categories.enabled,
		"category filter"
	);
	if !categories.rejected.is_empty() {
		warn!(target: "dooray::app", rejected = ?categories.rejected, "unknown categories ignored");
	}

	let registry = CapabilityRegistry::build(catalogue(&client), &categories.enabled)
		.context("invalid capability catalogue")?;
	info!(
		target: "dooray::app",
		base_url = %config.base_url,
		timeout = ?config.request_timeout,
		capabilities = registry.len(),
		"starting Dooray MCP server on stdio"
	);

	McpServer::new(Arc::new(registry))
		.with_instructions(INSTRUCTIONS)
		.serve_stdio()
		.await
		.context("stdio transport failed")?;

	info!(target: "dooray::app", "shutting down");
	Ok(())
}

fn init_tracing(format: LogFormat) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
	let builder = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(false);
	match format {
		LogFormat::Text => builder.init(),
		LogFormat::Json => builder.json().init(),
	}
}
