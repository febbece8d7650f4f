// Remote API connection settings

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.dooray.com";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors raised while validating startup configuration
#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("invalid base URL '{url}': {message}")]
	InvalidBaseUrl { url: String, message: String },

	#[error("API key must not be empty")]
	EmptyApiKey,

	#[error("API key contains characters not allowed in an HTTP header")]
	InvalidApiKey,

	#[error("invalid duration: {0}")]
	InvalidDuration(String),

	#[error("failed to build HTTP client: {0}")]
	HttpClient(#[from] reqwest::Error),
}

/// Settings needed to reach the Dooray API
#[derive(Debug, Clone)]
pub struct ClientConfig {
	pub base_url: Url,
	pub api_key: SecretString,
	/// Applied to each request as a whole (connect + response)
	pub request_timeout: Duration,
}

impl ClientConfig {
	pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, ConfigError> {
		let config = Self {
			base_url: parse_base_url(base_url)?,
			api_key: SecretString::from(api_key.into()),
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
		};
		config.validate()?;
		Ok(config)
	}

	pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = timeout;
		self
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		let key = self.api_key.expose_secret();
		if key.trim().is_empty() {
			return Err(ConfigError::EmptyApiKey);
		}
		if key.chars().any(|c| c.is_control()) {
			return Err(ConfigError::InvalidApiKey);
		}
		Ok(())
	}
}

/// Parse and check the API base URL. Only http and https are accepted.
pub fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
	let invalid = |message: String| ConfigError::InvalidBaseUrl {
		url: raw.to_string(),
		message,
	};
	let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
	match url.scheme() {
		"http" | "https" => Ok(url),
		other => Err(invalid(format!("unsupported scheme '{other}'"))),
	}
}

/// Parse a duration string like "500ms", "30s", "5m", "1h" or "2d".
///
/// A bare number is read as seconds.
pub fn parse_duration(s: &str) -> Result<Duration, ConfigError> {
	let s = s.trim();
	if s.is_empty() {
		return Err(ConfigError::InvalidDuration("empty duration string".into()));
	}

	let (num_str, unit) = if let Some(n) = s.strip_suffix("ms") {
		(n, "ms")
	} else if let Some(n) = s.strip_suffix('s') {
		(n, "s")
	} else if let Some(n) = s.strip_suffix('m') {
		(n, "m")
	} else if let Some(n) = s.strip_suffix('h') {
		(n, "h")
	} else if let Some(n) = s.strip_suffix('d') {
		(n, "d")
	} else {
		(s, "s")
	};

	let num: u64 = num_str
		.parse()
		.map_err(|_| ConfigError::InvalidDuration(format!("invalid duration number: {num_str}")))?;

	let seconds_per_unit: u64 = match unit {
		"ms" => return Ok(Duration::from_millis(num)),
		"s" => 1,
		"m" => 60,
		"h" => 60 * 60,
		_ => 60 * 60 * 24,
	};
	let secs = num
		.checked_mul(seconds_per_unit)
		.ok_or_else(|| ConfigError::InvalidDuration(format!("duration out of range: {s}")))?;

	Ok(Duration::from_secs(secs))
}
