// Dooray API client: connection pool, credentials and request construction

use std::fmt;
use std::sync::Arc;

use http::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use http::{Method, StatusCode};
use reqwest::RequestBuilder;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::envelope::{Page, RemoteEnvelope};
use super::invoker::RemoteInvoker;
use crate::config::{ClientConfig, ConfigError};
use crate::error::DomainError;

/// Shared handle to the Dooray API.
///
/// Cloning is cheap; all clones share one connection pool and one invoker.
#[derive(Debug, Clone)]
pub struct DoorayClient {
	inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
	http: reqwest::Client,
	base_url: Url,
	invoker: RemoteInvoker,
}

impl DoorayClient {
	pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
		config.validate()?;

		let mut auth = HeaderValue::from_str(&format!("dooray-api {}", config.api_key.expose_secret()))
			.map_err(|_| ConfigError::InvalidApiKey)?;
		auth.set_sensitive(true);
		let mut headers = HeaderMap::new();
		headers.insert(AUTHORIZATION, auth);

		let http = reqwest::Client::builder()
			.default_headers(headers)
			.timeout(config.request_timeout)
			.build()?;

		Ok(Self {
			inner: Arc::new(Inner {
				http,
				base_url: config.base_url.clone(),
				invoker: RemoteInvoker::new(),
			}),
		})
	}

	/// Build the URL for an endpoint from path segments.
	///
	/// Segments are percent-encoded individually, so identifiers supplied by the
	/// host cannot change the path structure.
	pub fn endpoint(&self, segments: &[&str]) -> Url {
		let mut url = self.inner.base_url.clone();
		if let Ok(mut path) = url.path_segments_mut() {
			path.pop_if_empty().extend(segments);
		}
		url
	}

	/// Start a request against `segments`, expecting `200 OK` by default.
	pub fn request(&self, method: Method, segments: &[&str]) -> RemoteCall<'_> {
		let url = self.endpoint(segments);
		let description = format!("{} {}", method, url.path());
		let builder = self.inner.http.request(method, url);
		RemoteCall {
			invoker: &self.inner.invoker,
			description,
			builder,
			expected: StatusCode::OK,
		}
	}

	pub fn get(&self, segments: &[&str]) -> RemoteCall<'_> {
		self.request(Method::GET, segments)
	}

	pub fn post(&self, segments: &[&str]) -> RemoteCall<'_> {
		self.request(Method::POST, segments)
	}

	pub fn put(&self, segments: &[&str]) -> RemoteCall<'_> {
		self.request(Method::PUT, segments)
	}

	pub fn delete(&self, segments: &[&str]) -> RemoteCall<'_> {
		self.request(Method::DELETE, segments)
	}
}

/// A single prepared remote call, executed through the shared `RemoteInvoker`
pub struct RemoteCall<'a> {
	invoker: &'a RemoteInvoker,
	description: String,
	builder: RequestBuilder,
	expected: StatusCode,
}

impl RemoteCall<'_> {
	/// Add a query parameter when a value is present.
	pub fn param(mut self, name: &str, value: Option<impl fmt::Display>) -> Self {
		if let Some(value) = value {
			self.builder = self.builder.query(&[(name, value.to_string())]);
		}
		self
	}

	/// Add a comma joined list parameter when the list is present and non-empty.
	pub fn list_param(self, name: &str, values: Option<&[String]>) -> Self {
		let joined = values.filter(|v| !v.is_empty()).map(|v| v.join(","));
		self.param(name, joined)
	}

	pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Self {
		self.builder = self.builder.json(body);
		self
	}

	/// Status treated as success (default `200 OK`)
	pub fn expect(mut self, status: StatusCode) -> Self {
		self.expected = status;
		self
	}

	pub fn description(&self) -> &str {
		&self.description
	}

	pub async fn invoke<T: DeserializeOwned>(self) -> Result<T, DomainError> {
		self
			.invoker
			.invoke(&self.description, self.expected, self.builder.send())
			.await
	}

	pub async fn invoke_page<T: DeserializeOwned>(self) -> Result<Page<T>, DomainError> {
		self
			.invoker
			.invoke_page(&self.description, self.expected, self.builder.send())
			.await
	}

	pub async fn invoke_nullable<T: DeserializeOwned>(
		self,
	) -> Result<RemoteEnvelope<Option<T>>, DomainError> {
		self
			.invoker
			.invoke_nullable(&self.description, self.expected, self.builder.send())
			.await
	}
}
