// Generic remote invocation engine
//
// Every capability handler funnels its network call through `RemoteInvoker`,
// which executes the call once and classifies the outcome:
// - expected status: decode the body into the requested shape
// - other status: API error carrying the remote `resultMessage` (or the raw body)
// - anything else (connect/timeout/body read): internal error wrapping the cause

use std::future::Future;

use http::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use super::envelope::{ErrorEnvelope, Page, RemoteEnvelope};
use crate::error::DomainError;

const DEFAULT_LOG_PREVIEW: usize = 256;

/// Executes remote operations and maps their outcome onto `DomainError`
#[derive(Debug, Clone)]
pub struct RemoteInvoker {
	/// Maximum number of characters of a body echoed into log lines
	log_preview: usize,
}

impl Default for RemoteInvoker {
	fn default() -> Self {
		Self::new()
	}
}

impl RemoteInvoker {
	pub fn new() -> Self {
		Self {
			log_preview: DEFAULT_LOG_PREVIEW,
		}
	}

	pub fn with_log_preview(mut self, chars: usize) -> Self {
		self.log_preview = chars;
		self
	}

	/// Run `operation` once and decode the body into `T` when the status matches.
	///
	/// `T` may itself be optional or an envelope; the nullable and non-nullable
	/// call shapes are both expressed through this one function.
	pub async fn execute<T, F>(
		&self,
		description: &str,
		expected: StatusCode,
		operation: F,
	) -> Result<T, DomainError>
	where
		T: DeserializeOwned,
		F: Future<Output = Result<reqwest::Response, reqwest::Error>>,
	{
		info!(target: "dooray::remote", operation = %description, "api request");

		let response = match operation.await {
			Ok(response) => response,
			Err(e) => return Err(self.transport_failure(description, e)),
		};
		let status = response.status();
		let body = match response.bytes().await {
			Ok(body) => body,
			Err(e) => return Err(self.transport_failure(description, e)),
		};

		if status != expected {
			let text = String::from_utf8_lossy(&body).into_owned();
			return Err(self.status_failure(description, status, text));
		}

		info!(target: "dooray::remote", operation = %description, status = status.as_u16(), "api response");
		serde_json::from_slice::<T>(&body).map_err(|e| {
			let raw = String::from_utf8_lossy(&body).into_owned();
			warn!(
				target: "dooray::remote",
				operation = %description,
				error = %e,
				body = %self.preview(&raw),
				"failed to decode api response"
			);
			DomainError::internal(format!("failed to decode response of {description}: {e}"))
				.with_details(raw)
				.with_cause(e)
		})
	}

	/// Decode a standard envelope and return its payload.
	///
	/// A 2xx envelope flagged `isSuccessful: false` is reported as an API error.
	pub async fn invoke<T, F>(
		&self,
		description: &str,
		expected: StatusCode,
		operation: F,
	) -> Result<T, DomainError>
	where
		T: DeserializeOwned,
		F: Future<Output = Result<reqwest::Response, reqwest::Error>>,
	{
		self
			.execute::<RemoteEnvelope<T>, F>(description, expected, operation)
			.await?
			.into_result()
	}

	/// Like [`invoke`](Self::invoke) for list endpoints, keeping `totalCount`.
	pub async fn invoke_page<T, F>(
		&self,
		description: &str,
		expected: StatusCode,
		operation: F,
	) -> Result<Page<T>, DomainError>
	where
		T: DeserializeOwned,
		F: Future<Output = Result<reqwest::Response, reqwest::Error>>,
	{
		self
			.execute::<RemoteEnvelope<Vec<T>>, F>(description, expected, operation)
			.await?
			.into_page()
	}

	/// Decode an envelope whose `result` may be absent.
	///
	/// The envelope's `isSuccessful` flag is left for the caller to inspect.
	pub async fn invoke_nullable<T, F>(
		&self,
		description: &str,
		expected: StatusCode,
		operation: F,
	) -> Result<RemoteEnvelope<Option<T>>, DomainError>
	where
		T: DeserializeOwned,
		F: Future<Output = Result<reqwest::Response, reqwest::Error>>,
	{
		let envelope = self
			.execute::<RemoteEnvelope<Option<T>>, F>(description, expected, operation)
			.await?;
		if !envelope.is_successful() {
			warn!(
				target: "dooray::remote",
				operation = %description,
				code = envelope.header.result_code,
				message = %envelope.header.result_message,
				"api reported failure"
			);
		}
		Ok(envelope)
	}

	fn status_failure(&self, description: &str, status: StatusCode, body: String) -> DomainError {
		let code = format!("HTTP_{}", status.as_u16());
		let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
			Ok(envelope) => envelope.header.result_message,
			Err(_) => body,
		};
		warn!(
			target: "dooray::remote",
			operation = %description,
			status = status.as_u16(),
			message = %self.preview(&message),
			"api error response"
		);
		DomainError::api(message, code)
	}

	fn transport_failure(&self, description: &str, err: reqwest::Error) -> DomainError {
		let kind = if err.is_timeout() {
			"timed out"
		} else if err.is_connect() {
			"connection failed"
		} else {
			"failed"
		};
		warn!(target: "dooray::remote", operation = %description, error = %err, "api request {kind}");
		DomainError::internal(format!("request {description} {kind}: {err}")).with_cause(err)
	}

	fn preview<'a>(&self, text: &'a str) -> &'a str {
		match text.char_indices().nth(self.log_preview) {
			Some((idx, _)) => &text[..idx],
			None => text,
		}
	}
}
