// Shared failure vocabulary for capability calls
//
// Every failure, whether raised by local argument validation, by the remote
// invoker or by an unexpected condition, is described by a `DomainError`. The
// outer boundary turns it into an `ErrorResponse` for the host.

use std::error::Error as StdError;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Classification of a failed capability call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
	/// A required argument was absent; no network call was made
	ParameterMissing,
	/// An argument was present but invalid; no network call was made
	ValidationError,
	/// The remote API rejected the call
	ApiError,
	/// Decode failure, transport failure or a programming error
	InternalError,
}

impl ErrorKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			ErrorKind::ParameterMissing => "PARAMETER_MISSING",
			ErrorKind::ValidationError => "VALIDATION_ERROR",
			ErrorKind::ApiError => "API_ERROR",
			ErrorKind::InternalError => "INTERNAL_ERROR",
		}
	}
}

impl fmt::Display for ErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Structured failure returned (never thrown) by every layer
#[derive(Error, Debug)]
#[error("{kind}: {message}")]
pub struct DomainError {
	kind: ErrorKind,
	message: String,
	code: Option<String>,
	details: Option<String>,
	#[source]
	cause: Option<BoxError>,
}

impl DomainError {
	pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
		Self {
			kind,
			message: message.into(),
			code: None,
			details: None,
			cause: None,
		}
	}

	/// A required argument was not supplied.
	///
	/// The code is derived from the parameter name, e.g. `project_id` becomes
	/// `MISSING_PROJECT_ID`.
	pub fn parameter_missing(param: &str) -> Self {
		Self::new(
			ErrorKind::ParameterMissing,
			format!("the '{param}' parameter is required"),
		)
		.with_code(format!("MISSING_{}", param.to_ascii_uppercase()))
	}

	pub fn validation(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::ValidationError, message)
	}

	pub fn api(message: impl Into<String>, code: impl Into<String>) -> Self {
		Self::new(ErrorKind::ApiError, message).with_code(code)
	}

	pub fn internal(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::InternalError, message)
	}

	pub fn with_code(mut self, code: impl Into<String>) -> Self {
		self.code = Some(code.into());
		self
	}

	pub fn with_details(mut self, details: impl Into<String>) -> Self {
		self.details = Some(details.into());
		self
	}

	pub fn with_cause<E>(mut self, cause: E) -> Self
	where
		E: StdError + Send + Sync + 'static,
	{
		self.cause = Some(Box::new(cause));
		self
	}

	pub fn kind(&self) -> ErrorKind {
		self.kind
	}

	pub fn message(&self) -> &str {
		&self.message
	}

	pub fn code(&self) -> Option<&str> {
		self.code.as_deref()
	}

	pub fn details(&self) -> Option<&str> {
		self.details.as_deref()
	}

	pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
		self.cause.as_deref()
	}

	/// Convert into the uniform failure envelope handed to the host.
	///
	/// When no explicit details were attached, the underlying cause (if any) is
	/// rendered into `details` so the host still sees what went wrong.
	pub fn to_response(&self) -> ErrorResponse {
		let details = self
			.details
			.clone()
			.or_else(|| self.cause.as_ref().map(|c| render_chain(c.as_ref())));
		ErrorResponse {
			is_error: true,
			error: ErrorBody {
				kind: self.kind,
				code: self.code.clone(),
				details,
			},
			content: self.message.clone(),
		}
	}
}

fn render_chain(err: &(dyn StdError + 'static)) -> String {
	let mut out = err.to_string();
	let mut source = err.source();
	while let Some(inner) = source {
		out.push_str(": ");
		out.push_str(&inner.to_string());
		source = inner.source();
	}
	out
}

/// Failure envelope returned to the host in place of a success payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
	pub is_error: bool,
	pub error: ErrorBody,
	/// Human readable description of the failure
	pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
	pub kind: ErrorKind,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub code: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub details: Option<String>,
}

impl From<DomainError> for ErrorResponse {
	fn from(err: DomainError) -> Self {
		err.to_response()
	}
}
