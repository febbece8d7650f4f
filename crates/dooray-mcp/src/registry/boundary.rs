// Outer boundary between capability handlers and the host
//
// Whatever a handler returns, the host receives data: either the success
// payload or the uniform failure envelope.

use rmcp::model::{CallToolResult, Content};
use serde_json::Value;

use crate::error::{DomainError, ErrorResponse};

/// Final outcome of a capability call as seen by the host
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResponse {
	Success(Value),
	Failure(ErrorResponse),
}

impl ToolResponse {
	pub fn is_error(&self) -> bool {
		matches!(self, ToolResponse::Failure(_))
	}

	/// JSON document handed to the host
	pub fn into_value(self) -> Value {
		match self {
			ToolResponse::Success(value) => value,
			ToolResponse::Failure(failure) => serde_json::to_value(&failure)
				.unwrap_or_else(|e| Value::String(format!("{}: {e}", failure.content))),
		}
	}

	/// Wrap the JSON document as the single text content of an MCP tool result.
	pub fn into_call_result(self) -> CallToolResult {
		let is_error = self.is_error();
		let content = vec![Content::text(self.into_value().to_string())];
		if is_error {
			CallToolResult::error(content)
		} else {
			CallToolResult::success(content)
		}
	}
}

impl From<Result<Value, DomainError>> for ToolResponse {
	fn from(result: Result<Value, DomainError>) -> Self {
		match result {
			Ok(value) => ToolResponse::Success(value),
			Err(err) => ToolResponse::Failure(err.to_response()),
		}
	}
}
