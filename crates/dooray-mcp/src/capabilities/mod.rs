// Shipped capability catalogue
//
// Each category module declares its capabilities in order; every handler is a
// thin mapping from `Arguments` onto one Dooray API call.

mod calendar;
mod drive;
mod messenger;
mod project;
mod wiki;

use std::future::Future;

use serde::Serialize;
use serde_json::{Value, json};

use crate::args::Arguments;
use crate::category::Category;
use crate::error::DomainError;
use crate::registry::{Capability, handler};
use crate::remote::{DoorayClient, RemoteEnvelope};

/// Every capability this server knows, in declaration order:
/// wiki, project, messenger, calendar, drive.
pub fn catalogue(client: &DoorayClient) -> Vec<Capability> {
	let mut capabilities = Vec::new();
	capabilities.extend(wiki::capabilities(client));
	capabilities.extend(project::capabilities(client));
	capabilities.extend(messenger::capabilities(client));
	capabilities.extend(calendar::capabilities(client));
	capabilities.extend(drive::capabilities(client));
	capabilities
}

/// Success payload returned by every shipped handler
#[derive(Debug, Clone, Serialize)]
pub struct ToolSuccess<T> {
	pub success: bool,
	pub data: T,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
}

pub(crate) fn success<T: Serialize>(data: T, message: impl Into<String>) -> Result<Value, DomainError> {
	let payload = ToolSuccess {
		success: true,
		data,
		message: Some(message.into()),
	};
	serde_json::to_value(payload).map_err(|e| {
		DomainError::internal(format!("failed to encode result: {e}")).with_cause(e)
	})
}

/// Turn a semantically failed nullable envelope into an API error.
pub(crate) fn ensure_successful<T>(envelope: RemoteEnvelope<Option<T>>) -> Result<Option<T>, DomainError> {
	if envelope.is_successful() {
		Ok(envelope.result)
	} else {
		Err(envelope.failure())
	}
}

/// Declare a capability whose handler gets its own clone of the client.
fn capability<F, Fut>(
	client: &DoorayClient,
	category: Category,
	name: &str,
	description: &str,
	input_schema: Value,
	f: F,
) -> Capability
where
	F: Fn(DoorayClient, Arguments) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = Result<Value, DomainError>> + Send + 'static,
{
	let client = client.clone();
	Capability::new(
		category,
		name,
		description,
		input_schema,
		handler(move |args| f(client.clone(), args)),
	)
}

// Schema helpers

fn object_schema(properties: Value, required: &[&str]) -> Value {
	json!({
		"type": "object",
		"properties": properties,
		"required": required,
	})
}

fn string(description: &str) -> Value {
	json!({"type": "string", "description": description})
}

fn integer(description: &str) -> Value {
	json!({"type": "integer", "minimum": 0, "description": description})
}

fn boolean(description: &str) -> Value {
	json!({"type": "boolean", "description": description})
}

fn string_list(description: &str) -> Value {
	json!({"type": "array", "items": {"type": "string"}, "description": description})
}

fn one_of(description: &str, values: &[&str]) -> Value {
	json!({"type": "string", "enum": values, "description": description})
}

fn page() -> Value {
	integer("Page number, starting at 0")
}

fn size(default: u32) -> Value {
	integer(&format!("Page size (default {default}, max 100)"))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::ClientConfig;

	#[test]
	fn test_success_payload_shape() {
		let value = success(vec![1, 2], "done").unwrap();
		assert_eq!(value, json!({"success": true, "data": [1, 2], "message": "done"}));
	}

	#[test]
	fn test_catalogue_is_ordered_by_category() {
		let client = DoorayClient::new(&ClientConfig::new("http://localhost", "k").unwrap()).unwrap();
		let categories: Vec<Category> = catalogue(&client).iter().map(Capability::category).collect();

		let mut sorted = categories.clone();
		sorted.sort();
		assert_eq!(categories, sorted);
		assert_eq!(categories.first(), Some(&Category::Wiki));
		assert_eq!(categories.last(), Some(&Category::Drive));
	}
}
