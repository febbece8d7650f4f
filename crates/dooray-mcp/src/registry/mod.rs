// Capability Registry Module
//
// Holds the fixed, ordered catalogue of capabilities enabled for this process:
// - construction-time checks (unique names, well-formed input schemas)
// - category filtering
// - dispatch by name, with the outer boundary that turns every outcome into data

mod boundary;
mod error;

pub use boundary::ToolResponse;
pub use error::RegistryError;

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use rmcp::model::Tool;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::args::Arguments;
use crate::category::Category;
use crate::error::DomainError;

/// Async function backing a capability
pub type CapabilityHandler =
	Arc<dyn Fn(Arguments) -> BoxFuture<'static, Result<Value, DomainError>> + Send + Sync>;

/// Wrap an async closure as a [`CapabilityHandler`].
pub fn handler<F, Fut>(f: F) -> CapabilityHandler
where
	F: Fn(Arguments) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = Result<Value, DomainError>> + Send + 'static,
{
	Arc::new(move |args| f(args).boxed())
}

/// Name, documentation and input schema of a capability
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityDescriptor {
	pub name: String,
	pub description: String,
	/// JSON Schema of the argument object
	pub input_schema: Value,
	pub category: Category,
}

impl CapabilityDescriptor {
	/// MCP tool definition for `tools/list`
	pub fn to_tool(&self) -> Tool {
		let schema = match &self.input_schema {
			Value::Object(map) => map.clone(),
			_ => Map::new(),
		};
		Tool::new(self.name.clone(), self.description.clone(), Arc::new(schema))
	}
}

/// A registry entry: descriptor plus handler
#[derive(Clone)]
pub struct Capability {
	pub descriptor: CapabilityDescriptor,
	pub handler: CapabilityHandler,
}

impl fmt::Debug for Capability {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Capability")
			.field("descriptor", &self.descriptor)
			.finish_non_exhaustive()
	}
}

impl Capability {
	pub fn new(
		category: Category,
		name: impl Into<String>,
		description: impl Into<String>,
		input_schema: Value,
		handler: CapabilityHandler,
	) -> Self {
		Self {
			descriptor: CapabilityDescriptor {
				name: name.into(),
				description: description.into(),
				input_schema,
				category,
			},
			handler,
		}
	}

	pub fn name(&self) -> &str {
		&self.descriptor.name
	}

	pub fn category(&self) -> Category {
		self.descriptor.category
	}
}

/// Immutable name to capability map, in declaration order
#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
	entries: IndexMap<String, Capability>,
}

impl CapabilityRegistry {
	/// Keep the capabilities of `catalogue` whose category is enabled.
	///
	/// Names must be unique and schemas well formed across the whole catalogue,
	/// including entries that end up filtered out.
	pub fn build(
		catalogue: Vec<Capability>,
		enabled: &BTreeSet<Category>,
	) -> Result<Self, RegistryError> {
		let total = catalogue.len();
		let mut seen = HashSet::with_capacity(total);
		let mut entries = IndexMap::new();

		for capability in catalogue {
			if !seen.insert(capability.descriptor.name.clone()) {
				return Err(RegistryError::DuplicateCapability(
					capability.descriptor.name.clone(),
				));
			}
			validate_schema(&capability.descriptor)?;

			if enabled.contains(&capability.category()) {
				entries.insert(capability.descriptor.name.clone(), capability);
			} else {
				debug!(
					target: "dooray::registry",
					capability = %capability.name(),
					category = %capability.category(),
					"capability disabled by category filter"
				);
			}
		}

		info!(
			target: "dooray::registry",
			registered = entries.len(),
			declared = total,
			"capability registry built"
		);
		Ok(Self { entries })
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn get(&self, name: &str) -> Option<&Capability> {
		self.entries.get(name)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.entries.contains_key(name)
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.entries.keys().map(String::as_str)
	}

	pub fn descriptors(&self) -> impl Iterator<Item = &CapabilityDescriptor> {
		self.entries.values().map(|c| &c.descriptor)
	}

	pub fn tools(&self) -> Vec<Tool> {
		self.descriptors().map(CapabilityDescriptor::to_tool).collect()
	}

	/// Categories that have at least one registered capability
	pub fn categories(&self) -> BTreeSet<Category> {
		self.entries.values().map(Capability::category).collect()
	}

	/// Run the handler registered under `name`.
	///
	/// The handler's result is returned as is. Unknown names and non-object
	/// arguments are rejected without running anything.
	pub async fn dispatch(&self, name: &str, arguments: Value) -> Result<Value, DomainError> {
		let Some(capability) = self.entries.get(name) else {
			return Err(
				DomainError::validation(format!("unknown capability '{name}'"))
					.with_code("UNKNOWN_CAPABILITY"),
			);
		};
		let args = Arguments::from_value(arguments)?;
		(capability.handler)(args).await
	}

	/// Dispatch and convert every outcome, panics included, into a [`ToolResponse`].
	pub async fn call(&self, name: &str, arguments: Value) -> ToolResponse {
		debug!(target: "dooray::registry", capability = %name, "capability call");

		let result = match AssertUnwindSafe(self.dispatch(name, arguments))
			.catch_unwind()
			.await
		{
			Ok(result) => result,
			Err(panic) => Err(
				DomainError::internal(format!(
					"capability '{name}' failed unexpectedly: {}",
					panic_message(panic.as_ref())
				))
				.with_code("HANDLER_PANIC"),
			),
		};

		match &result {
			Ok(_) => info!(target: "dooray::registry", capability = %name, "capability succeeded"),
			Err(err) => warn!(
				target: "dooray::registry",
				capability = %name,
				kind = %err.kind(),
				code = err.code().unwrap_or_default(),
				error = %err.message(),
				"capability failed"
			),
		}
		ToolResponse::from(result)
	}
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
	if let Some(s) = panic.downcast_ref::<&'static str>() {
		s
	} else if let Some(s) = panic.downcast_ref::<String>() {
		s.as_str()
	} else {
		"unknown panic"
	}
}

fn validate_schema(descriptor: &CapabilityDescriptor) -> Result<(), RegistryError> {
	let name = &descriptor.name;
	let Value::Object(schema) = &descriptor.input_schema else {
		return Err(RegistryError::invalid_schema(name, "schema must be a JSON object"));
	};
	if schema.get("type").and_then(Value::as_str) != Some("object") {
		return Err(RegistryError::invalid_schema(name, "schema type must be \"object\""));
	}
	let Some(Value::Object(properties)) = schema.get("properties") else {
		return Err(RegistryError::invalid_schema(name, "\"properties\" must be an object"));
	};
	match schema.get("required") {
		None => Ok(()),
		Some(Value::Array(required)) => {
			for entry in required {
				match entry.as_str() {
					Some(field) if properties.contains_key(field) => {},
					Some(field) => {
						return Err(RegistryError::invalid_schema(
							name,
							format!("required field '{field}' is not a declared property"),
						));
					},
					None => {
						return Err(RegistryError::invalid_schema(
							name,
							"\"required\" entries must be strings",
						));
					},
				}
			}
			Ok(())
		},
		Some(_) => Err(RegistryError::invalid_schema(name, "\"required\" must be an array")),
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};

	use assert_matches::assert_matches;
	use serde_json::json;

	use super::*;
	use crate::error::ErrorKind;

	fn empty_schema() -> Value {
		json!({"type": "object", "properties": {}})
	}

	fn echo(category: Category, name: &str) -> Capability {
		let label = name.to_string();
		Capability::new(
			category,
			name,
			"echoes its arguments",
			empty_schema(),
			handler(move |args: Arguments| {
				let label = label.clone();
				async move { Ok(json!({"capability": label, "empty": args.is_empty()})) }
			}),
		)
	}

	fn catalogue() -> Vec<Capability> {
		vec![
			echo(Category::Wiki, "wiki_a"),
			echo(Category::Project, "project_a"),
			echo(Category::Wiki, "wiki_b"),
			echo(Category::Drive, "drive_a"),
		]
	}

	async fn explode(_: Arguments) -> Result<Value, DomainError> {
		panic!("handler exploded")
	}

	#[test]
	fn test_build_keeps_declaration_order() {
		let registry = CapabilityRegistry::build(catalogue(), &Category::all()).unwrap();
		let names: Vec<_> = registry.names().collect();
		assert_eq!(names, vec!["wiki_a", "project_a", "wiki_b", "drive_a"]);
	}

	#[test]
	fn test_build_filters_by_category() {
		let enabled = BTreeSet::from([Category::Wiki]);
		let registry = CapabilityRegistry::build(catalogue(), &enabled).unwrap();
		let names: Vec<_> = registry.names().collect();
		assert_eq!(names, vec!["wiki_a", "wiki_b"]);
		assert_eq!(registry.categories(), enabled);
		assert!(!registry.contains("project_a"));
	}

	#[test]
	fn test_duplicate_rejected_even_when_filtered_out() {
		let mut capabilities = catalogue();
		capabilities.push(echo(Category::Calendar, "drive_a"));
		let err = CapabilityRegistry::build(capabilities, &BTreeSet::from([Category::Wiki]))
			.unwrap_err();
		assert_eq!(err, RegistryError::DuplicateCapability("drive_a".into()));

		let domain: DomainError = err.into();
		assert_eq!(domain.kind(), ErrorKind::InternalError);
		assert_eq!(domain.code(), Some("DUPLICATE_CAPABILITY"));
	}

	#[test]
	fn test_schema_validation() {
		let with_schema = |schema: Value| {
			let mut capability = echo(Category::Wiki, "bad");
			capability.descriptor.input_schema = schema;
			CapabilityRegistry::build(vec![capability], &Category::all())
		};

		assert_matches!(
			with_schema(json!("object")),
			Err(RegistryError::InvalidSchema { .. })
		);
		assert_matches!(
			with_schema(json!({"type": "array", "properties": {}})),
			Err(RegistryError::InvalidSchema { .. })
		);
		assert_matches!(
			with_schema(json!({"type": "object"})),
			Err(RegistryError::InvalidSchema { .. })
		);
		assert_matches!(
			with_schema(json!({"type": "object", "properties": {"a": {}}, "required": ["b"]})),
			Err(RegistryError::InvalidSchema { message, .. }) if message.contains("'b'")
		);
		assert!(
			with_schema(json!({"type": "object", "properties": {"a": {}}, "required": ["a"]})).is_ok()
		);
	}

	#[tokio::test]
	async fn test_dispatch_returns_handler_result() {
		let registry = CapabilityRegistry::build(catalogue(), &Category::all()).unwrap();
		let value = registry.dispatch("wiki_b", json!({"x": 1})).await.unwrap();
		assert_eq!(value, json!({"capability": "wiki_b", "empty": false}));

		let value = registry.dispatch("wiki_b", Value::Null).await.unwrap();
		assert_eq!(value["empty"], true);
	}

	#[tokio::test]
	async fn test_unknown_capability_runs_nothing() {
		let calls = Arc::new(AtomicUsize::new(0));
		let counter = calls.clone();
		let counted = Capability::new(
			Category::Project,
			"counted",
			"counts calls",
			empty_schema(),
			handler(move |_| {
				counter.fetch_add(1, Ordering::SeqCst);
				async { Ok(Value::Null) }
			}),
		);
		let registry =
			CapabilityRegistry::build(vec![counted], &BTreeSet::from([Category::Wiki])).unwrap();

		for name in ["counted", "never_declared"] {
			let err = registry.dispatch(name, json!({})).await.unwrap_err();
			assert_eq!(err.kind(), ErrorKind::ValidationError);
			assert_eq!(err.code(), Some("UNKNOWN_CAPABILITY"));
		}
		assert_eq!(calls.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn test_non_object_arguments_rejected() {
		let registry = CapabilityRegistry::build(catalogue(), &Category::all()).unwrap();
		let err = registry.dispatch("wiki_a", json!("text")).await.unwrap_err();
		assert_eq!(err.code(), Some("INVALID_ARGUMENTS"));
	}

	#[tokio::test]
	async fn test_call_converts_errors_and_panics() {
		let mut capabilities = catalogue();
		capabilities.push(Capability::new(
			Category::Wiki,
			"explode",
			"panics",
			empty_schema(),
			handler(explode),
		));
		let registry = CapabilityRegistry::build(capabilities, &Category::all()).unwrap();

		let response = registry.call("explode", json!({})).await;
		assert_matches!(&response, ToolResponse::Failure(f) if f.error.kind == ErrorKind::InternalError);
		let value = response.into_value();
		assert!(value["content"].as_str().unwrap().contains("handler exploded"));

		let response = registry.call("missing", json!({})).await;
		assert_matches!(response, ToolResponse::Failure(f) if f.error.code.as_deref() == Some("UNKNOWN_CAPABILITY"));

		let response = registry.call("wiki_a", json!({})).await;
		assert_matches!(response, ToolResponse::Success(v) if v["capability"] == "wiki_a");
	}

	#[test]
	fn test_descriptor_to_tool() {
		let registry = CapabilityRegistry::build(catalogue(), &Category::all()).unwrap();
		let tools = registry.tools();
		assert_eq!(tools.len(), 4);
		assert_eq!(tools[0].name, "wiki_a");
		assert_eq!(tools[0].input_schema.get("type"), Some(&json!("object")));
	}
}
