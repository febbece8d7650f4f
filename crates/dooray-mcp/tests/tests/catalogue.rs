// Shape of the shipped catalogue and construction-time checks

use std::collections::{BTreeSet, HashSet};

use assert_matches::assert_matches;
use dooray_mcp::capabilities::catalogue;
use dooray_mcp::{Category, CapabilityRegistry, RegistryError};
use wiremock::MockServer;

use crate::client_for;

#[tokio::test]
async fn test_catalogue_size_and_category_counts() {
	let server = MockServer::start().await;
	let capabilities = catalogue(&client_for(&server));
	assert_eq!(capabilities.len(), 49);

	let count = |category: Category| capabilities.iter().filter(|c| c.category() == category).count();
	assert_eq!(count(Category::Wiki), 5);
	assert_eq!(count(Category::Project), 11);
	assert_eq!(count(Category::Messenger), 12);
	assert_eq!(count(Category::Calendar), 5);
	assert_eq!(count(Category::Drive), 16);
}

#[tokio::test]
async fn test_catalogue_names_are_unique_and_prefixed() {
	let server = MockServer::start().await;
	let capabilities = catalogue(&client_for(&server));

	let mut seen = HashSet::new();
	for capability in &capabilities {
		let name = capability.name();
		assert!(seen.insert(name.to_string()), "duplicate {name}");

		let prefix = format!("dooray_{}_", capability.category().as_str().to_ascii_lowercase());
		assert!(name.starts_with(&prefix), "{name} should start with {prefix}");
	}
}

#[tokio::test]
async fn test_catalogue_schemas_are_well_formed() {
	let server = MockServer::start().await;
	for capability in catalogue(&client_for(&server)) {
		let schema = &capability.descriptor.input_schema;
		let name = capability.name();
		assert_eq!(schema["type"], "object", "{name}");

		let properties = schema["properties"].as_object().expect("properties");
		for required in schema["required"].as_array().expect("required list") {
			let required = required.as_str().expect("required entries are strings");
			assert!(properties.contains_key(required), "{name}: '{required}' is required but not declared");
		}
		for (property, definition) in properties {
			assert!(definition.get("type").is_some(), "{name}.{property} has no type");
		}
		assert!(!capability.descriptor.description.is_empty(), "{name} has no description");
	}
}

#[tokio::test]
async fn test_full_registry_exposes_every_capability_as_a_tool() {
	let server = MockServer::start().await;
	let registry = CapabilityRegistry::build(catalogue(&client_for(&server)), &Category::all()).unwrap();

	assert_eq!(registry.len(), 49);
	assert_eq!(registry.categories(), Category::all());

	let tools = registry.tools();
	let tool_names: Vec<&str> = tools.iter().map(|t| &*t.name).collect();
	let registry_names: Vec<&str> = registry.names().collect();
	assert_eq!(tool_names, registry_names);
	assert_eq!(tool_names.first(), Some(&"dooray_wiki_list_projects"));
	assert_eq!(tool_names.last(), Some(&"dooray_drive_delete_shared_link"));
}

#[tokio::test]
async fn test_duplicate_name_is_rejected_even_when_filtered_out() {
	let server = MockServer::start().await;
	let mut capabilities = catalogue(&client_for(&server));
	let copy = capabilities
		.iter()
		.find(|c| c.name() == "dooray_drive_list")
		.cloned()
		.unwrap();
	capabilities.push(copy);

	let enabled = BTreeSet::from([Category::Wiki]);
	let err = CapabilityRegistry::build(capabilities, &enabled).unwrap_err();
	assert_matches!(err, RegistryError::DuplicateCapability(name) if name == "dooray_drive_list");
}
