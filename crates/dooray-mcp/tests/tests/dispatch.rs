// Dispatch through the registry: category gating, local validation and remote
// outcomes as seen by the host

use std::collections::BTreeSet;

use assert_matches::assert_matches;
use dooray_mcp::capabilities::catalogue;
use dooray_mcp::{Category, CapabilityRegistry, ClientConfig, DoorayClient, ErrorKind, ToolResponse};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::{fixture, registry_for};

const POSTS: &str = include_str!("../fixtures/dooray/posts.json");

#[tokio::test]
async fn test_project_only_registry_end_to_end() -> anyhow::Result<()> {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/project/v1/projects/proj-1/posts"))
		.and(query_param("page", "0"))
		.and(query_param("size", "20"))
		.respond_with(ResponseTemplate::new(200).set_body_json(fixture(POSTS)))
		.expect(1)
		.mount(&server)
		.await;

	let registry = registry_for(&server, &[Category::Project]);

	// A wiki capability is simply not there.
	let response = registry
		.call("dooray_wiki_list_projects", json!({}))
		.await;
	assert_matches!(&response, ToolResponse::Failure(f) if f.error.code.as_deref() == Some("UNKNOWN_CAPABILITY"));

	// Missing required argument is caught before any request.
	let response = registry.call("dooray_project_list_posts", json!({})).await;
	let ToolResponse::Failure(failure) = response else {
		panic!("expected a failure");
	};
	assert!(failure.is_error);
	assert_eq!(failure.error.kind, ErrorKind::ParameterMissing);
	assert_eq!(failure.error.code.as_deref(), Some("MISSING_PROJECT_ID"));
	assert!(server.received_requests().await.unwrap_or_default().is_empty());

	// Valid call reaches the mocked API and comes back projected.
	let response = registry
		.call("dooray_project_list_posts", json!({"project_id": "proj-1"}))
		.await;
	let ToolResponse::Success(value) = response else {
		panic!("expected success, got {response:?}");
	};
	assert_eq!(value["success"], true);
	let posts = value["data"].as_array().expect("summaries");
	assert_eq!(posts.len(), 2);
	assert_eq!(posts[0]["taskNumber"], "OPS/41");
	assert_eq!(posts[0]["assignees"], json!([{"organizationMemberId": "m-2", "name": "Lee"}]));
	assert!(posts[0].get("body").is_none());
	assert!(value["message"].as_str().unwrap().contains("57 in total"));

	Ok(())
}

#[tokio::test]
async fn test_every_category_subset_gates_dispatch() {
	let server = MockServer::start().await;
	let gated = [
		(Category::Wiki, "dooray_wiki_get_page"),
		(Category::Project, "dooray_project_get_post"),
		(Category::Messenger, "dooray_messenger_get_channel"),
		(Category::Calendar, "dooray_calendar_detail"),
		(Category::Drive, "dooray_drive_get_detail"),
	];

	for mask in 0u32..(1 << Category::ALL.len()) {
		let enabled: Vec<Category> = Category::ALL
			.iter()
			.enumerate()
			.filter(|(bit, _)| mask & (1 << bit) != 0)
			.map(|(_, c)| *c)
			.collect();
		let registry = registry_for(&server, &enabled);

		assert!(registry.descriptors().all(|d| enabled.contains(&d.category)));
		assert_eq!(registry.categories(), enabled.iter().copied().collect::<BTreeSet<_>>());

		for (category, name) in gated {
			// No arguments: an enabled capability fails locally on a missing
			// parameter, a disabled one is unknown.
			let response = registry.call(name, json!({})).await;
			let ToolResponse::Failure(failure) = response else {
				panic!("{name} should fail without arguments");
			};
			if enabled.contains(&category) {
				assert_eq!(failure.error.kind, ErrorKind::ParameterMissing, "{name} with {enabled:?}");
			} else {
				assert_eq!(failure.error.code.as_deref(), Some("UNKNOWN_CAPABILITY"), "{name} with {enabled:?}");
			}
		}
	}

	assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_semantic_failure_on_ok_status() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/project/v1/projects/proj-1/posts/p-9"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"header": {"isSuccessful": false, "resultCode": -100, "resultMessage": "post not found"},
			"result": null
		})))
		.mount(&server)
		.await;

	let registry = registry_for(&server, &[Category::Project]);
	let response = registry
		.call("dooray_project_get_post", json!({"project_id": "proj-1", "post_id": "p-9"}))
		.await;
	let ToolResponse::Failure(failure) = response else {
		panic!("expected a failure");
	};
	assert_eq!(failure.error.kind, ErrorKind::ApiError);
	assert_eq!(failure.error.code.as_deref(), Some("DOORAY_API_-100"));
	assert!(failure.content.contains("post not found"));
}

#[tokio::test]
async fn test_http_error_status_becomes_api_error() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/drive/v1/drives/d-1"))
		.respond_with(ResponseTemplate::new(403).set_body_json(json!({
			"header": {"isSuccessful": false, "resultCode": -403, "resultMessage": "no permission"}
		})))
		.mount(&server)
		.await;

	let registry = registry_for(&server, &[Category::Drive]);
	let value = registry
		.call("dooray_drive_get_detail", json!({"drive_id": "d-1"}))
		.await
		.into_value();
	assert_eq!(value["isError"], true);
	assert_eq!(value["error"]["kind"], "API_ERROR");
	assert_eq!(value["error"]["code"], "HTTP_403");
	assert!(value["content"].as_str().unwrap().contains("no permission"));
}

#[tokio::test]
async fn test_undecodable_body_is_internal_error() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/calendar/v1/calendars/cal-1"))
		.respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
		.mount(&server)
		.await;

	let registry = registry_for(&server, &[Category::Calendar]);
	let response = registry
		.call("dooray_calendar_detail", json!({"calendar_id": "cal-1"}))
		.await;
	assert_matches!(response, ToolResponse::Failure(f) if f.error.kind == ErrorKind::InternalError);
}

#[tokio::test]
async fn test_unreachable_remote_is_internal_error() -> anyhow::Result<()> {
	// Reserve a port, then release it so nothing listens there.
	let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
	let address = listener.local_addr()?;
	drop(listener);

	let config = ClientConfig::new(&format!("http://{address}"), "tenant:secret")?;
	let enabled = BTreeSet::from([Category::Wiki]);
	let registry = CapabilityRegistry::build(catalogue(&DoorayClient::new(&config)?), &enabled)?;

	let response = registry.call("dooray_wiki_list_projects", json!({})).await;
	assert_matches!(response, ToolResponse::Failure(f) if f.error.kind == ErrorKind::InternalError);
	Ok(())
}
