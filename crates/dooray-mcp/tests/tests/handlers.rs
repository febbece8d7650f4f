// Individual handlers against a mocked Dooray API: request mapping and result
// shaping

use dooray_mcp::{Category, ErrorKind, ToolResponse};
use serde_json::{Value, json};
use tracing_test::traced_test;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::{fixture, ok_envelope, registry_for};

const CHANNELS: &str = include_str!("../fixtures/dooray/channels.json");

fn success(response: ToolResponse) -> Value {
	match response {
		ToolResponse::Success(value) => value,
		ToolResponse::Failure(failure) => panic!("unexpected failure: {failure:?}"),
	}
}

#[tokio::test]
#[traced_test]
async fn test_simple_channels_recent_filter_and_projection() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/messenger/v1/channels"))
		.respond_with(ResponseTemplate::new(200).set_body_json(fixture(CHANNELS)))
		.mount(&server)
		.await;
	let registry = registry_for(&server, &[Category::Messenger]);

	let value = success(
		registry
			.call("dooray_messenger_get_simple_channels", json!({"recent_months": 6}))
			.await,
	);
	assert_eq!(value["data"]["totalCount"], 1);
	assert_eq!(
		value["data"]["channels"],
		json!([{
			"id": "ch-recent",
			"title": "release",
			"type": "private",
			"status": "normal",
			"updatedAt": "2099-01-01T00:00:00.000+09:00",
			"participantCount": 2,
		}])
	);
	assert!(logs_contain("excluding entity with unusable timestamp"));

	// Without a window nothing is dropped and full channels come back.
	let value = success(registry.call("dooray_messenger_get_channels", json!({})).await);
	assert_eq!(value["data"]["totalCount"], 3);
	assert_eq!(value["data"]["channels"][0]["organizationId"], "org-1");
}

#[tokio::test]
async fn test_get_channel_searches_the_channel_list() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/messenger/v1/channels"))
		.respond_with(ResponseTemplate::new(200).set_body_json(fixture(CHANNELS)))
		.mount(&server)
		.await;
	let registry = registry_for(&server, &[Category::Messenger]);

	let value = success(
		registry
			.call("dooray_messenger_get_channel", json!({"channel_id": "ch-stale"}))
			.await,
	);
	assert_eq!(value["data"]["title"], "old project");

	let response = registry
		.call("dooray_messenger_get_channel", json!({"channel_id": "ch-missing"}))
		.await;
	let ToolResponse::Failure(failure) = response else {
		panic!("expected a failure");
	};
	assert_eq!(failure.error.kind, ErrorKind::ApiError);
	assert_eq!(failure.error.code.as_deref(), Some("CHANNEL_NOT_FOUND"));
}

#[tokio::test]
async fn test_channel_message_with_mentions() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/messenger/v1/channels/ch-1/logs"))
		.and(body_json(json!({
			"text": "[@Kim](dooray://org-1/members/m-1 \"member\")\ndeploy is done"
		})))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"header": {"isSuccessful": true, "resultCode": 0, "resultMessage": ""}
		})))
		.expect(1)
		.mount(&server)
		.await;
	let registry = registry_for(&server, &[Category::Messenger]);

	let value = success(
		registry
			.call(
				"dooray_messenger_send_channel_message",
				json!({
					"channel_id": "ch-1",
					"text": "deploy is done",
					"mention_members": [{"id": "m-1", "name": "Kim", "organizationId": "org-1"}],
				}),
			)
			.await,
	);
	assert_eq!(value["data"]["channelId"], "ch-1");

	let response = registry
		.call(
			"dooray_messenger_send_channel_message",
			json!({"channel_id": "ch-1", "text": "hi", "mention_members": [{"id": "m-1"}]}),
		)
		.await;
	let ToolResponse::Failure(failure) = response else {
		panic!("expected a failure");
	};
	assert_eq!(failure.error.code.as_deref(), Some("INVALID_MENTION_MEMBERS"));
}

#[tokio::test]
async fn test_wiki_create_page_expects_created() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/wiki/v1/wikis/w-1/pages"))
		.and(body_json(json!({
			"subject": "Runbook",
			"body": {"mimeType": "text/x-markdown", "content": "# Steps"},
			"parentPageId": "root",
			"referrers": [{"type": "member", "member": {"organizationMemberId": "m-1"}}],
		})))
		.respond_with(ResponseTemplate::new(201).set_body_json(ok_envelope(json!({"id": "page-9"}))))
		.expect(1)
		.mount(&server)
		.await;
	let registry = registry_for(&server, &[Category::Wiki]);

	let value = success(
		registry
			.call(
				"dooray_wiki_create_page",
				json!({
					"wiki_id": "w-1",
					"parent_page_id": "root",
					"subject": "Runbook",
					"body": "# Steps",
					"referrer_member_ids": "m-1",
				}),
			)
			.await,
	);
	assert_eq!(value["data"]["id"], "page-9");
}

#[tokio::test]
async fn test_wiki_update_without_changes_makes_no_request() {
	let server = MockServer::start().await;
	let registry = registry_for(&server, &[Category::Wiki]);

	let response = registry
		.call("dooray_wiki_update_page", json!({"wiki_id": "w-1", "page_id": "p-1"}))
		.await;
	let ToolResponse::Failure(failure) = response else {
		panic!("expected a failure");
	};
	assert_eq!(failure.error.kind, ErrorKind::ValidationError);
	assert_eq!(failure.error.code.as_deref(), Some("NOTHING_TO_UPDATE"));
	assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_calendar_events_across_all_calendars() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/calendar/v1/calendars/*/events"))
		.and(query_param("timeMin", "2025-04-01T00:00:00+09:00"))
		.and(query_param("timeMax", "2025-05-01T00:00:00+09:00"))
		.and(query_param("calendars", "cal-1,cal-2"))
		.respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(json!([
			{"id": "ev-1", "subject": "Standup"}
		]))))
		.expect(1)
		.mount(&server)
		.await;
	let registry = registry_for(&server, &[Category::Calendar]);

	let value = success(
		registry
			.call(
				"dooray_calendar_events",
				json!({
					"time_min": "2025-04-01T00:00:00+09:00",
					"time_max": "2025-05-01T00:00:00+09:00",
					"calendars": ["cal-1", "cal-2"],
				}),
			)
			.await,
	);
	assert_eq!(value["data"]["totalCount"], 1);

	let response = registry
		.call(
			"dooray_calendar_events",
			json!({"time_min": "2025-04-01T00:00:00+09:00", "category": "holiday"}),
		)
		.await;
	let ToolResponse::Failure(failure) = response else {
		panic!("expected a failure");
	};
	assert_eq!(failure.error.code.as_deref(), Some("MISSING_TIME_MAX"));
}

#[tokio::test]
async fn test_drive_move_to_trash_and_shared_link_defaults() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/drive/v1/drives/d-1/files/f-1/move"))
		.and(body_json(json!({"destinationFileId": "trash"})))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"header": {"isSuccessful": true, "resultCode": 0, "resultMessage": ""},
			"result": null
		})))
		.expect(1)
		.mount(&server)
		.await;
	Mock::given(method("POST"))
		.and(path("/drive/v1/drives/d-1/files/f-1/shared-links"))
		.and(body_json(json!({"scope": "memberAndGuest", "expiredAt": "2025-12-31T23:59:59+09:00"})))
		.respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(json!({"id": "link-1"}))))
		.expect(1)
		.mount(&server)
		.await;
	let registry = registry_for(&server, &[Category::Drive]);

	success(
		registry
			.call("dooray_drive_move_to_trash", json!({"drive_id": "d-1", "file_id": "f-1"}))
			.await,
	);

	let value = success(
		registry
			.call(
				"dooray_drive_create_shared_link",
				json!({"drive_id": "d-1", "file_id": "f-1", "expired_at": "2025-12-31T23:59:59+09:00"}),
			)
			.await,
	);
	assert_eq!(value["data"]["id"], "link-1");

	let response = registry
		.call(
			"dooray_drive_create_shared_link",
			json!({"drive_id": "d-1", "file_id": "f-1", "expired_at": "2025-12-31", "scope": "everyone"}),
		)
		.await;
	let ToolResponse::Failure(failure) = response else {
		panic!("expected a failure");
	};
	assert_eq!(failure.error.kind, ErrorKind::ValidationError);
	assert_eq!(failure.error.code.as_deref(), Some("INVALID_SCOPE"));
}

#[tokio::test]
async fn test_drive_delete_reports_semantic_failure() {
	let server = MockServer::start().await;
	Mock::given(method("DELETE"))
		.and(path("/drive/v1/drives/d-1/files/f-1"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"header": {"isSuccessful": false, "resultCode": -20, "resultMessage": "file is not in trash"}
		})))
		.mount(&server)
		.await;
	let registry = registry_for(&server, &[Category::Drive]);

	let response = registry
		.call("dooray_drive_delete_file", json!({"drive_id": "d-1", "file_id": "f-1"}))
		.await;
	let ToolResponse::Failure(failure) = response else {
		panic!("expected a failure");
	};
	assert_eq!(failure.error.code.as_deref(), Some("DOORAY_API_-20"));
	assert!(failure.content.contains("not in trash"));
}

#[tokio::test]
async fn test_thread_and_message_edits() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/messenger/v1/channels/ch-1/threads"))
		.and(body_json(json!({"text": "release notes"})))
		.respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(json!({
			"threadId": "th-1",
			"logId": "log-1"
		}))))
		.expect(1)
		.mount(&server)
		.await;
	Mock::given(method("PUT"))
		.and(path("/messenger/v1/channels/ch-1/logs/log-1"))
		.and(body_json(json!({"text": "release notes v2"})))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"header": {"isSuccessful": true, "resultCode": 0, "resultMessage": ""}
		})))
		.expect(1)
		.mount(&server)
		.await;
	Mock::given(method("DELETE"))
		.and(path("/messenger/v1/channels/ch-1/logs/log-1"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"header": {"isSuccessful": true, "resultCode": 0, "resultMessage": ""},
			"result": null
		})))
		.expect(1)
		.mount(&server)
		.await;
	let registry = registry_for(&server, &[Category::Messenger]);

	let value = success(
		registry
			.call(
				"dooray_messenger_create_thread",
				json!({"channel_id": "ch-1", "text": "release notes"}),
			)
			.await,
	);
	assert_eq!(value["data"]["threadId"], "th-1");
	assert_eq!(value["data"]["logId"], "log-1");

	let value = success(
		registry
			.call(
				"dooray_messenger_update_message",
				json!({"channel_id": "ch-1", "log_id": "log-1", "text": "release notes v2"}),
			)
			.await,
	);
	assert_eq!(value["data"]["text"], "release notes v2");

	let value = success(
		registry
			.call("dooray_messenger_delete_message", json!({"channel_id": "ch-1", "log_id": "log-1"}))
			.await,
	);
	assert_eq!(value["data"]["logId"], "log-1");

	let response = registry
		.call("dooray_messenger_update_message", json!({"channel_id": "ch-1", "text": "x"}))
		.await;
	let ToolResponse::Failure(failure) = response else {
		panic!("expected a failure");
	};
	assert_eq!(failure.error.kind, ErrorKind::ParameterMissing);
	assert_eq!(failure.error.code.as_deref(), Some("MISSING_LOG_ID"));
}

#[tokio::test]
async fn test_drive_changes_counts_by_type() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/drive/v1/drives/d-1/changes"))
		.and(query_param("latestRevision", "40"))
		.and(query_param("size", "50"))
		.respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(json!([
			{"id": "f-1", "changeType": "updated", "revision": "41"},
			{"id": "f-2", "changeType": "deleted", "revision": "42"},
			{"id": "f-3", "changeType": "updated", "revision": "43"},
		]))))
		.expect(1)
		.mount(&server)
		.await;
	let registry = registry_for(&server, &[Category::Drive]);

	let value = success(
		registry
			.call(
				"dooray_drive_get_changes",
				json!({"drive_id": "d-1", "latest_revision": "40", "size": 50}),
			)
			.await,
	);
	assert_eq!(value["data"].as_array().map(Vec::len), Some(3));
	assert_eq!(value["message"], "found 3 changes (2 updated, 1 deleted)");

	let response = registry.call("dooray_drive_get_changes", json!({})).await;
	let ToolResponse::Failure(failure) = response else {
		panic!("expected a failure");
	};
	assert_eq!(failure.error.code.as_deref(), Some("MISSING_DRIVE_ID"));
}
