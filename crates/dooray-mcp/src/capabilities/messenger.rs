use serde_json::{Value, json};

use super::{
	capability, ensure_successful, integer, object_schema, one_of, page, size, string, string_list,
	success,
};
use crate::args::Arguments;
use crate::category::Category;
use crate::error::DomainError;
use crate::registry::Capability;
use crate::remote::{DoorayClient, Page};
use crate::shaping::{filter_recent, project_all};
use crate::types::Channel;

pub(super) fn capabilities(client: &DoorayClient) -> Vec<Capability> {
	vec![
		capability(
			client,
			Category::Messenger,
			"dooray_messenger_search_members",
			"Search organization members by name, email address, user code or IdP user ID.",
			object_schema(
				json!({
					"name": string("Member name"),
					"email": string_list("External email addresses"),
					"user_code": string("User code (login ID)"),
					"id_provider_user_id": string("Identity provider user ID"),
					"page": page(),
					"size": size(20),
				}),
				&[],
			),
			search_members,
		),
		capability(
			client,
			Category::Messenger,
			"dooray_messenger_send_direct_message",
			"Send a 1:1 message to an organization member.",
			object_schema(
				json!({
					"organization_member_id": string("Recipient member ID"),
					"text": string("Message text"),
				}),
				&["organization_member_id", "text"],
			),
			send_direct_message,
		),
		capability(
			client,
			Category::Messenger,
			"dooray_messenger_get_channels",
			"List the channels the caller belongs to, with full channel details. \
			 recent_months keeps only channels updated within that many months.",
			channel_list_schema(),
			get_channels,
		),
		capability(
			client,
			Category::Messenger,
			"dooray_messenger_get_simple_channels",
			"List channels as compact summaries (id, title, type, status, updatedAt, \
			 participantCount). recent_months keeps only recently updated channels.",
			channel_list_schema(),
			get_simple_channels,
		),
		capability(
			client,
			Category::Messenger,
			"dooray_messenger_get_channel",
			"Get one channel the caller belongs to.",
			object_schema(json!({"channel_id": string("Channel ID")}), &["channel_id"]),
			get_channel,
		),
		capability(
			client,
			Category::Messenger,
			"dooray_messenger_send_channel_message",
			"Post a message to a channel, optionally mentioning members.",
			object_schema(
				json!({
					"channel_id": string("Channel ID"),
					"text": string("Message text"),
					"mention_members": {
						"type": "array",
						"description": "Members to mention; each needs id, name and organizationId",
						"items": {
							"type": "object",
							"properties": {
								"id": {"type": "string"},
								"name": {"type": "string"},
								"organizationId": {"type": "string"},
							},
							"required": ["id", "name", "organizationId"],
						},
					},
				}),
				&["channel_id", "text"],
			),
			send_channel_message,
		),
		capability(
			client,
			Category::Messenger,
			"dooray_messenger_create_channel",
			"Create a private or direct channel.",
			object_schema(
				json!({
					"type": one_of("Channel type", &["private", "direct"]),
					"title": string("Channel title"),
					"member_ids": string_list("Members to add"),
					"capacity": integer("Maximum number of participants"),
					"id_type": one_of("How member_ids are given (default memberId)", &["email", "memberId"]),
				}),
				&["type"],
			),
			create_channel,
		),
		capability(
			client,
			Category::Messenger,
			"dooray_messenger_join_channel",
			"Add members to a channel.",
			membership_schema(),
			join_channel,
		),
		capability(
			client,
			Category::Messenger,
			"dooray_messenger_leave_channel",
			"Remove members from a channel.",
			membership_schema(),
			leave_channel,
		),
		capability(
			client,
			Category::Messenger,
			"dooray_messenger_create_thread",
			"Start a thread in a channel with a first message.",
			object_schema(
				json!({
					"channel_id": string("Channel ID"),
					"text": string("First message of the thread"),
				}),
				&["channel_id", "text"],
			),
			create_thread,
		),
		capability(
			client,
			Category::Messenger,
			"dooray_messenger_update_message",
			"Edit a message previously posted to a channel.",
			object_schema(
				json!({
					"channel_id": string("Channel ID"),
					"log_id": string("Message (log) ID"),
					"text": string("New message text"),
				}),
				&["channel_id", "log_id", "text"],
			),
			update_message,
		),
		capability(
			client,
			Category::Messenger,
			"dooray_messenger_delete_message",
			"Delete a message from a channel.",
			object_schema(
				json!({
					"channel_id": string("Channel ID"),
					"log_id": string("Message (log) ID"),
				}),
				&["channel_id", "log_id"],
			),
			delete_message,
		),
	]
}

fn channel_list_schema() -> Value {
	object_schema(
		json!({
			"page": page(),
			"size": size(200),
			"recent_months": integer("Only keep channels updated within this many months"),
		}),
		&[],
	)
}

fn membership_schema() -> Value {
	object_schema(
		json!({
			"channel_id": string("Channel ID"),
			"member_ids": string_list("Organization member IDs"),
		}),
		&["channel_id", "member_ids"],
	)
}

async fn search_members(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let emails = args.optional_string_list("email")?;
	let page = client
		.get(&["common", "v1", "members"])
		.param("name", args.optional_str("name")?)
		.list_param("externalEmailAddresses", emails.as_deref())
		.param("userCode", args.optional_str("user_code")?)
		.param("idProviderUserId", args.optional_str("id_provider_user_id")?)
		.param("page", args.optional_u32("page")?)
		.param("size", args.optional_u32("size")?)
		.invoke_page::<Value>()
		.await?;

	let total = page.total();
	success(
		json!({"members": page.items, "totalCount": total}),
		format!("found {total} members"),
	)
}

async fn send_direct_message(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let member_id = args.required_str("organization_member_id")?;
	let text = args.required_str("text")?;

	let envelope = client
		.post(&["messenger", "v1", "channels", "direct-send"])
		.json(&json!({"text": text, "organizationMemberId": member_id}))
		.invoke_nullable::<Value>()
		.await?;
	let sent = ensure_successful(envelope)?;
	success(
		json!({"organizationMemberId": member_id, "result": sent}),
		"direct message sent",
	)
}

/// Fetch one page of channels, applying the recency filter when asked.
///
/// A filtered page can be shorter than the requested size; no further pages are
/// fetched to make up for it.
async fn fetch_channels(client: &DoorayClient, args: &Arguments) -> Result<Page<Channel>, DomainError> {
	let recent_months = args.optional_u32("recent_months")?.filter(|m| *m > 0);
	let page = client
		.get(&["messenger", "v1", "channels"])
		.param("page", args.optional_u32("page")?)
		.param("size", args.optional_u32("size")?)
		.invoke_page::<Channel>()
		.await?;

	Ok(match recent_months {
		Some(months) => {
			let items = filter_recent(page.items, months);
			Page {
				total_count: Some(items.len() as u64),
				items,
			}
		},
		None => page,
	})
}

async fn get_channels(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let page = fetch_channels(&client, &args).await?;
	let total = page.total();
	success(
		json!({"channels": page.items, "totalCount": total}),
		format!("found {total} channels"),
	)
}

async fn get_simple_channels(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let page = fetch_channels(&client, &args).await?;
	let total = page.total();
	success(
		json!({"channels": project_all(&page.items), "totalCount": total}),
		format!("found {total} channels"),
	)
}

/// Dooray has no single-channel endpoint; the caller's channel list is searched.
async fn get_channel(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let channel_id = args.required_str("channel_id")?;

	let channels: Vec<Channel> = client
		.get(&["messenger", "v1", "channels"])
		.invoke()
		.await?;
	match channels.into_iter().find(|c| c.id == channel_id) {
		Some(channel) => {
			let title = channel.title.clone().unwrap_or_default();
			success(channel, format!("channel '{title}' retrieved"))
		},
		None => Err(
			DomainError::api(
				format!("channel '{channel_id}' not found among the caller's channels"),
				"CHANNEL_NOT_FOUND",
			),
		),
	}
}

async fn send_channel_message(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let channel_id = args.required_str("channel_id")?;
	let text = args.required_str("text")?;
	let text = with_mentions(&args, text)?;

	let envelope = client
		.post(&["messenger", "v1", "channels", &channel_id, "logs"])
		.json(&json!({"text": text}))
		.invoke_nullable::<Value>()
		.await?;
	ensure_successful(envelope)?;
	success(json!({"channelId": channel_id, "text": text}), "message sent")
}

/// Prefix `text` with one Dooray mention link per requested member.
fn with_mentions(args: &Arguments, text: String) -> Result<String, DomainError> {
	let Some(members) = args.get("mention_members") else {
		return Ok(text);
	};
	let invalid = || {
		DomainError::validation(
			"the 'mention_members' parameter must be an array of {id, name, organizationId} objects",
		)
		.with_code("INVALID_MENTION_MEMBERS")
	};
	let members = members.as_array().ok_or_else(invalid)?;

	let mut lines = Vec::with_capacity(members.len() + 1);
	for member in members {
		let field = |key: &str| member.get(key).and_then(Value::as_str);
		let (Some(id), Some(name), Some(org)) = (field("id"), field("name"), field("organizationId"))
		else {
			return Err(invalid());
		};
		lines.push(format!("[@{name}](dooray://{org}/members/{id} \"member\")"));
	}
	lines.push(text);
	Ok(lines.join("\n"))
}

async fn create_channel(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let kind = args
		.one_of("type", &["private", "direct"])?
		.ok_or_else(|| DomainError::parameter_missing("type"))?;
	let id_type = args.one_of("id_type", &["email", "memberId"])?;

	let mut request = json!({"type": kind});
	if let Some(title) = args.optional_str("title")? {
		request["title"] = json!(title);
	}
	if let Some(capacity) = args.optional_u32("capacity")? {
		request["capacity"] = json!(capacity.to_string());
	}
	if let Some(members) = args.optional_string_list("member_ids")? {
		request["memberIds"] = json!(members);
	}

	let created: Value = client
		.post(&["messenger", "v1", "channels"])
		.param("idType", id_type)
		.json(&request)
		.invoke()
		.await?;
	success(created, format!("{kind} channel created"))
}

async fn change_membership(
	client: DoorayClient,
	args: Arguments,
	action: &str,
) -> Result<Value, DomainError> {
	let channel_id = args.required_str("channel_id")?;
	let member_ids = args.required_string_list("member_ids")?;

	let envelope = client
		.post(&["messenger", "v1", "channels", &channel_id, "members", action])
		.json(&json!({"memberIds": member_ids}))
		.invoke_nullable::<Value>()
		.await?;
	ensure_successful(envelope)?;
	let count = member_ids.len();
	success(
		json!({"channelId": channel_id, "memberIds": member_ids}),
		format!("channel membership updated ({action}, {count} members)"),
	)
}

async fn join_channel(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	change_membership(client, args, "join").await
}

async fn leave_channel(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	change_membership(client, args, "leave").await
}

async fn create_thread(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let channel_id = args.required_str("channel_id")?;
	let text = args.required_str("text")?;

	let created: Value = client
		.post(&["messenger", "v1", "channels", &channel_id, "threads"])
		.json(&json!({"text": text}))
		.invoke()
		.await?;
	success(
		json!({
			"channelId": channel_id,
			"threadId": created.get("threadId"),
			"logId": created.get("logId"),
			"text": text,
		}),
		"thread created",
	)
}

fn log_path<'a>(channel_id: &'a str, log_id: &'a str) -> [&'a str; 6] {
	["messenger", "v1", "channels", channel_id, "logs", log_id]
}

async fn update_message(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let channel_id = args.required_str("channel_id")?;
	let log_id = args.required_str("log_id")?;
	let text = args.required_str("text")?;

	let envelope = client
		.put(&log_path(&channel_id, &log_id))
		.json(&json!({"text": text}))
		.invoke_nullable::<Value>()
		.await?;
	ensure_successful(envelope)?;
	success(
		json!({"channelId": channel_id, "logId": log_id, "text": text}),
		"message updated",
	)
}

async fn delete_message(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let channel_id = args.required_str("channel_id")?;
	let log_id = args.required_str("log_id")?;

	let envelope = client
		.delete(&log_path(&channel_id, &log_id))
		.invoke_nullable::<Value>()
		.await?;
	ensure_successful(envelope)?;
	success(json!({"channelId": channel_id, "logId": log_id}), "message deleted")
}
