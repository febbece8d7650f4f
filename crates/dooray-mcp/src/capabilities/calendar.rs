use serde_json::{Value, json};

use super::{boolean, capability, object_schema, one_of, string, string_list, success};
use crate::args::Arguments;
use crate::category::Category;
use crate::error::DomainError;
use crate::registry::Capability;
use crate::remote::DoorayClient;

const POST_TYPES: &[&str] = &["toMe", "toCcMe", "fromToCcMe"];
const EVENT_CATEGORIES: &[&str] = &["general", "post", "milestone"];

pub(super) fn capabilities(client: &DoorayClient) -> Vec<Capability> {
	vec![
		capability(
			client,
			Category::Calendar,
			"dooray_calendar_list",
			"List the calendars the caller can access.",
			object_schema(json!({}), &[]),
			list_calendars,
		),
		capability(
			client,
			Category::Calendar,
			"dooray_calendar_detail",
			"Get a calendar with its members and the caller's settings.",
			object_schema(json!({"calendar_id": string("Calendar ID")}), &["calendar_id"]),
			calendar_detail,
		),
		capability(
			client,
			Category::Calendar,
			"dooray_calendar_events",
			"List events between two instants, across all or selected calendars.",
			object_schema(
				json!({
					"time_min": string("Range start, ISO 8601 (e.g. 2025-04-11T00:00:00+09:00)"),
					"time_max": string("Range end, ISO 8601"),
					"calendars": string_list("Calendar IDs; all calendars when omitted"),
					"post_type": one_of("Which events to include by attendance", POST_TYPES),
					"category": one_of("Event category", EVENT_CATEGORIES),
				}),
				&["time_min", "time_max"],
			),
			calendar_events,
		),
		capability(
			client,
			Category::Calendar,
			"dooray_calendar_event_detail",
			"Get one calendar event.",
			object_schema(
				json!({
					"calendar_id": string("Calendar ID"),
					"event_id": string("Event ID"),
				}),
				&["calendar_id", "event_id"],
			),
			event_detail,
		),
		capability(
			client,
			Category::Calendar,
			"dooray_calendar_create_event",
			"Create an event in a calendar and invite members.",
			object_schema(
				json!({
					"calendar_id": string("Calendar ID"),
					"subject": string("Event title"),
					"content": string("Event description (HTML)"),
					"started_at": string("Start, ISO 8601"),
					"ended_at": string("End, ISO 8601"),
					"to_member_ids": string_list("Attendee member IDs"),
					"cc_member_ids": string_list("Optional attendee member IDs"),
					"whole_day": boolean("All-day event (default false)"),
					"location": string("Location"),
				}),
				&["calendar_id", "subject", "content", "started_at", "ended_at", "to_member_ids"],
			),
			create_event,
		),
	]
}

async fn list_calendars(client: DoorayClient, _args: Arguments) -> Result<Value, DomainError> {
	let page = client
		.get(&["calendar", "v1", "calendars"])
		.invoke_page::<Value>()
		.await?;
	let total = page.total();
	success(
		json!({"calendars": page.items, "totalCount": total}),
		format!("found {total} calendars"),
	)
}

async fn calendar_detail(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let calendar_id = args.required_str("calendar_id")?;
	let calendar: Value = client
		.get(&["calendar", "v1", "calendars", &calendar_id])
		.invoke()
		.await?;
	success(calendar, "calendar retrieved")
}

async fn calendar_events(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let time_min = args.required_str("time_min")?;
	let time_max = args.required_str("time_max")?;
	let calendars = args.optional_string_list("calendars")?;

	let events: Vec<Value> = client
		.get(&["calendar", "v1", "calendars", "*", "events"])
		.param("timeMin", Some(&time_min))
		.param("timeMax", Some(&time_max))
		.list_param("calendars", calendars.as_deref())
		.param("postType", args.one_of("post_type", POST_TYPES)?)
		.param("category", args.one_of("category", EVENT_CATEGORIES)?)
		.invoke()
		.await?;

	let count = events.len();
	success(
		json!({"events": events, "totalCount": count}),
		format!("found {count} events between {time_min} and {time_max}"),
	)
}

async fn event_detail(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let calendar_id = args.required_str("calendar_id")?;
	let event_id = args.required_str("event_id")?;
	let event: Value = client
		.get(&["calendar", "v1", "calendars", &calendar_id, "events", &event_id])
		.invoke()
		.await?;
	success(event, "event retrieved")
}

async fn create_event(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let calendar_id = args.required_str("calendar_id")?;
	let subject = args.required_str("subject")?;
	let content = args.required_str("content")?;
	let started_at = args.required_str("started_at")?;
	let ended_at = args.required_str("ended_at")?;
	let to = args.required_string_list("to_member_ids")?;
	let cc = args.optional_string_list("cc_member_ids")?.unwrap_or_default();

	let mut request = json!({
		"users": {"to": attendees(to), "cc": attendees(cc)},
		"subject": subject,
		"body": {"mimeType": "text/html", "content": content},
		"startedAt": started_at,
		"endedAt": ended_at,
		"wholeDayFlag": args.optional_bool("whole_day")?.unwrap_or(false),
	});
	if let Some(location) = args.optional_str("location")? {
		request["location"] = json!(location);
	}

	let created: Value = client
		.post(&["calendar", "v1", "calendars", &calendar_id, "events"])
		.json(&request)
		.invoke()
		.await?;
	success(
		json!({
			"event": created,
			"calendarId": calendar_id,
			"subject": subject,
			"startedAt": started_at,
			"endedAt": ended_at,
		}),
		format!("event '{subject}' created"),
	)
}

fn attendees(ids: Vec<String>) -> Vec<Value> {
	ids.into_iter()
		.map(|id| json!({"type": "member", "member": {"organizationMemberId": id}}))
		.collect()
}
