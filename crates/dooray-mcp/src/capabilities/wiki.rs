use http::StatusCode;
use serde_json::{Map, Value, json};

use super::{capability, ensure_successful, object_schema, page, size, string, string_list, success};
use crate::args::Arguments;
use crate::category::Category;
use crate::error::DomainError;
use crate::registry::Capability;
use crate::remote::DoorayClient;

const MARKDOWN: &str = "text/x-markdown";

pub(super) fn capabilities(client: &DoorayClient) -> Vec<Capability> {
	vec![
		capability(
			client,
			Category::Wiki,
			"dooray_wiki_list_projects",
			"List the wikis (one per project) the caller can access.",
			object_schema(json!({"page": page(), "size": size(20)}), &[]),
			list_projects,
		),
		capability(
			client,
			Category::Wiki,
			"dooray_wiki_list_pages",
			"List the pages of a wiki. Without parent_page_id the root pages are returned.",
			object_schema(
				json!({
					"wiki_id": string("Wiki ID"),
					"parent_page_id": string("Only list children of this page"),
				}),
				&["wiki_id"],
			),
			list_pages,
		),
		capability(
			client,
			Category::Wiki,
			"dooray_wiki_get_page",
			"Get a wiki page including its body.",
			object_schema(
				json!({
					"wiki_id": string("Wiki ID"),
					"page_id": string("Page ID"),
				}),
				&["wiki_id", "page_id"],
			),
			get_page,
		),
		capability(
			client,
			Category::Wiki,
			"dooray_wiki_create_page",
			"Create a wiki page under a parent page. The body is markdown.",
			object_schema(
				json!({
					"wiki_id": string("Wiki ID"),
					"parent_page_id": string("Parent page ID"),
					"subject": string("Page title"),
					"body": string("Page content (markdown)"),
					"referrer_member_ids": string_list("Organization member IDs to notify"),
				}),
				&["wiki_id", "parent_page_id", "subject", "body"],
			),
			create_page,
		),
		capability(
			client,
			Category::Wiki,
			"dooray_wiki_update_page",
			"Update the title and/or body of a wiki page.",
			object_schema(
				json!({
					"wiki_id": string("Wiki ID"),
					"page_id": string("Page ID"),
					"subject": string("New title"),
					"body": string("New content (markdown)"),
					"referrer_member_ids": string_list("Organization member IDs to notify"),
				}),
				&["wiki_id", "page_id"],
			),
			update_page,
		),
	]
}

async fn list_projects(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let page = client
		.get(&["wiki", "v1", "wikis"])
		.param("page", args.optional_u32("page")?)
		.param("size", args.optional_u32("size")?)
		.invoke_page::<Value>()
		.await?;

	let total = page.total();
	success(
		json!({"wikis": page.items, "totalCount": total}),
		format!("found {total} wikis"),
	)
}

async fn list_pages(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let wiki_id = args.required_str("wiki_id")?;
	let parent = args.optional_str("parent_page_id")?;

	let pages: Vec<Value> = client
		.get(&["wiki", "v1", "wikis", &wiki_id, "pages"])
		.param("parentPageId", parent.as_deref())
		.invoke()
		.await?;

	let count = pages.len();
	success(pages, format!("found {count} pages"))
}

async fn get_page(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let wiki_id = args.required_str("wiki_id")?;
	let page_id = args.required_str("page_id")?;

	let page: Value = client
		.get(&["wiki", "v1", "wikis", &wiki_id, "pages", &page_id])
		.invoke()
		.await?;
	success(page, "wiki page retrieved")
}

async fn create_page(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let wiki_id = args.required_str("wiki_id")?;
	let parent_page_id = args.required_str("parent_page_id")?;
	let subject = args.required_str("subject")?;
	let body = args.required_str("body")?;

	let mut request = json!({
		"subject": subject,
		"body": {"mimeType": MARKDOWN, "content": body},
		"parentPageId": parent_page_id,
	});
	if let Some(referrers) = referrers(&args)? {
		request["referrers"] = referrers;
	}

	let created: Value = client
		.post(&["wiki", "v1", "wikis", &wiki_id, "pages"])
		.json(&request)
		.expect(StatusCode::CREATED)
		.invoke()
		.await?;
	success(created, format!("wiki page '{subject}' created"))
}

async fn update_page(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let wiki_id = args.required_str("wiki_id")?;
	let page_id = args.required_str("page_id")?;

	let mut request = Map::new();
	if let Some(subject) = args.optional_str("subject")? {
		request.insert("subject".into(), json!(subject));
	}
	if let Some(body) = args.optional_str("body")? {
		request.insert("body".into(), json!({"mimeType": MARKDOWN, "content": body}));
	}
	if let Some(referrers) = referrers(&args)? {
		request.insert("referrers".into(), referrers);
	}
	if request.is_empty() {
		return Err(
			DomainError::validation("nothing to update: give at least one of subject, body or referrer_member_ids")
				.with_code("NOTHING_TO_UPDATE"),
		);
	}

	let envelope = client
		.put(&["wiki", "v1", "wikis", &wiki_id, "pages", &page_id])
		.json(&request)
		.invoke_nullable::<Value>()
		.await?;
	ensure_successful(envelope)?;
	success(json!({"wikiId": wiki_id, "pageId": page_id}), "wiki page updated")
}

fn referrers(args: &Arguments) -> Result<Option<Value>, DomainError> {
	Ok(args.optional_string_list("referrer_member_ids")?.map(|ids| {
		ids.into_iter()
			.map(|id| json!({"type": "member", "member": {"organizationMemberId": id}}))
			.collect()
	}))
}
