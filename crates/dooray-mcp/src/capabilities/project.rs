use serde_json::{Value, json};

use super::{
	capability, ensure_successful, integer, object_schema, one_of, page, size, string, string_list,
	success,
};
use crate::args::Arguments;
use crate::category::Category;
use crate::error::DomainError;
use crate::registry::Capability;
use crate::remote::DoorayClient;
use crate::shaping::project_all;
use crate::types::Post;

const MIME_TYPES: &[&str] = &["text/x-markdown", "text/html"];
const PRIORITIES: &[&str] = &["highest", "high", "normal", "low", "lowest", "none"];
const PROJECT_STATES: &[&str] = &["active", "archived", "deleted"];
const WORKFLOW_CLASSES: &str = "Workflow classes: backlog, registered, working, closed";

pub(super) fn capabilities(client: &DoorayClient) -> Vec<Capability> {
	vec![
		capability(
			client,
			Category::Project,
			"dooray_project_list_projects",
			"List the projects the caller is a member of.",
			object_schema(
				json!({
					"page": page(),
					"size": size(20),
					"type": one_of("Project type", &["public", "private"]),
					"scope": one_of("Project scope", &["private", "public"]),
					"state": one_of("Project state", PROJECT_STATES),
				}),
				&[],
			),
			list_projects,
		),
		capability(
			client,
			Category::Project,
			"dooray_project_list_posts",
			"List the tasks of a project as compact summaries (id, subject, task number, \
			 workflow, assignees, priority, dates). Use dooray_project_get_post for details.",
			object_schema(
				json!({
					"project_id": string("Project ID"),
					"page": page(),
					"size": size(20),
					"from_member_ids": string_list("Author member IDs"),
					"to_member_ids": string_list("Assignee member IDs"),
					"cc_member_ids": string_list("CC member IDs"),
					"tag_ids": string_list("Tag IDs"),
					"parent_post_id": string("Only list subtasks of this task"),
					"post_number": integer("Task number within the project"),
					"post_workflow_classes": string_list(WORKFLOW_CLASSES),
					"post_workflow_ids": string_list("Workflow IDs"),
					"milestone_ids": string_list("Milestone IDs"),
					"subjects": string("Text contained in the task title"),
					"created_at": string("Creation date range filter, e.g. prev-7d or an ISO range"),
					"updated_at": string("Update date range filter"),
					"due_at": string("Due date range filter"),
					"order": string("Sort key: postDueAt, postUpdatedAt or createdAt, prefix '-' for descending"),
				}),
				&["project_id"],
			),
			list_posts,
		),
		capability(
			client,
			Category::Project,
			"dooray_project_get_post",
			"Get a task with its body, users and attachments.",
			object_schema(
				json!({
					"project_id": string("Project ID"),
					"post_id": string("Task ID"),
				}),
				&["project_id", "post_id"],
			),
			get_post,
		),
		capability(
			client,
			Category::Project,
			"dooray_project_create_post",
			"Create a task in a project.",
			post_schema(false),
			create_post,
		),
		capability(
			client,
			Category::Project,
			"dooray_project_update_post",
			"Replace the subject, body, users and planning fields of a task.",
			post_schema(true),
			update_post,
		),
		capability(
			client,
			Category::Project,
			"dooray_project_set_post_workflow",
			"Move a task to another workflow state.",
			object_schema(
				json!({
					"project_id": string("Project ID"),
					"post_id": string("Task ID"),
					"workflow_id": string("Target workflow ID"),
				}),
				&["project_id", "post_id", "workflow_id"],
			),
			set_post_workflow,
		),
		capability(
			client,
			Category::Project,
			"dooray_project_set_post_done",
			"Mark a task as done.",
			object_schema(
				json!({
					"project_id": string("Project ID"),
					"post_id": string("Task ID"),
				}),
				&["project_id", "post_id"],
			),
			set_post_done,
		),
		capability(
			client,
			Category::Project,
			"dooray_project_create_post_comment",
			"Add a comment to a task.",
			object_schema(
				json!({
					"project_id": string("Project ID"),
					"post_id": string("Task ID"),
					"content": string("Comment text"),
					"mime_type": one_of("Content format (default text/x-markdown)", MIME_TYPES),
				}),
				&["project_id", "post_id", "content"],
			),
			create_post_comment,
		),
		capability(
			client,
			Category::Project,
			"dooray_project_get_post_comments",
			"List the comments of a task.",
			object_schema(
				json!({
					"project_id": string("Project ID"),
					"post_id": string("Task ID"),
					"page": page(),
					"size": size(20),
					"order": one_of("Sort order", &["createdAt", "-createdAt"]),
				}),
				&["project_id", "post_id"],
			),
			get_post_comments,
		),
		capability(
			client,
			Category::Project,
			"dooray_project_update_post_comment",
			"Replace the text of a task comment.",
			object_schema(
				json!({
					"project_id": string("Project ID"),
					"post_id": string("Task ID"),
					"log_id": string("Comment ID"),
					"content": string("New comment text"),
					"mime_type": one_of("Content format (default text/x-markdown)", MIME_TYPES),
				}),
				&["project_id", "post_id", "log_id", "content"],
			),
			update_post_comment,
		),
		capability(
			client,
			Category::Project,
			"dooray_project_delete_post_comment",
			"Delete a task comment.",
			object_schema(
				json!({
					"project_id": string("Project ID"),
					"post_id": string("Task ID"),
					"log_id": string("Comment ID"),
				}),
				&["project_id", "post_id", "log_id"],
			),
			delete_post_comment,
		),
	]
}

fn post_schema(update: bool) -> Value {
	let mut properties = json!({
		"project_id": string("Project ID"),
		"subject": string("Task title"),
		"body": string("Task description"),
		"mime_type": one_of("Body format (default text/x-markdown)", MIME_TYPES),
		"to_member_ids": string_list("Assignee member IDs"),
		"cc_member_ids": string_list("CC member IDs"),
		"due_date": string("Due date, ISO 8601 (e.g. 2025-12-31T18:00:00+09:00)"),
		"milestone_id": string("Milestone ID"),
		"tag_ids": string_list("Tag IDs"),
		"priority": one_of("Priority (default none)", PRIORITIES),
	});
	let mut required = vec!["project_id", "subject", "body", "to_member_ids"];
	if update {
		properties["post_id"] = string("Task ID");
		properties["version"] = integer("Version read with dooray_project_get_post, for conflict detection");
		required.push("post_id");
	} else {
		properties["parent_post_id"] = string("Create as a subtask of this task");
	}
	object_schema(properties, &required)
}

async fn list_projects(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let page = client
		.get(&["project", "v1", "projects"])
		.param("member", Some("me"))
		.param("page", args.optional_u32("page")?)
		.param("size", args.optional_u32("size")?)
		.param("type", args.one_of("type", &["public", "private"])?)
		.param("scope", args.one_of("scope", &["private", "public"])?)
		.param("state", args.one_of("state", PROJECT_STATES)?)
		.invoke_page::<Value>()
		.await?;

	let total = page.total();
	success(
		json!({"projects": page.items, "totalCount": total}),
		format!("found {total} projects"),
	)
}

async fn list_posts(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let project_id = args.required_str("project_id")?;
	let page_number = args.optional_u32("page")?.unwrap_or(0);
	let from = args.optional_string_list("from_member_ids")?;
	let to = args.optional_string_list("to_member_ids")?;
	let cc = args.optional_string_list("cc_member_ids")?;
	let tags = args.optional_string_list("tag_ids")?;
	let classes = args.optional_string_list("post_workflow_classes")?;
	let workflows = args.optional_string_list("post_workflow_ids")?;
	let milestones = args.optional_string_list("milestone_ids")?;

	let page = client
		.get(&["project", "v1", "projects", &project_id, "posts"])
		.param("page", Some(page_number))
		.param("size", Some(args.optional_u32("size")?.unwrap_or(20)))
		.list_param("fromMemberIds", from.as_deref())
		.list_param("toMemberIds", to.as_deref())
		.list_param("ccMemberIds", cc.as_deref())
		.list_param("tagIds", tags.as_deref())
		.param("parentPostId", args.optional_str("parent_post_id")?)
		.param("postNumber", args.optional_u32("post_number")?)
		.list_param("postWorkflowClasses", classes.as_deref())
		.list_param("postWorkflowIds", workflows.as_deref())
		.list_param("milestoneIds", milestones.as_deref())
		.param("subjects", args.optional_str("subjects")?)
		.param("createdAt", args.optional_str("created_at")?)
		.param("updatedAt", args.optional_str("updated_at")?)
		.param("dueAt", args.optional_str("due_at")?)
		.param("order", args.optional_str("order")?)
		.invoke_page::<Post>()
		.await?;

	let summaries = project_all(&page.items);
	let message = format!(
		"page {} of tasks: {} shown, {} in total",
		page_number,
		summaries.len(),
		page.total()
	);
	success(summaries, message)
}

async fn get_post(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let project_id = args.required_str("project_id")?;
	let post_id = args.required_str("post_id")?;

	let post: Value = client
		.get(&["project", "v1", "projects", &project_id, "posts", &post_id])
		.invoke()
		.await?;
	success(post, "task retrieved")
}

/// Request body shared by task creation and update
fn post_request(args: &Arguments) -> Result<Value, DomainError> {
	let subject = args.required_str("subject")?;
	let body = args.required_str("body")?;
	let to = args.required_string_list("to_member_ids")?;
	let cc = args.optional_string_list("cc_member_ids")?.unwrap_or_default();
	let mime_type = args.one_of("mime_type", MIME_TYPES)?;
	let priority = args.one_of("priority", PRIORITIES)?;
	let due_date = args.optional_str("due_date")?;

	let mut request = json!({
		"users": {"to": members(to), "cc": members(cc)},
		"subject": subject,
		"body": {
			"mimeType": mime_type.as_deref().unwrap_or(MIME_TYPES[0]),
			"content": body,
		},
		"dueDateFlag": due_date.is_some(),
		"tagIds": args.optional_string_list("tag_ids")?.unwrap_or_default(),
		"priority": priority.as_deref().unwrap_or("none"),
	});
	if let Some(due_date) = due_date {
		request["dueDate"] = json!(due_date);
	}
	if let Some(milestone) = args.optional_str("milestone_id")? {
		request["milestoneId"] = json!(milestone);
	}
	Ok(request)
}

fn members(ids: Vec<String>) -> Vec<Value> {
	ids.into_iter()
		.map(|id| json!({"type": "member", "member": {"organizationMemberId": id}}))
		.collect()
}

async fn create_post(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let project_id = args.required_str("project_id")?;
	let mut request = post_request(&args)?;
	if let Some(parent) = args.optional_str("parent_post_id")? {
		request["parentPostId"] = json!(parent);
	}

	let created: Value = client
		.post(&["project", "v1", "projects", &project_id, "posts"])
		.json(&request)
		.invoke()
		.await?;
	success(created, "task created")
}

async fn update_post(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let project_id = args.required_str("project_id")?;
	let post_id = args.required_str("post_id")?;
	let mut request = post_request(&args)?;
	if let Some(version) = args.optional_u32("version")? {
		request["version"] = json!(version);
	}

	let envelope = client
		.put(&["project", "v1", "projects", &project_id, "posts", &post_id])
		.json(&request)
		.invoke_nullable::<Value>()
		.await?;
	ensure_successful(envelope)?;
	success(json!({"projectId": project_id, "postId": post_id}), "task updated")
}

async fn set_post_workflow(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let project_id = args.required_str("project_id")?;
	let post_id = args.required_str("post_id")?;
	let workflow_id = args.required_str("workflow_id")?;

	let envelope = client
		.post(&["project", "v1", "projects", &project_id, "posts", &post_id, "set-workflow"])
		.json(&json!({"workflowId": workflow_id}))
		.invoke_nullable::<Value>()
		.await?;
	ensure_successful(envelope)?;
	success(
		json!({"postId": post_id, "workflowId": workflow_id}),
		"task workflow changed",
	)
}

async fn set_post_done(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let project_id = args.required_str("project_id")?;
	let post_id = args.required_str("post_id")?;

	let envelope = client
		.post(&["project", "v1", "projects", &project_id, "posts", &post_id, "set-done"])
		.invoke_nullable::<Value>()
		.await?;
	ensure_successful(envelope)?;
	success(json!({"postId": post_id}), "task marked as done")
}

fn comment_body(args: &Arguments) -> Result<Value, DomainError> {
	let content = args.required_str("content")?;
	let mime_type = args.one_of("mime_type", MIME_TYPES)?;
	Ok(json!({
		"body": {
			"mimeType": mime_type.as_deref().unwrap_or(MIME_TYPES[0]),
			"content": content,
		}
	}))
}

async fn create_post_comment(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let project_id = args.required_str("project_id")?;
	let post_id = args.required_str("post_id")?;
	let request = comment_body(&args)?;

	let created: Value = client
		.post(&["project", "v1", "projects", &project_id, "posts", &post_id, "logs"])
		.json(&request)
		.invoke()
		.await?;
	success(created, "comment added")
}

async fn get_post_comments(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let project_id = args.required_str("project_id")?;
	let post_id = args.required_str("post_id")?;
	let page_number = args.optional_u32("page")?.unwrap_or(0);
	let page_size = args.optional_u32("size")?.unwrap_or(20);

	let page = client
		.get(&["project", "v1", "projects", &project_id, "posts", &post_id, "logs"])
		.param("page", Some(page_number))
		.param("size", Some(page_size))
		.param("order", args.one_of("order", &["createdAt", "-createdAt"])?)
		.invoke_page::<Value>()
		.await?;

	let total = page.total();
	let shown = page.items.len();
	success(
		json!({
			"comments": page.items,
			"totalCount": total,
			"currentPage": page_number,
			"pageSize": page_size,
		}),
		format!("{shown} comments shown, {total} in total"),
	)
}

async fn update_post_comment(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let project_id = args.required_str("project_id")?;
	let post_id = args.required_str("post_id")?;
	let log_id = args.required_str("log_id")?;
	let request = comment_body(&args)?;

	let envelope = client
		.put(&["project", "v1", "projects", &project_id, "posts", &post_id, "logs", &log_id])
		.json(&request)
		.invoke_nullable::<Value>()
		.await?;
	ensure_successful(envelope)?;
	success(json!({"postId": post_id, "logId": log_id}), "comment updated")
}

async fn delete_post_comment(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let project_id = args.required_str("project_id")?;
	let post_id = args.required_str("post_id")?;
	let log_id = args.required_str("log_id")?;

	let envelope = client
		.delete(&["project", "v1", "projects", &project_id, "posts", &post_id, "logs", &log_id])
		.invoke_nullable::<Value>()
		.await?;
	ensure_successful(envelope)?;
	success(json!({"postId": post_id, "logId": log_id}), "comment deleted")
}
