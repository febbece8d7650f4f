use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
	pub organization_member_id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
	pub id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
}

/// One addressee of a post: a member, an email user or a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostUser {
	#[serde(rename = "type")]
	pub kind: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub member: Option<Member>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostUsers {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub from: Option<PostUser>,
	#[serde(default)]
	pub to: Vec<PostUser>,
	#[serde(default)]
	pub cc: Vec<PostUser>,
}

/// A project task as returned by `GET /project/v1/projects/{id}/posts`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
	pub id: String,
	pub subject: String,
	#[serde(default)]
	pub task_number: Option<String>,
	/// "backlog", "registered", "working" or "closed"
	#[serde(default)]
	pub workflow_class: Option<String>,
	#[serde(default)]
	pub workflow: Option<Workflow>,
	#[serde(default)]
	pub users: PostUsers,
	#[serde(default)]
	pub priority: Option<String>,
	#[serde(default)]
	pub due_date: Option<String>,
	#[serde(default)]
	pub created_at: Option<String>,
	#[serde(default)]
	pub updated_at: Option<String>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// Reduced post view: identity, state, schedule and assignees only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
	pub id: String,
	pub subject: String,
	pub task_number: Option<String>,
	pub workflow_class: Option<String>,
	pub workflow: Option<Workflow>,
	/// Member addressees of the post; email users and groups are left out
	pub assignees: Vec<Member>,
	pub priority: Option<String>,
	pub due_date: Option<String>,
	pub created_at: Option<String>,
	pub updated_at: Option<String>,
}
