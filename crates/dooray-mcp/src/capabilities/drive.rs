use serde_json::{Map, Value, json};

use super::{
	boolean, capability, ensure_successful, object_schema, one_of, page, size, string, string_list,
	success,
};
use crate::args::Arguments;
use crate::category::Category;
use crate::error::DomainError;
use crate::registry::Capability;
use crate::remote::DoorayClient;

const FILE_TYPES: &[&str] = &["folder", "file"];
const LINK_SCOPES: &[&str] = &["member", "memberAndGuest", "memberAndGuestAndExternal"];
const DEFAULT_LINK_SCOPE: &str = "memberAndGuest";
const TRASH: &str = "trash";

pub(super) fn capabilities(client: &DoorayClient) -> Vec<Capability> {
	vec![
		capability(
			client,
			Category::Drive,
			"dooray_drive_list",
			"List the drives the caller can access (personal and project drives).",
			object_schema(
				json!({
					"type": one_of("Drive type", &["private", "project"]),
					"project_id": string("Only the drive of this project"),
				}),
				&[],
			),
			list_drives,
		),
		capability(
			client,
			Category::Drive,
			"dooray_drive_get_detail",
			"Get one drive.",
			drive_schema(),
			drive_detail,
		),
		capability(
			client,
			Category::Drive,
			"dooray_drive_list_files",
			"List the files and folders inside a drive folder.",
			object_schema(
				json!({
					"drive_id": string("Drive ID"),
					"parent_id": string("Folder ID; the drive root when omitted"),
					"type": one_of("Only folders or only files", FILE_TYPES),
					"sub_types": string_list("File sub types (e.g. root, trash, users)"),
					"page": page(),
					"size": size(20),
				}),
				&["drive_id"],
			),
			list_files,
		),
		capability(
			client,
			Category::Drive,
			"dooray_drive_get_changes",
			"List recent changes (updates and deletions) of files in a drive.",
			object_schema(
				json!({
					"drive_id": string("Drive ID"),
					"latest_revision": string("Only changes after this revision (default 0)"),
					"file_id": string("With latest_revision, only changes after this file"),
					"size": size(20),
				}),
				&["drive_id"],
			),
			drive_changes,
		),
		capability(
			client,
			Category::Drive,
			"dooray_drive_get_file_metadata",
			"Get the metadata of a file or folder.",
			file_schema(json!({}), &[]),
			file_metadata,
		),
		capability(
			client,
			Category::Drive,
			"dooray_drive_create_folder",
			"Create a folder inside a parent folder.",
			object_schema(
				json!({
					"drive_id": string("Drive ID"),
					"parent_folder_id": string("Parent folder ID"),
					"name": string("Folder name"),
				}),
				&["drive_id", "parent_folder_id", "name"],
			),
			create_folder,
		),
		capability(
			client,
			Category::Drive,
			"dooray_drive_rename_file",
			"Rename a file or folder.",
			file_schema(json!({"name": string("New name")}), &["name"]),
			rename_file,
		),
		capability(
			client,
			Category::Drive,
			"dooray_drive_copy_file",
			"Copy a file into a folder, possibly in another drive.",
			file_schema(
				json!({
					"destination_drive_id": string("Target drive ID"),
					"destination_folder_id": string("Target folder ID"),
				}),
				&["destination_drive_id", "destination_folder_id"],
			),
			copy_file,
		),
		capability(
			client,
			Category::Drive,
			"dooray_drive_move_file",
			"Move a file into another folder of the same drive.",
			file_schema(
				json!({"destination_folder_id": string("Target folder ID")}),
				&["destination_folder_id"],
			),
			move_file,
		),
		capability(
			client,
			Category::Drive,
			"dooray_drive_move_to_trash",
			"Move a file or folder to the drive's trash.",
			file_schema(json!({}), &[]),
			move_to_trash,
		),
		capability(
			client,
			Category::Drive,
			"dooray_drive_delete_file",
			"Permanently delete a file. Only files already in the trash can be deleted.",
			file_schema(json!({}), &[]),
			delete_file,
		),
		capability(
			client,
			Category::Drive,
			"dooray_drive_create_shared_link",
			"Create a shared link to a file.",
			file_schema(
				json!({
					"expired_at": string("Expiry, ISO 8601 (e.g. 2025-12-31T23:59:59+09:00)"),
					"scope": one_of("Who can open the link (default memberAndGuest)", LINK_SCOPES),
				}),
				&["expired_at"],
			),
			create_shared_link,
		),
		capability(
			client,
			Category::Drive,
			"dooray_drive_get_shared_links",
			"List the shared links of a file.",
			file_schema(
				json!({"valid": boolean("true for unexpired links only, false for expired links only")}),
				&[],
			),
			shared_links,
		),
		capability(
			client,
			Category::Drive,
			"dooray_drive_get_shared_link_detail",
			"Get one shared link of a file.",
			link_schema(json!({})),
			shared_link_detail,
		),
		capability(
			client,
			Category::Drive,
			"dooray_drive_update_shared_link",
			"Change the expiry or scope of a shared link.",
			link_schema(json!({
				"expired_at": string("New expiry, ISO 8601"),
				"scope": one_of("New scope", LINK_SCOPES),
			})),
			update_shared_link,
		),
		capability(
			client,
			Category::Drive,
			"dooray_drive_delete_shared_link",
			"Delete a shared link.",
			link_schema(json!({})),
			delete_shared_link,
		),
	]
}

fn drive_schema() -> Value {
	object_schema(json!({"drive_id": string("Drive ID")}), &["drive_id"])
}

/// Schema for calls addressing one file, extended with `extra` properties.
fn file_schema(extra: Value, extra_required: &[&str]) -> Value {
	extended_schema(
		json!({
			"drive_id": string("Drive ID"),
			"file_id": string("File or folder ID"),
		}),
		&["drive_id", "file_id"],
		extra,
		extra_required,
	)
}

/// Schema for calls addressing one shared link; `extra` properties are optional.
fn link_schema(extra: Value) -> Value {
	extended_schema(
		json!({
			"drive_id": string("Drive ID"),
			"file_id": string("File ID"),
			"link_id": string("Shared link ID"),
		}),
		&["drive_id", "file_id", "link_id"],
		extra,
		&[],
	)
}

fn extended_schema(base: Value, base_required: &[&str], extra: Value, extra_required: &[&str]) -> Value {
	let mut properties = Map::new();
	for part in [base, extra] {
		if let Value::Object(part) = part {
			properties.extend(part);
		}
	}
	let required: Vec<&str> = base_required.iter().chain(extra_required).copied().collect();
	object_schema(Value::Object(properties), &required)
}

fn file_path<'a>(drive_id: &'a str, file_id: &'a str) -> [&'a str; 6] {
	["drive", "v1", "drives", drive_id, "files", file_id]
}

async fn list_drives(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let page = client
		.get(&["drive", "v1", "drives"])
		.param("type", args.one_of("type", &["private", "project"])?)
		.param("projectId", args.optional_str("project_id")?)
		.invoke_page::<Value>()
		.await?;
	let total = page.total();
	success(
		json!({"drives": page.items, "totalCount": total}),
		format!("found {total} drives"),
	)
}

async fn drive_detail(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let drive_id = args.required_str("drive_id")?;
	let drive: Value = client
		.get(&["drive", "v1", "drives", &drive_id])
		.invoke()
		.await?;
	success(drive, "drive retrieved")
}

async fn list_files(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let drive_id = args.required_str("drive_id")?;
	let sub_types = args.optional_string_list("sub_types")?;
	let page = client
		.get(&["drive", "v1", "drives", &drive_id, "files"])
		.param("parentId", args.optional_str("parent_id")?)
		.param("type", args.one_of("type", FILE_TYPES)?)
		.list_param("subTypes", sub_types.as_deref())
		.param("page", args.optional_u32("page")?)
		.param("size", args.optional_u32("size")?)
		.invoke_page::<Value>()
		.await?;
	let total = page.total();
	success(
		json!({"files": page.items, "totalCount": total}),
		format!("found {total} files"),
	)
}

async fn drive_changes(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let drive_id = args.required_str("drive_id")?;
	let changes: Vec<Value> = client
		.get(&["drive", "v1", "drives", &drive_id, "changes"])
		.param("latestRevision", args.optional_str("latest_revision")?)
		.param("fileId", args.optional_str("file_id")?)
		.param("size", args.optional_u32("size")?)
		.invoke()
		.await?;

	let count = |kind: &str| changes.iter().filter(|c| c["changeType"] == kind).count();
	let (updated, deleted) = (count("updated"), count("deleted"));
	let total = changes.len();
	success(
		changes,
		format!("found {total} changes ({updated} updated, {deleted} deleted)"),
	)
}

async fn file_metadata(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let drive_id = args.required_str("drive_id")?;
	let file_id = args.required_str("file_id")?;
	let metadata: Value = client
		.get(&file_path(&drive_id, &file_id))
		.param("media", Some("meta"))
		.invoke()
		.await?;
	success(metadata, "file metadata retrieved")
}

async fn create_folder(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let drive_id = args.required_str("drive_id")?;
	let parent_id = args.required_str("parent_folder_id")?;
	let name = args.required_str("name")?;

	let created: Value = client
		.post(&["drive", "v1", "drives", &drive_id, "files", &parent_id, "create-folder"])
		.json(&json!({"name": name}))
		.invoke()
		.await?;
	success(created, format!("folder '{name}' created"))
}

async fn rename_file(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let drive_id = args.required_str("drive_id")?;
	let file_id = args.required_str("file_id")?;
	let name = args.required_str("name")?;

	let envelope = client
		.put(&file_path(&drive_id, &file_id))
		.param("media", Some("meta"))
		.json(&json!({"name": name}))
		.invoke_nullable::<Value>()
		.await?;
	ensure_successful(envelope)?;
	success(
		json!({"driveId": drive_id, "fileId": file_id, "name": name}),
		format!("renamed to '{name}'"),
	)
}

async fn copy_file(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let drive_id = args.required_str("drive_id")?;
	let file_id = args.required_str("file_id")?;
	let target_drive = args.required_str("destination_drive_id")?;
	let target_folder = args.required_str("destination_folder_id")?;

	let copied: Value = client
		.post(&["drive", "v1", "drives", &drive_id, "files", &file_id, "copy"])
		.json(&json!({"destinationDriveId": target_drive, "destinationFileId": target_folder}))
		.invoke()
		.await?;
	success(copied, "file copied")
}

async fn relocate(
	client: &DoorayClient,
	drive_id: &str,
	file_id: &str,
	destination: &str,
) -> Result<Option<Value>, DomainError> {
	let envelope = client
		.post(&["drive", "v1", "drives", drive_id, "files", file_id, "move"])
		.json(&json!({"destinationFileId": destination}))
		.invoke_nullable::<Value>()
		.await?;
	ensure_successful(envelope)
}

async fn move_file(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let drive_id = args.required_str("drive_id")?;
	let file_id = args.required_str("file_id")?;
	let destination = args.required_str("destination_folder_id")?;

	let moved = relocate(&client, &drive_id, &file_id, &destination).await?;
	success(
		json!({"driveId": drive_id, "fileId": file_id, "destinationFolderId": destination, "result": moved}),
		"file moved",
	)
}

async fn move_to_trash(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let drive_id = args.required_str("drive_id")?;
	let file_id = args.required_str("file_id")?;

	relocate(&client, &drive_id, &file_id, TRASH).await?;
	success(json!({"driveId": drive_id, "fileId": file_id}), "file moved to trash")
}

async fn delete_file(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let drive_id = args.required_str("drive_id")?;
	let file_id = args.required_str("file_id")?;

	let envelope = client
		.delete(&file_path(&drive_id, &file_id))
		.invoke_nullable::<Value>()
		.await?;
	ensure_successful(envelope)?;
	success(json!({"driveId": drive_id, "fileId": file_id}), "file deleted")
}

fn links_path<'a>(drive_id: &'a str, file_id: &'a str) -> Vec<&'a str> {
	vec!["drive", "v1", "drives", drive_id, "files", file_id, "shared-links"]
}

async fn create_shared_link(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let drive_id = args.required_str("drive_id")?;
	let file_id = args.required_str("file_id")?;
	let expired_at = args.required_str("expired_at")?;
	let scope = args
		.one_of("scope", LINK_SCOPES)?
		.unwrap_or_else(|| DEFAULT_LINK_SCOPE.to_string());

	let created: Value = client
		.post(&links_path(&drive_id, &file_id))
		.json(&json!({"scope": scope, "expiredAt": expired_at}))
		.invoke()
		.await?;
	success(created, format!("shared link created ({scope}, expires {expired_at})"))
}

async fn shared_links(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let drive_id = args.required_str("drive_id")?;
	let file_id = args.required_str("file_id")?;

	let page = client
		.get(&links_path(&drive_id, &file_id))
		.param("valid", args.optional_bool("valid")?)
		.invoke_page::<Value>()
		.await?;
	let total = page.total();
	success(
		json!({"sharedLinks": page.items, "totalCount": total}),
		format!("found {total} shared links"),
	)
}

async fn shared_link_detail(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let drive_id = args.required_str("drive_id")?;
	let file_id = args.required_str("file_id")?;
	let link_id = args.required_str("link_id")?;

	let mut path = links_path(&drive_id, &file_id);
	path.push(&link_id);
	let link: Value = client.get(&path).invoke().await?;
	success(link, "shared link retrieved")
}

async fn update_shared_link(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let drive_id = args.required_str("drive_id")?;
	let file_id = args.required_str("file_id")?;
	let link_id = args.required_str("link_id")?;

	let mut request = Map::new();
	if let Some(expired_at) = args.optional_str("expired_at")? {
		request.insert("expiredAt".into(), json!(expired_at));
	}
	if let Some(scope) = args.one_of("scope", LINK_SCOPES)? {
		request.insert("scope".into(), json!(scope));
	}
	if request.is_empty() {
		return Err(
			DomainError::validation("nothing to update: give expired_at and/or scope")
				.with_code("NOTHING_TO_UPDATE"),
		);
	}

	let mut path = links_path(&drive_id, &file_id);
	path.push(&link_id);
	let envelope = client
		.put(&path)
		.json(&request)
		.invoke_nullable::<Value>()
		.await?;
	ensure_successful(envelope)?;
	success(
		json!({"driveId": drive_id, "fileId": file_id, "linkId": link_id, "changes": request}),
		"shared link updated",
	)
}

async fn delete_shared_link(client: DoorayClient, args: Arguments) -> Result<Value, DomainError> {
	let drive_id = args.required_str("drive_id")?;
	let file_id = args.required_str("file_id")?;
	let link_id = args.required_str("link_id")?;

	let mut path = links_path(&drive_id, &file_id);
	path.push(&link_id);
	let envelope = client
		.delete(&path)
		.invoke_nullable::<Value>()
		.await?;
	ensure_successful(envelope)?;
	success(
		json!({"driveId": drive_id, "fileId": file_id, "linkId": link_id}),
		"shared link deleted",
	)
}
