use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A messenger channel as returned by `GET /messenger/v1/channels`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
	pub id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
	/// "direct", "private", "me" or "bot"
	#[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
	pub kind: Option<String>,
	/// "system", "normal", "archived" or "deleted"
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub users: Option<ChannelUsers>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub created_at: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub updated_at: Option<String>,
	/// Remaining fields, kept so full channel listings are not lossy
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelUsers {
	#[serde(default)]
	pub participants: Vec<ChannelParticipant>,
}

/// Participants are kept opaque; only their number is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelParticipant(pub Value);

/// Reduced channel view for listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleChannel {
	pub id: String,
	pub title: Option<String>,
	#[serde(rename = "type")]
	pub kind: Option<String>,
	pub status: Option<String>,
	pub updated_at: Option<String>,
	pub participant_count: Option<usize>,
}
