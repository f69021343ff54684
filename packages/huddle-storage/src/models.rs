use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

/// A chat message as stored for one conversation. Fields the search path does not read are kept
/// in `metadata` and written back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
	#[serde(rename = "messageId")]
	pub id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub sender_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub sender_username: Option<String>,
	#[serde(default)]
	pub text: String,
	#[serde(
		default,
		with = "crate::time_serde::option",
		skip_serializing_if = "Option::is_none"
	)]
	pub timestamp: Option<OffsetDateTime>,
	#[serde(flatten)]
	pub metadata: Map<String, Value>,
}
impl Message {
	pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			sender_id: None,
			sender_username: None,
			text: text.into(),
			timestamp: None,
			metadata: Map::new(),
		}
	}
}

/// Inclusive bounds on message timestamps. An open side is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
	pub start: Option<OffsetDateTime>,
	pub end: Option<OffsetDateTime>,
}
impl TimeRange {
	pub fn is_unbounded(&self) -> bool {
		self.start.is_none() && self.end.is_none()
	}

	pub fn contains(&self, ts: Option<OffsetDateTime>) -> bool {
		if self.is_unbounded() {
			return true;
		}

		let Some(ts) = ts else { return false };

		self.start.is_none_or(|start| ts >= start) && self.end.is_none_or(|end| ts <= end)
	}
}

#[derive(Debug, sqlx::FromRow)]
pub struct MessageRow {
	pub message_id: String,
	pub sender_id: Option<String>,
	pub sender_username: Option<String>,
	pub text: String,
	pub ts: Option<OffsetDateTime>,
	pub metadata: Value,
}
impl From<MessageRow> for Message {
	fn from(row: MessageRow) -> Self {
		let metadata = match row.metadata {
			Value::Object(map) => map,
			_ => Map::new(),
		};

		Self {
			id: row.message_id,
			sender_id: row.sender_id,
			sender_username: row.sender_username,
			text: row.text,
			timestamp: row.ts,
			metadata,
		}
	}
}
