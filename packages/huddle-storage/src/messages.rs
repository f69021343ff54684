use serde_json::Value;

use crate::{
	Error, Result,
	db::Db,
	models::{Message, MessageRow, TimeRange},
};

impl Db {
	/// Newest first. Messages without a timestamp sort last.
	pub async fn fetch_recent_messages(
		&self,
		conversation_id: &str,
		limit: u32,
	) -> Result<Vec<Message>> {
		let rows: Vec<MessageRow> = sqlx::query_as(
			"\
SELECT message_id, sender_id, sender_username, text, ts, metadata
FROM messages
WHERE conversation_id = $1
ORDER BY ts DESC NULLS LAST, message_id
LIMIT $2",
		)
		.bind(conversation_id)
		.bind(i64::from(limit))
		.fetch_all(&self.pool)
		.await?;

		Ok(rows.into_iter().map(Message::from).collect())
	}

	pub async fn fetch_messages_between(
		&self,
		conversation_id: &str,
		range: &TimeRange,
		limit: u32,
	) -> Result<Vec<Message>> {
		let rows: Vec<MessageRow> = sqlx::query_as(
			"\
SELECT message_id, sender_id, sender_username, text, ts, metadata
FROM messages
WHERE conversation_id = $1
	AND ($2::timestamptz IS NULL OR ts >= $2)
	AND ($3::timestamptz IS NULL OR ts <= $3)
ORDER BY ts DESC NULLS LAST, message_id
LIMIT $4",
		)
		.bind(conversation_id)
		.bind(range.start)
		.bind(range.end)
		.bind(i64::from(limit))
		.fetch_all(&self.pool)
		.await?;

		Ok(rows.into_iter().map(Message::from).collect())
	}

	/// Inserts or replaces one mirrored message.
	pub async fn upsert_message(&self, conversation_id: &str, message: &Message) -> Result<()> {
		if conversation_id.trim().is_empty() || message.id.trim().is_empty() {
			return Err(Error::InvalidArgument(
				"conversation_id and message id must be non-empty.".to_string(),
			));
		}

		sqlx::query(
			"\
INSERT INTO messages (
	conversation_id,
	message_id,
	sender_id,
	sender_username,
	text,
	ts,
	metadata
)
VALUES ($1,$2,$3,$4,$5,$6,$7)
ON CONFLICT (conversation_id, message_id) DO UPDATE
SET
	sender_id = EXCLUDED.sender_id,
	sender_username = EXCLUDED.sender_username,
	text = EXCLUDED.text,
	ts = EXCLUDED.ts,
	metadata = EXCLUDED.metadata",
		)
		.bind(conversation_id)
		.bind(message.id.as_str())
		.bind(message.sender_id.as_deref())
		.bind(message.sender_username.as_deref())
		.bind(message.text.as_str())
		.bind(message.timestamp)
		.bind(Value::Object(message.metadata.clone()))
		.execute(&self.pool)
		.await?;

		Ok(())
	}
}
