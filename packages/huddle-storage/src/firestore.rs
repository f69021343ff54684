//! Read-only message access over the Firestore REST API.
//!
//! Messages live at `{conversations}/{conversationId}/{messages}/{messageId}` and are queried with
//! `runQuery`, newest first by their `timestamp` field.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde_json::{Map, Number, Value};

use crate::{
	Error, Result,
	models::{Message, TimeRange},
	time_serde,
};
use huddle_config::Firestore;

const TIMESTAMP_FIELD: &str = "timestamp";

pub struct FirestoreStore {
	client: Client,
	cfg: Firestore,
}
impl FirestoreStore {
	pub fn new(cfg: &Firestore) -> Result<Self> {
		let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;

		Ok(Self { client, cfg: cfg.clone() })
	}

	pub async fn fetch_recent_messages(
		&self,
		conversation_id: &str,
		limit: u32,
	) -> Result<Vec<Message>> {
		let query = build_structured_query(&self.cfg.messages_collection, None, limit)?;

		self.run_query(conversation_id, query).await
	}

	pub async fn fetch_messages_between(
		&self,
		conversation_id: &str,
		range: &TimeRange,
		limit: u32,
	) -> Result<Vec<Message>> {
		let query = build_structured_query(&self.cfg.messages_collection, Some(range), limit)?;

		self.run_query(conversation_id, query).await
	}

	fn run_query_url(&self, conversation_id: &str) -> Result<Url> {
		let mut url = Url::parse(&self.cfg.api_base).map_err(|err| {
			Error::InvalidArgument(format!("storage.firestore.api_base is not a valid URL: {err}."))
		})?;

		url.path_segments_mut()
			.map_err(|_| {
				Error::InvalidArgument("storage.firestore.api_base cannot be a base URL.".to_string())
			})?
			.pop_if_empty()
			.extend([
				"projects",
				self.cfg.project_id.as_str(),
				"databases",
				self.cfg.database.as_str(),
				"documents",
				self.cfg.conversations_collection.as_str(),
			])
			.push(&format!("{conversation_id}:runQuery"));

		Ok(url)
	}

	async fn run_query(&self, conversation_id: &str, query: Value) -> Result<Vec<Message>> {
		let url = self.run_query_url(conversation_id)?;
		let res = self
			.client
			.post(url)
			.headers(huddle_providers::auth_headers(
				&self.cfg.access_token,
				&self.cfg.default_headers,
			)?)
			.json(&query)
			.send()
			.await?;

		if res.status() == StatusCode::NOT_FOUND {
			tracing::debug!(conversation_id, "Conversation not found; treating as empty.");

			return Ok(Vec::new());
		}

		let json: Value = res.error_for_status()?.json().await?;

		parse_run_query_response(json)
	}
}

pub(crate) fn build_structured_query(
	collection: &str,
	range: Option<&TimeRange>,
	limit: u32,
) -> Result<Value> {
	let mut structured = Map::new();

	structured.insert("from".to_string(), serde_json::json!([{ "collectionId": collection }]));

	if let Some(filter) = range.map(range_filter).transpose()?.flatten() {
		structured.insert("where".to_string(), filter);
	}

	structured.insert(
		"orderBy".to_string(),
		serde_json::json!([{ "field": { "fieldPath": TIMESTAMP_FIELD }, "direction": "DESCENDING" }]),
	);
	structured.insert("limit".to_string(), Value::from(limit));

	Ok(serde_json::json!({ "structuredQuery": structured }))
}

fn range_filter(range: &TimeRange) -> Result<Option<Value>> {
	let mut filters = Vec::new();

	for (bound, op) in
		[(range.start, "GREATER_THAN_OR_EQUAL"), (range.end, "LESS_THAN_OR_EQUAL")]
	{
		let Some(bound) = bound else { continue };
		let formatted = time_serde::format_timestamp(&bound).map_err(|err| {
			Error::InvalidArgument(format!("Range bound cannot be formatted: {err}."))
		})?;

		filters.push(serde_json::json!({
			"fieldFilter": {
				"field": { "fieldPath": TIMESTAMP_FIELD },
				"op": op,
				"value": { "timestampValue": formatted },
			}
		}));
	}

	Ok(match filters.len() {
		0 => None,
		1 => filters.pop(),
		_ => Some(serde_json::json!({ "compositeFilter": { "op": "AND", "filters": filters } })),
	})
}

pub(crate) fn parse_run_query_response(json: Value) -> Result<Vec<Message>> {
	let Value::Array(items) = json else {
		return Err(Error::InvalidResponse("runQuery response must be an array.".to_string()));
	};
	let mut messages = Vec::with_capacity(items.len());

	for item in items {
		// Result batches without a document only carry readTime or progress fields.
		let Some(document) = item.get("document") else { continue };

		messages.push(document_to_message(document)?);
	}

	Ok(messages)
}

fn document_to_message(document: &Value) -> Result<Message> {
	let name = document
		.get("name")
		.and_then(Value::as_str)
		.ok_or_else(|| Error::InvalidResponse("Document is missing its name.".to_string()))?;
	let id = name.rsplit('/').next().unwrap_or(name).to_string();
	let mut fields = match document.get("fields") {
		Some(Value::Object(fields)) => decode_fields(fields)?,
		_ => Map::new(),
	};
	let text = take_string(&mut fields, "text").unwrap_or_default();
	let sender_id = take_string(&mut fields, "senderId");
	let sender_username = take_string(&mut fields, "senderUsername");
	let timestamp = match fields.remove(TIMESTAMP_FIELD) {
		Some(Value::String(raw)) => Some(time_serde::parse_timestamp(&raw).map_err(|err| {
			Error::InvalidResponse(format!("Message {id} has an invalid timestamp: {err}."))
		})?),
		Some(Value::Null) | None => None,
		Some(other) => {
			fields.insert(TIMESTAMP_FIELD.to_string(), other);

			None
		},
	};

	fields.remove("messageId");

	Ok(Message { id, sender_id, sender_username, text, timestamp, metadata: fields })
}

fn take_string(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
	match fields.remove(key) {
		Some(Value::String(value)) => Some(value),
		Some(Value::Null) | None => None,
		Some(other) => {
			fields.insert(key.to_string(), other);

			None
		},
	}
}

fn decode_fields(fields: &Map<String, Value>) -> Result<Map<String, Value>> {
	let mut out = Map::with_capacity(fields.len());

	for (key, value) in fields {
		out.insert(key.clone(), decode_value(value)?);
	}

	Ok(out)
}

/// Converts one typed Firestore value (`{"stringValue": ..}` and friends) into plain JSON.
pub(crate) fn decode_value(value: &Value) -> Result<Value> {
	let Value::Object(typed) = value else {
		return Err(Error::InvalidResponse("Firestore value must be an object.".to_string()));
	};
	let Some((kind, inner)) = typed.iter().next() else {
		return Ok(Value::Null);
	};
	let decoded = match kind.as_str() {
		"nullValue" => Value::Null,
		"booleanValue" => Value::Bool(inner.as_bool().unwrap_or_default()),
		"integerValue" => match inner {
			Value::String(raw) => raw.parse::<i64>().map(Value::from).map_err(|_| {
				Error::InvalidResponse(format!("Invalid Firestore integer {raw:?}."))
			})?,
			other => other.clone(),
		},
		"doubleValue" => match inner {
			Value::Number(_) => inner.clone(),
			Value::String(raw) =>
				raw.parse::<f64>().ok().and_then(Number::from_f64).map_or(Value::Null, Value::Number),
			_ => Value::Null,
		},
		"stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
		"geoPointValue" => inner.clone(),
		"arrayValue" => {
			let values = inner.get("values").and_then(Value::as_array);
			let mut out = Vec::with_capacity(values.map_or(0, Vec::len));

			for item in values.into_iter().flatten() {
				out.push(decode_value(item)?);
			}

			Value::Array(out)
		},
		"mapValue" => match inner.get("fields") {
			Some(Value::Object(fields)) => Value::Object(decode_fields(fields)?),
			_ => Value::Object(Map::new()),
		},
		other => {
			tracing::debug!(kind = other, "Unknown Firestore value kind kept as-is.");

			inner.clone()
		},
	};

	Ok(decoded)
}
