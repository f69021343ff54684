use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, HuddleService, Result, search::ranking};
use huddle_storage::{
	models::{Message, TimeRange},
	time_serde,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRequest {
	#[serde(default)]
	pub conversation_id: Option<String>,
	/// RFC 3339 timestamp or `YYYY-MM-DD`, inclusive.
	#[serde(default)]
	pub start_date: Option<String>,
	#[serde(default)]
	pub end_date: Option<String>,
	#[serde(default)]
	pub keyword: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterResponse {
	/// Oldest first.
	pub messages: Vec<Message>,
	pub conversation_id: String,
	pub total_messages: usize,
}

impl HuddleService {
	/// Literal lookup over one conversation by date range and keyword. No embeddings involved.
	pub async fn filter_messages(&self, req: FilterRequest) -> Result<FilterResponse> {
		let Some(conversation_id) =
			req.conversation_id.as_deref().map(str::trim).filter(|id| !id.is_empty())
		else {
			return Err(Error::InvalidRequest {
				message: "conversationId is required.".to_string(),
			});
		};
		let range = TimeRange {
			start: parse_bound(req.start_date.as_deref(), "startDate")?,
			end: parse_bound(req.end_date.as_deref(), "endDate")?,
		};

		if let (Some(start), Some(end)) = (range.start, range.end)
			&& start > end
		{
			return Err(Error::InvalidRequest {
				message: "startDate must not be after endDate.".to_string(),
			});
		}

		let keyword = req.keyword.as_deref().map(str::trim).filter(|keyword| !keyword.is_empty());
		let fetched = self
			.store
			.fetch_messages_between(conversation_id, &range, self.cfg.search.filter_message_limit)
			.await?;
		let fetched_count = fetched.len();
		let mut messages: Vec<Message> = fetched
			.into_iter()
			.filter(|message| {
				keyword.is_none_or(|keyword| ranking::contains_ignore_case(&message.text, keyword))
			})
			.collect();

		// Stores return newest first.
		messages.reverse();

		tracing::info!(
			conversation_id,
			fetched = fetched_count,
			matched = messages.len(),
			"Message filter completed."
		);

		Ok(FilterResponse {
			total_messages: messages.len(),
			messages,
			conversation_id: conversation_id.to_string(),
		})
	}
}

fn parse_bound(raw: Option<&str>, label: &str) -> Result<Option<OffsetDateTime>> {
	let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else { return Ok(None) };

	time_serde::parse_timestamp(raw).map(Some).map_err(|err| Error::InvalidRequest {
		message: format!("{label} must be an RFC 3339 timestamp or a YYYY-MM-DD date: {err}."),
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn blank_bounds_are_open() {
		assert_eq!(parse_bound(None, "startDate").expect("bound"), None);
		assert_eq!(parse_bound(Some("  "), "startDate").expect("bound"), None);
	}

	#[test]
	fn invalid_bounds_are_rejected() {
		let err = parse_bound(Some("next tuesday"), "endDate").expect_err("Expected an error.");

		assert!(err.to_string().contains("endDate must be an RFC 3339 timestamp"));
	}

	#[test]
	fn date_only_bounds_parse() {
		let bound = parse_bound(Some("2025-03-04"), "startDate").expect("bound").expect("some");

		assert_eq!((bound.year(), bound.hour()), (2025, 0));
	}
}
