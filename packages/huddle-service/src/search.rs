pub mod ranking;

use std::time::Duration;

use futures::{StreamExt, stream};
use serde::{Deserialize, Serialize};

use crate::{Error, HuddleService, Result};
use huddle_config::{EmbeddingFailurePolicy, EmbeddingProviderConfig, Search};
use huddle_storage::models::Message;
use ranking::KeywordRules;

/// Validation message for a search without a usable `conversationId` or `query`.
pub const REQUIRED_FIELDS: &str = "conversationId and query are required";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
	#[serde(default)]
	pub conversation_id: Option<String>,
	#[serde(default)]
	pub query: Option<String>,
	/// Candidate limit. Defaults to `search.default_candidate_limit`.
	#[serde(default)]
	pub message_count: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredMessage {
	#[serde(flatten)]
	pub message: Message,
	pub semantic_score: f32,
	pub has_keyword_match: bool,
	pub similarity: f32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
	pub results: Vec<ScoredMessage>,
	pub query: String,
	pub conversation_id: String,
	/// Candidates fetched from the store, including any skipped ones.
	pub total_messages: usize,
	pub max_score: f32,
	pub skipped_messages: usize,
}

impl HuddleService {
	/// Ranks the most recent messages of one conversation against a free-text query.
	pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		let conversation_id = required(req.conversation_id.as_deref());
		let query = required(req.query.as_deref());
		let (Some(conversation_id), Some(query)) = (conversation_id, query) else {
			return Err(Error::InvalidRequest { message: REQUIRED_FIELDS.to_string() });
		};
		let limit = resolve_candidate_limit(req.message_count, &self.cfg.search)?;
		let deadline_ms = self.cfg.search.deadline_ms;

		match tokio::time::timeout(
			Duration::from_millis(deadline_ms),
			self.search_within_deadline(conversation_id, query, limit),
		)
		.await
		{
			Ok(result) => result,
			Err(_) => {
				tracing::warn!(conversation_id, deadline_ms, "Search exceeded its deadline.");

				Err(Error::Timeout {
					message: format!("Search did not finish within {deadline_ms} ms."),
				})
			},
		}
	}

	async fn search_within_deadline(
		&self,
		conversation_id: &str,
		query: &str,
		limit: u32,
	) -> Result<SearchResponse> {
		let candidates = self.store.fetch_recent_messages(conversation_id, limit).await?;
		let total_messages = candidates.len();

		if candidates.is_empty() {
			tracing::info!(conversation_id, "No candidate messages to search.");

			return Ok(SearchResponse {
				results: Vec::new(),
				query: query.to_string(),
				conversation_id: conversation_id.to_string(),
				total_messages: 0,
				max_score: 0.0,
				skipped_messages: 0,
			});
		}

		let embedding_cfg = &self.cfg.providers.embedding;
		let (query_vec, candidate_vecs) = tokio::try_join!(
			self.embed_one(embedding_cfg, query.to_string()),
			self.embed_candidates(embedding_cfg, &candidates),
		)?;
		let rules = KeywordRules::from(&self.cfg.search.keyword);
		let boost = self.cfg.search.keyword_boost;
		let mut skipped_messages = 0;
		let mut scored = Vec::with_capacity(candidates.len());

		for (message, vec) in candidates.into_iter().zip(candidate_vecs) {
			let Some(vec) = vec else {
				skipped_messages += 1;

				continue;
			};
			let semantic_score = ranking::cosine_similarity(&query_vec, &vec);
			let has_keyword_match = ranking::keyword_match(query, &message.text, &rules).is_some();
			let similarity = ranking::combine_scores(semantic_score, has_keyword_match, boost);

			scored.push(ScoredMessage { message, semantic_score, has_keyword_match, similarity });
		}

		let ranked = ranking::rank_candidates(
			scored,
			self.cfg.search.similarity_threshold,
			self.cfg.search.max_results as usize,
		);

		tracing::info!(
			conversation_id,
			candidates = total_messages,
			skipped = skipped_messages,
			results = ranked.results.len(),
			max_score = ranked.max_score,
			"Search completed."
		);

		Ok(SearchResponse {
			results: ranked.results,
			query: query.to_string(),
			conversation_id: conversation_id.to_string(),
			total_messages,
			max_score: ranked.max_score,
			skipped_messages,
		})
	}

	// One embedding call per candidate, at most `max_concurrency` in flight, results in candidate
	// order. `None` marks a candidate skipped under the skip policy.
	async fn embed_candidates(
		&self,
		cfg: &EmbeddingProviderConfig,
		candidates: &[Message],
	) -> Result<Vec<Option<Vec<f32>>>> {
		let policy = self.cfg.search.on_embedding_failure;
		let concurrency = (self.cfg.search.max_concurrency as usize).max(1);
		// Owned inputs: a closure taking `&Message` would leave the search future not `Send`.
		let inputs: Vec<(usize, String)> =
			candidates.iter().map(|message| message.text.clone()).enumerate().collect();
		let mut embeddings = stream::iter(inputs.into_iter().map(move |(idx, text)| async move {
			(idx, self.embed_one(cfg, text).await)
		}))
		.buffered(concurrency);
		let mut out = Vec::with_capacity(candidates.len());

		while let Some((idx, result)) = embeddings.next().await {
			match (result, policy) {
				(Ok(vec), _) => out.push(Some(vec)),
				(Err(err), EmbeddingFailurePolicy::Fail) => return Err(err),
				(Err(err), EmbeddingFailurePolicy::Skip) => {
					tracing::warn!(
						message_id = candidates[idx].id.as_str(),
						error = %err,
						"Skipping candidate whose embedding failed."
					);

					out.push(None);
				},
			}
		}

		Ok(out)
	}

	async fn embed_one(&self, cfg: &EmbeddingProviderConfig, text: String) -> Result<Vec<f32>> {
		let texts = [text];
		let mut vectors = self.providers.embedding.embed(cfg, &texts).await?;

		if vectors.len() != 1 {
			return Err(Error::Provider {
				message: format!("Embedding provider returned {} vectors for 1 input.", vectors.len()),
			});
		}

		Ok(vectors.swap_remove(0))
	}
}

fn required(value: Option<&str>) -> Option<&str> {
	value.map(str::trim).filter(|value| !value.is_empty())
}

fn resolve_candidate_limit(message_count: Option<i64>, cfg: &Search) -> Result<u32> {
	let Some(count) = message_count else { return Ok(cfg.default_candidate_limit) };

	if count < 1 {
		return Err(Error::InvalidRequest {
			message: "messageCount must be at least 1.".to_string(),
		});
	}

	Ok(u32::try_from(count).unwrap_or(u32::MAX).min(cfg.max_candidate_limit))
}
