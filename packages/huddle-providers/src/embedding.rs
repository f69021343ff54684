use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};
use huddle_config::EmbeddingProviderConfig;

/// OpenAI-compatible `/embeddings` client. One instance is shared by all searches so connections
/// are pooled across the per-candidate fan-out.
#[derive(Debug, Clone)]
pub struct HttpEmbedder {
	client: Client,
}
impl HttpEmbedder {
	pub fn new(cfg: &EmbeddingProviderConfig) -> Result<Self> {
		let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;

		Ok(Self { client })
	}

	pub async fn embed(
		&self,
		cfg: &EmbeddingProviderConfig,
		texts: &[String],
	) -> Result<Vec<Vec<f32>>> {
		if texts.is_empty() {
			return Ok(Vec::new());
		}

		let url = format!("{}{}", cfg.api_base, cfg.path);
		let body = serde_json::json!({
			"model": cfg.model,
			"input": texts,
			"dimensions": cfg.dimensions,
		});
		let res = self
			.client
			.post(url)
			.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
			.json(&body)
			.send()
			.await?;
		let json: Value = res.error_for_status()?.json().await?;
		let vectors = parse_embedding_response(json)?;

		if vectors.len() != texts.len() {
			return Err(Error::InvalidResponse {
				message: format!(
					"Embedding provider returned {} vectors for {} inputs.",
					vectors.len(),
					texts.len()
				),
			});
		}
		if let Some(bad) = vectors.iter().find(|vec| vec.len() != cfg.dimensions as usize) {
			return Err(Error::InvalidResponse {
				message: format!(
					"Embedding vector dimension mismatch; expected {}, got {}.",
					cfg.dimensions,
					bad.len()
				),
			});
		}

		tracing::trace!(
			provider_id = cfg.provider_id.as_str(),
			model = cfg.model.as_str(),
			inputs = texts.len(),
			"Embedding request completed."
		);

		Ok(vectors)
	}
}

fn parse_embedding_response(json: Value) -> Result<Vec<Vec<f32>>> {
	let data = json.get("data").and_then(|v| v.as_array()).ok_or_else(|| {
		Error::InvalidResponse { message: "Embedding response is missing data array.".to_string() }
	})?;
	let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());

	for (fallback_index, item) in data.iter().enumerate() {
		let index = item
			.get("index")
			.and_then(|v| v.as_u64())
			.map(|v| v as usize)
			.unwrap_or(fallback_index);
		let embedding = item.get("embedding").and_then(|v| v.as_array()).ok_or_else(|| {
			Error::InvalidResponse {
				message: "Embedding item missing embedding array.".to_string(),
			}
		})?;
		let mut vec = Vec::with_capacity(embedding.len());

		for value in embedding {
			let number = value.as_f64().ok_or_else(|| Error::InvalidResponse {
				message: "Embedding value must be numeric.".to_string(),
			})?;

			vec.push(number as f32);
		}

		indexed.push((index, vec));
	}

	indexed.sort_by_key(|(index, _)| *index);

	Ok(indexed.into_iter().map(|(_, vec)| vec).collect())
}
