//! Content-addressed LRU in front of an [`EmbeddingProvider`].
//!
//! Keys hash the provider id, model and dimensions together with the text, so vectors from a
//! different model are never served. Only misses reach the wrapped provider.

use std::{
	num::NonZeroUsize,
	sync::{Arc, Mutex, PoisonError},
};

use lru::LruCache;

use crate::{BoxFuture, EmbeddingProvider, Error, Result};
use huddle_config::EmbeddingProviderConfig;

pub struct CachedEmbedding {
	inner: Arc<dyn EmbeddingProvider>,
	entries: Mutex<LruCache<blake3::Hash, Vec<f32>>>,
}
impl CachedEmbedding {
	pub fn new(inner: Arc<dyn EmbeddingProvider>, capacity: NonZeroUsize) -> Self {
		Self { inner, entries: Mutex::new(LruCache::new(capacity)) }
	}

	pub fn len(&self) -> usize {
		self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	async fn embed_cached(
		&self,
		cfg: &EmbeddingProviderConfig,
		texts: &[String],
	) -> Result<Vec<Vec<f32>>> {
		let keys: Vec<blake3::Hash> = texts.iter().map(|text| cache_key(cfg, text)).collect();
		let mut vectors: Vec<Option<Vec<f32>>> = {
			let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

			keys.iter().map(|key| entries.get(key).cloned()).collect()
		};
		let misses: Vec<usize> =
			vectors.iter().enumerate().filter(|(_, vec)| vec.is_none()).map(|(idx, _)| idx).collect();

		if !misses.is_empty() {
			let miss_texts: Vec<String> = misses.iter().map(|&idx| texts[idx].clone()).collect();
			let fetched = self.inner.embed(cfg, &miss_texts).await?;

			if fetched.len() != miss_texts.len() {
				return Err(Error::Provider {
					message: format!(
						"Embedding provider returned {} vectors for {} inputs.",
						fetched.len(),
						miss_texts.len()
					),
				});
			}

			let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

			for (idx, vec) in misses.iter().copied().zip(fetched) {
				entries.put(keys[idx], vec.clone());

				vectors[idx] = Some(vec);
			}
		}

		tracing::debug!(
			provider_id = cfg.provider_id.as_str(),
			inputs = texts.len(),
			misses = misses.len(),
			"Embedding cache lookup completed."
		);

		Ok(vectors.into_iter().flatten().collect())
	}
}

impl EmbeddingProvider for CachedEmbedding {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(self.embed_cached(cfg, texts))
	}
}

fn cache_key(cfg: &EmbeddingProviderConfig, text: &str) -> blake3::Hash {
	let mut hasher = blake3::Hasher::new();

	for part in [cfg.provider_id.as_str(), cfg.model.as_str()] {
		hasher.update(&(part.len() as u64).to_le_bytes());
		hasher.update(part.as_bytes());
	}

	hasher.update(&cfg.dimensions.to_le_bytes());
	hasher.update(text.as_bytes());

	hasher.finalize()
}
