pub mod embedding_cache;
pub mod filter;
pub mod search;

mod error;

pub use embedding_cache::CachedEmbedding;
pub use error::{Error, Result};
pub use filter::{FilterRequest, FilterResponse};
pub use search::{ScoredMessage, SearchRequest, SearchResponse};

use std::{future::Future, num::NonZeroUsize, pin::Pin, sync::Arc};

use huddle_config::{Config, EmbeddingProviderConfig};
use huddle_providers::embedding::HttpEmbedder;
use huddle_storage::{
	db::Db,
	firestore::FirestoreStore,
	models::{Message, TimeRange},
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	/// Returns one vector per input text, in input order.
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>>;
}

pub trait MessageStore
where
	Self: Send + Sync,
{
	/// Newest first. An unknown conversation yields an empty list.
	fn fetch_recent_messages<'a>(
		&'a self,
		conversation_id: &'a str,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<Message>>>;

	fn fetch_messages_between<'a>(
		&'a self,
		conversation_id: &'a str,
		range: &'a TimeRange,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<Message>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
}
impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>) -> Self {
		Self { embedding }
	}

	/// HTTP embedding client for the configured provider, wrapped in the LRU cache when
	/// `search.cache.enabled` is set.
	pub fn from_config(cfg: &Config) -> Result<Self> {
		let embedder = HttpEmbedder::new(&cfg.providers.embedding)?;
		let provider: Arc<dyn EmbeddingProvider> = Arc::new(DefaultProviders { embedder });

		Ok(Self::new(with_cache(cfg, provider)))
	}
}

pub struct HuddleService {
	pub cfg: Config,
	pub store: Arc<dyn MessageStore>,
	pub providers: Providers,
}
impl HuddleService {
	pub fn new(cfg: Config, store: Arc<dyn MessageStore>) -> Result<Self> {
		let providers = Providers::from_config(&cfg)?;

		Ok(Self { cfg, store, providers })
	}

	pub fn with_providers(cfg: Config, store: Arc<dyn MessageStore>, providers: Providers) -> Self {
		Self { cfg, store, providers }
	}
}

struct DefaultProviders {
	embedder: HttpEmbedder,
}

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(async move { Ok(self.embedder.embed(cfg, texts).await?) })
	}
}

impl MessageStore for FirestoreStore {
	fn fetch_recent_messages<'a>(
		&'a self,
		conversation_id: &'a str,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<Message>>> {
		Box::pin(async move {
			Ok(FirestoreStore::fetch_recent_messages(self, conversation_id, limit).await?)
		})
	}

	fn fetch_messages_between<'a>(
		&'a self,
		conversation_id: &'a str,
		range: &'a TimeRange,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<Message>>> {
		Box::pin(async move {
			Ok(FirestoreStore::fetch_messages_between(self, conversation_id, range, limit).await?)
		})
	}
}

impl MessageStore for Db {
	fn fetch_recent_messages<'a>(
		&'a self,
		conversation_id: &'a str,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<Message>>> {
		Box::pin(async move { Ok(Db::fetch_recent_messages(self, conversation_id, limit).await?) })
	}

	fn fetch_messages_between<'a>(
		&'a self,
		conversation_id: &'a str,
		range: &'a TimeRange,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<Message>>> {
		Box::pin(async move {
			Ok(Db::fetch_messages_between(self, conversation_id, range, limit).await?)
		})
	}
}

fn with_cache(cfg: &Config, provider: Arc<dyn EmbeddingProvider>) -> Arc<dyn EmbeddingProvider> {
	if !cfg.search.cache.enabled {
		return provider;
	}

	match NonZeroUsize::new(cfg.search.cache.max_entries as usize) {
		Some(capacity) => Arc::new(CachedEmbedding::new(provider, capacity)),
		None => provider,
	}
}
