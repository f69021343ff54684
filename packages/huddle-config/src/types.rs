use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub search: Search,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
	Firestore,
	Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub backend: StorageBackend,
	pub firestore: Option<Firestore>,
	pub postgres: Option<Postgres>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Firestore {
	pub project_id: String,
	#[serde(default = "default_firestore_database")]
	pub database: String,
	#[serde(default = "default_firestore_api_base")]
	pub api_base: String,
	/// OAuth access token sent as a bearer credential.
	pub access_token: String,
	#[serde(default = "default_conversations_collection")]
	pub conversations_collection: String,
	#[serde(default = "default_messages_collection")]
	pub messages_collection: String,
	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingFailurePolicy {
	/// Any failed candidate embedding fails the whole search.
	#[default]
	Fail,
	/// Failed candidates are left out of scoring and counted in the response.
	Skip,
}

/// Ranking knobs. Defaults are the tuned production values.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Search {
	/// Candidates must score strictly above this to be returned.
	pub similarity_threshold: f32,
	pub keyword_boost: f32,
	pub max_results: u32,
	pub default_candidate_limit: u32,
	pub max_candidate_limit: u32,
	/// Upper bound on in-flight candidate embedding calls per search.
	pub max_concurrency: u32,
	pub deadline_ms: u64,
	pub on_embedding_failure: EmbeddingFailurePolicy,
	pub filter_message_limit: u32,
	pub keyword: SearchKeyword,
	pub cache: SearchCache,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			similarity_threshold: 0.4,
			keyword_boost: 0.25,
			max_results: 5,
			default_candidate_limit: 200,
			max_candidate_limit: 1_000,
			max_concurrency: 16,
			deadline_ms: 30_000,
			on_embedding_failure: EmbeddingFailurePolicy::Fail,
			filter_message_limit: 1_000,
			keyword: SearchKeyword::default(),
			cache: SearchCache::default(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchKeyword {
	/// Query tokens shorter than this never take part in token overlap.
	pub min_token_chars: u32,
	pub stem_prefix_chars: u32,
}
impl Default for SearchKeyword {
	fn default() -> Self {
		Self { min_token_chars: 3, stem_prefix_chars: 4 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchCache {
	pub enabled: bool,
	pub max_entries: u32,
}
impl Default for SearchCache {
	fn default() -> Self {
		Self { enabled: false, max_entries: 10_000 }
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_firestore_database() -> String {
	"(default)".to_string()
}

fn default_firestore_api_base() -> String {
	"https://firestore.googleapis.com/v1".to_string()
}

fn default_conversations_collection() -> String {
	"conversations".to_string()
}

fn default_messages_collection() -> String {
	"messages".to_string()
}

fn default_timeout_ms() -> u64 {
	10_000
}
