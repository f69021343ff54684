mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingFailurePolicy, EmbeddingProviderConfig, Firestore, Postgres, Providers,
	Search, SearchCache, SearchKeyword, Service, Storage, StorageBackend,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	parse(&raw).map_err(|err| match err {
		Error::ParseConfig { source, .. } =>
			Error::ParseConfig { path: path.to_path_buf(), source },
		other => other,
	})
}

pub fn parse(raw: &str) -> Result<Config> {
	let mut cfg: Config = toml::from_str(raw)
		.map_err(|err| Error::ParseConfig { path: Default::default(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::validation("service.http_bind must be non-empty."));
	}

	validate_storage(cfg)?;

	let embedding = &cfg.providers.embedding;

	if embedding.api_key.trim().is_empty() {
		return Err(Error::validation("Provider embedding api_key must be non-empty."));
	}
	if embedding.model.trim().is_empty() {
		return Err(Error::validation("providers.embedding.model must be non-empty."));
	}
	if embedding.dimensions == 0 {
		return Err(Error::validation(
			"providers.embedding.dimensions must be greater than zero.",
		));
	}
	if embedding.timeout_ms == 0 {
		return Err(Error::validation(
			"providers.embedding.timeout_ms must be greater than zero.",
		));
	}

	for (label, value) in embedding.default_headers.iter() {
		if !value.is_string() {
			return Err(Error::validation(format!(
				"providers.embedding.default_headers.{label} must be a string."
			)));
		}
	}

	validate_search(&cfg.search)
}

fn validate_storage(cfg: &Config) -> Result<()> {
	match cfg.storage.backend {
		StorageBackend::Firestore => {
			let Some(firestore) = cfg.storage.firestore.as_ref() else {
				return Err(Error::validation(
					"storage.firestore must be set when storage.backend is firestore.",
				));
			};

			for (label, value) in [
				("storage.firestore.project_id", &firestore.project_id),
				("storage.firestore.access_token", &firestore.access_token),
				("storage.firestore.conversations_collection", &firestore.conversations_collection),
				("storage.firestore.messages_collection", &firestore.messages_collection),
			] {
				if value.trim().is_empty() {
					return Err(Error::validation(format!("{label} must be non-empty.")));
				}
			}

			if firestore.timeout_ms == 0 {
				return Err(Error::validation(
					"storage.firestore.timeout_ms must be greater than zero.",
				));
			}
		},
		StorageBackend::Postgres => {
			let Some(postgres) = cfg.storage.postgres.as_ref() else {
				return Err(Error::validation(
					"storage.postgres must be set when storage.backend is postgres.",
				));
			};

			if postgres.dsn.trim().is_empty() {
				return Err(Error::validation("storage.postgres.dsn must be non-empty."));
			}
			if postgres.pool_max_conns == 0 {
				return Err(Error::validation(
					"storage.postgres.pool_max_conns must be greater than zero.",
				));
			}
		},
	}

	Ok(())
}

fn validate_search(search: &Search) -> Result<()> {
	for (label, value) in [
		("search.similarity_threshold", search.similarity_threshold),
		("search.keyword_boost", search.keyword_boost),
	] {
		if !value.is_finite() {
			return Err(Error::validation(format!("{label} must be a finite number.")));
		}
		if !(0.0..=1.0).contains(&value) {
			return Err(Error::validation(format!("{label} must be in the range 0.0-1.0.")));
		}
	}
	for (label, value) in [
		("search.max_results", search.max_results),
		("search.default_candidate_limit", search.default_candidate_limit),
		("search.max_candidate_limit", search.max_candidate_limit),
		("search.max_concurrency", search.max_concurrency),
		("search.filter_message_limit", search.filter_message_limit),
		("search.keyword.min_token_chars", search.keyword.min_token_chars),
		("search.keyword.stem_prefix_chars", search.keyword.stem_prefix_chars),
	] {
		if value == 0 {
			return Err(Error::validation(format!("{label} must be greater than zero.")));
		}
	}

	if search.default_candidate_limit > search.max_candidate_limit {
		return Err(Error::validation(
			"search.default_candidate_limit must not exceed search.max_candidate_limit.",
		));
	}
	if search.deadline_ms == 0 {
		return Err(Error::validation("search.deadline_ms must be greater than zero."));
	}
	if search.cache.enabled && search.cache.max_entries == 0 {
		return Err(Error::validation(
			"search.cache.max_entries must be greater than zero when enabled.",
		));
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.providers.embedding.api_base =
		cfg.providers.embedding.api_base.trim_end_matches('/').to_string();

	if let Some(firestore) = cfg.storage.firestore.as_mut() {
		firestore.api_base = firestore.api_base.trim_end_matches('/').to_string();

		if firestore.database.trim().is_empty() {
			firestore.database = "(default)".to_string();
		}
	}
	if cfg.service.log_level.trim().is_empty() {
		cfg.service.log_level = "info".to_string();
	}
}
