use std::sync::Arc;

use color_eyre::eyre;

use huddle_config::{Config, StorageBackend};
use huddle_service::{HuddleService, MessageStore};
use huddle_storage::{db::Db, firestore::FirestoreStore};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<HuddleService>,
}
impl AppState {
	pub async fn new(config: Config) -> color_eyre::Result<Self> {
		let store = open_store(&config).await?;
		let service = HuddleService::new(config, store)?;

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: HuddleService) -> Self {
		Self { service: Arc::new(service) }
	}
}

async fn open_store(config: &Config) -> color_eyre::Result<Arc<dyn MessageStore>> {
	match config.storage.backend {
		StorageBackend::Firestore => {
			let cfg = config.storage.firestore.as_ref().ok_or_else(|| {
				eyre::eyre!("storage.firestore must be set when storage.backend is firestore.")
			})?;

			tracing::info!(project_id = cfg.project_id.as_str(), "Using the Firestore message store.");

			Ok(Arc::new(FirestoreStore::new(cfg)?))
		},
		StorageBackend::Postgres => {
			let cfg = config.storage.postgres.as_ref().ok_or_else(|| {
				eyre::eyre!("storage.postgres must be set when storage.backend is postgres.")
			})?;
			let db = Db::connect(cfg).await?;

			db.ensure_schema().await?;

			tracing::info!("Using the Postgres message store.");

			Ok(Arc::new(db))
		},
	}
}
