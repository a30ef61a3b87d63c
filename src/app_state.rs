use crate::config::Config;
use crate::services::photo_service::{PhotoService, UploadPolicy};
use crate::services::storage::MediaStorage;
use sea_orm::DatabaseConnection;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Config,
    pub photos: PhotoService,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        let storage = MediaStorage::new(config.effective_media_root());
        let photos = PhotoService::new(storage, UploadPolicy::from_config(&config));
        Self { db, config, photos }
    }
}
