use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};

use crate::config::Config;
use crate::database::models::{material_pl, materials_photo};
use crate::errors::AppError;

use super::storage::{MediaStorage, StoredFile, candidate_name};

/// How many `_<n>` suffixes are tried before an upload name counts as exhausted.
const MAX_NAME_ATTEMPTS: usize = 1000;

/// File content received from a client, not yet stored anywhere.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub content: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// Lowercased extension without the dot.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

/// Acceptance rules for uploaded photos.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_bytes: usize,
    pub allowed_types: Vec<String>,
}

impl UploadPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_bytes: config.effective_upload_max_bytes(),
            allowed_types: config.allowed_upload_types(),
        }
    }

    pub fn validate_file_size(&self, file: &UploadedFile) -> Result<(), AppError> {
        if file.size() == 0 {
            return Err(AppError::Validation("The submitted file is empty".to_string()));
        }
        if file.size() > self.max_bytes {
            return Err(AppError::Validation(format!(
                "File is {} bytes, the limit is {} bytes",
                file.size(),
                self.max_bytes
            )));
        }
        Ok(())
    }

    pub fn validate_file_type(&self, file: &UploadedFile) -> Result<(), AppError> {
        match file.extension() {
            Some(ext) if self.allowed_types.iter().any(|allowed| *allowed == ext) => Ok(()),
            Some(ext) => Err(AppError::Validation(format!(
                "Unsupported file type '.{}'. Supported: {}",
                ext,
                self.allowed_types.join(", ")
            ))),
            None => Err(AppError::Validation(format!(
                "File '{}' has no extension",
                file.name
            ))),
        }
    }

    pub fn validate(&self, file: &UploadedFile) -> Result<(), AppError> {
        self.validate_file_size(file)?;
        self.validate_file_type(file)
    }
}

/// Storage path of a photo: `images/<material>/<filename>`.
pub fn upload_path(material: &material_pl::Model, filename: &str) -> String {
    format!("images/{}/{}", material, filename)
}

/// Copies the stored file's metadata onto the row. Called on every save.
pub fn apply_file_metadata(photo: &mut materials_photo::ActiveModel, stored: &StoredFile) {
    photo.file = Set(stored.name.clone());
    photo.filename = Set(stored.name.clone());
    photo.size = Set(stored.size);
}

#[derive(Clone, Debug)]
pub struct PhotoService {
    storage: MediaStorage,
    policy: UploadPolicy,
}

impl PhotoService {
    pub fn new(storage: MediaStorage, policy: UploadPolicy) -> Self {
        Self { storage, policy }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    pub async fn list_for_material(
        &self,
        db: &DatabaseConnection,
        material_id: i64,
    ) -> Result<Vec<materials_photo::Model>, AppError> {
        let photos = materials_photo::Entity::find()
            .filter(materials_photo::Column::MaterialId.eq(material_id))
            .order_by_asc(materials_photo::Column::Id)
            .all(db)
            .await?;
        Ok(photos)
    }

    /// Attaches a new photo to a material.
    pub async fn create(
        &self,
        db: &DatabaseConnection,
        material_id: i64,
        file: UploadedFile,
    ) -> Result<materials_photo::Model, AppError> {
        self.save(db, None, material_id, file).await
    }

    /// Replaces the file of an existing photo, optionally moving it to another
    /// material.
    pub async fn replace(
        &self,
        db: &DatabaseConnection,
        photo_id: i64,
        material_id: Option<i64>,
        file: UploadedFile,
    ) -> Result<materials_photo::Model, AppError> {
        let existing = materials_photo::Entity::find_by_id(photo_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Photo with id {} not found", photo_id)))?;
        let material_id = material_id.unwrap_or(existing.material_id);
        self.save(db, Some(existing), material_id, file).await
    }

    async fn save(
        &self,
        db: &DatabaseConnection,
        existing: Option<materials_photo::Model>,
        material_id: i64,
        file: UploadedFile,
    ) -> Result<materials_photo::Model, AppError> {
        if let Err(e) = self.policy.validate(&file) {
            log::warn!("rejected upload {} for material {}: {}", file.name, material_id, e);
            return Err(e);
        }

        let material = material_pl::Entity::find_by_id(material_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Material with id {} not found", material_id))
            })?;

        let path = upload_path(&material, &file.name);
        let stored = self.store_unique(db, &path, &file.content).await?;

        let previous_file = existing.as_ref().map(|photo| photo.file.clone());
        let result = match existing {
            Some(photo) => {
                let mut active = photo.into_active_model();
                active.material_id = Set(material_id);
                apply_file_metadata(&mut active, &stored);
                active.update(db).await
            }
            None => {
                let mut active = materials_photo::ActiveModel {
                    material_id: Set(material_id),
                    ..Default::default()
                };
                apply_file_metadata(&mut active, &stored);
                active.insert(db).await
            }
        };

        let saved = match result {
            Ok(saved) => saved,
            Err(e) => {
                if let Err(cleanup) = self.storage.delete(&stored.name).await {
                    log::error!("failed to clean up {}: {}", stored.name, cleanup);
                }
                return Err(e.into());
            }
        };

        if let Some(previous) = previous_file.filter(|previous| *previous != saved.file) {
            self.storage.delete(&previous).await?;
        }

        log::info!(
            "saved photo {} for material {} ({} bytes)",
            saved.id,
            saved.material_id,
            saved.size
        );
        Ok(saved)
    }

    /// Stores `content` under `path`, or under the first `_<n>` variant that
    /// neither a photo row nor a file on disk already uses.
    async fn store_unique(
        &self,
        db: &DatabaseConnection,
        path: &str,
        content: &[u8],
    ) -> Result<StoredFile, AppError> {
        for n in 0..MAX_NAME_ATTEMPTS {
            let candidate = candidate_name(path, n);
            let claimed = materials_photo::Entity::find()
                .filter(materials_photo::Column::File.eq(candidate.as_str()))
                .one(db)
                .await?
                .is_some();
            if claimed {
                continue;
            }
            if let Some(stored) = self.storage.create_new(&candidate, content).await? {
                if n > 0 {
                    log::info!("{} is taken, stored as {}", path, candidate);
                }
                return Ok(stored);
            }
        }
        Err(AppError::Conflict(format!("No free storage name left for {}", path)))
    }

    /// Removes the row and its stored file.
    pub async fn delete(&self, db: &DatabaseConnection, photo_id: i64) -> Result<(), AppError> {
        let photo = materials_photo::Entity::find_by_id(photo_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Photo with id {} not found", photo_id)))?;

        let file = photo.file.clone();
        photo.into_active_model().delete(db).await?;
        self.storage.delete(&file).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::prelude::Decimal;

    fn policy() -> UploadPolicy {
        UploadPolicy {
            max_bytes: 1024,
            allowed_types: vec!["png".to_string(), "jpg".to_string()],
        }
    }

    #[test]
    fn upload_path_uses_material_title() {
        let material = material_pl::Model {
            id: 4,
            title: "Banner mesh".to_string(),
            description: "370 g/m2".to_string(),
            price: Decimal::new(45000, 2),
        };
        assert_eq!(
            upload_path(&material, "front.jpg"),
            "images/Banner mesh/front.jpg"
        );
    }

    #[test]
    fn rejects_oversized_and_empty_files() {
        let policy = policy();
        let big = UploadedFile::new("big.png", vec![0u8; 1025]);
        assert!(matches!(policy.validate(&big), Err(AppError::Validation(_))));

        let empty = UploadedFile::new("empty.png", Vec::new());
        assert!(matches!(policy.validate(&empty), Err(AppError::Validation(_))));

        let exact = UploadedFile::new("exact.png", vec![0u8; 1024]);
        assert!(policy.validate(&exact).is_ok());
    }

    #[test]
    fn checks_extension_case_insensitively() {
        let policy = policy();
        assert!(policy.validate(&UploadedFile::new("a.JPG", vec![1])).is_ok());
        assert!(policy.validate(&UploadedFile::new("a.exe", vec![1])).is_err());
        assert!(policy.validate(&UploadedFile::new("png", vec![1])).is_err());
        assert!(policy.validate(&UploadedFile::new(".png", vec![1])).is_err());
    }

    #[test]
    fn metadata_overrides_prior_values() {
        let mut active = materials_photo::ActiveModel {
            filename: Set("bogus.txt".to_string()),
            size: Set(999_999),
            ..Default::default()
        };
        let stored = StoredFile {
            name: "images/Film/a.png".to_string(),
            size: 42,
        };
        apply_file_metadata(&mut active, &stored);
        assert_eq!(active.filename, Set("images/Film/a.png".to_string()));
        assert_eq!(active.size, Set(42));
        assert_eq!(active.file, Set("images/Film/a.png".to_string()));
    }
}
