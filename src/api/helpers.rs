use sea_orm::{ConnectionTrait, EntityTrait, PrimaryKeyTrait};

use crate::errors::AppError;

/// Loads a record by primary key or answers 404 with `<label> with id <id> not found`.
pub async fn find_or_404<E, C>(db: &C, id: i64, label: &str) -> Result<E::Model, AppError>
where
    E: EntityTrait,
    C: ConnectionTrait,
    i64: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
{
    E::find_by_id(id).one(db).await?.ok_or_else(|| {
        log::debug!("{} {} not found", label, id);
        AppError::NotFound(format!("{} with id {} not found", label, id))
    })
}

/// Same as [`find_or_404`] when only existence matters.
pub async fn ensure_exists<E, C>(db: &C, id: i64, label: &str) -> Result<(), AppError>
where
    E: EntityTrait,
    C: ConnectionTrait,
    i64: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
{
    find_or_404::<E, C>(db, id, label).await.map(|_| ())
}
