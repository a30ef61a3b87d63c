use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
};

use crate::api::validation::{ensure_max_len, sanitize_phone, validate_email};
use crate::database::models::{UserRole, user};
use crate::errors::AppError;

/// Fields required to open an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub tel: Option<String>,
    pub role: UserRole,
    pub is_staff: bool,
    pub is_superuser: bool,
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|e| {
        log::error!("password hashing failed: {}", e);
        AppError::Internal
    })
}

/// Normalizes and checks the optional telephone number.
pub fn normalize_tel(tel: Option<&str>) -> Result<Option<String>, AppError> {
    match tel.map(str::trim).filter(|t| !t.is_empty()) {
        None => Ok(None),
        Some(raw) => {
            let phone = sanitize_phone(raw)
                .ok_or_else(|| AppError::InvalidInput(format!("Invalid phone number: {}", raw)))?;
            if !ensure_max_len(&phone, 15) {
                return Err(AppError::InvalidInput(
                    "Phone number must be at most 15 characters".to_string(),
                ));
            }
            Ok(Some(phone))
        }
    }
}

pub async fn create_user<C: ConnectionTrait>(db: &C, new_user: NewUser) -> Result<user::Model, AppError> {
    let username = new_user.username.trim().to_string();
    if username.is_empty() || !ensure_max_len(&username, 150) {
        return Err(AppError::InvalidInput(
            "Username must be 1..150 characters".to_string(),
        ));
    }
    if new_user.password.len() < 8 {
        return Err(AppError::InvalidInput(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    if !validate_email(&new_user.email) {
        return Err(AppError::InvalidInput(format!("Invalid email: {}", new_user.email)));
    }
    let tel = normalize_tel(new_user.tel.as_deref())?;

    let existing = user::Entity::find()
        .filter(user::Column::Username.eq(username.clone()))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(format!("User {} already exists", username)));
    }

    let created = user::ActiveModel {
        username: Set(username),
        password_hash: Set(hash_password(&new_user.password)?),
        first_name: Set(new_user.first_name),
        last_name: Set(new_user.last_name),
        email: Set(new_user.email),
        tel: Set(tel),
        role: Set(new_user.role),
        is_active: Set(true),
        is_staff: Set(new_user.is_staff),
        is_superuser: Set(new_user.is_superuser),
        date_joined: Set(chrono::Utc::now()),
        last_login: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    log::info!("created user {}", created);
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_is_hashed_with_bcrypt() {
        let hash = hash_password("correct horse").unwrap();
        assert_ne!(hash, "correct horse");
        assert!(bcrypt::verify("correct horse", &hash).unwrap());
        assert!(!bcrypt::verify("wrong horse", &hash).unwrap());
    }

    #[test]
    fn tel_is_optional_but_checked() {
        assert_eq!(normalize_tel(None).unwrap(), None);
        assert_eq!(normalize_tel(Some("  ")).unwrap(), None);
        assert_eq!(
            normalize_tel(Some("+7 (999) 123-45-67")).unwrap(),
            Some("+79991234567".to_string())
        );
        assert!(normalize_tel(Some("call me")).is_err());
        assert!(normalize_tel(Some("+1234567890123456")).is_err());
    }
}
