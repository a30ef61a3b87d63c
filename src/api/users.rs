use actix_web::{delete, get, post, put, web, HttpResponse};
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    api::{helpers::find_or_404, validation},
    app_state::AppState,
    database::models::{UserRole, user},
    errors::AppError,
    services::accounts::{self, NewUser},
};

// --- DTOs (Data Transfer Objects) ---

#[derive(Deserialize, ToSchema, Clone)]
pub struct CreateUserDto {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub tel: Option<String>,
    pub role: UserRole,
    #[serde(default)]
    pub is_staff: bool,
}

#[derive(Deserialize, ToSchema, Clone)]
pub struct UpdateUserDto {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub tel: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub is_staff: bool,
    /// New password; the current one is kept when absent.
    pub password: Option<String>,
}

/// Account as exposed over the API; the password hash never leaves the server.
#[derive(Serialize, ToSchema)]
pub struct UserView {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub tel: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    #[schema(value_type = String, format = DateTime)]
    pub date_joined: chrono::DateTime<chrono::Utc>,
}

impl From<user::Model> for UserView {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            tel: model.tel,
            role: model.role,
            is_active: model.is_active,
            is_staff: model.is_staff,
            is_superuser: model.is_superuser,
            date_joined: model.date_joined,
        }
    }
}

// --- Route Handlers ---

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    responses(
        (status = 200, description = "List of back-office users", body = [UserView])
    )
)]
#[get("")]
pub async fn get_users(data: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let users: Vec<UserView> = user::Entity::find()
        .order_by_asc(user::Column::Id)
        .all(&data.db)
        .await?
        .into_iter()
        .map(UserView::from)
        .collect();
    Ok(HttpResponse::Ok().json(users))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "Users",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User found", body = UserView),
        (status = 404, description = "User not found")
    )
)]
#[get("/{id}")]
pub async fn get_user_by_id(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let found = find_or_404::<user::Entity, _>(&data.db, path.into_inner(), "User").await?;
    Ok(HttpResponse::Ok().json(UserView::from(found)))
}

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    request_body = CreateUserDto,
    responses(
        (status = 201, description = "User created successfully", body = UserView),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username already taken")
    )
)]
#[post("")]
pub async fn create_user(
    data: web::Data<AppState>,
    body: web::Json<CreateUserDto>,
) -> Result<HttpResponse, AppError> {
    let dto = body.into_inner();
    let created = accounts::create_user(
        &data.db,
        NewUser {
            username: dto.username,
            password: dto.password,
            first_name: validation::required_text("first_name", &dto.first_name, 150)?,
            last_name: validation::required_text("last_name", &dto.last_name, 150)?,
            email: dto.email,
            tel: dto.tel,
            role: dto.role,
            is_staff: dto.is_staff,
            is_superuser: false,
        },
    )
    .await?;
    Ok(HttpResponse::Created().json(UserView::from(created)))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "Users",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    request_body = UpdateUserDto,
    responses(
        (status = 200, description = "User updated successfully", body = UserView),
        (status = 404, description = "User not found")
    )
)]
#[put("/{id}")]
pub async fn update_user(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<UpdateUserDto>,
) -> Result<HttpResponse, AppError> {
    let existing = find_or_404::<user::Entity, _>(&data.db, path.into_inner(), "User").await?;
    let dto = body.into_inner();

    let mut active = existing.into_active_model();
    active.first_name = Set(validation::required_text("first_name", &dto.first_name, 150)?);
    active.last_name = Set(validation::required_text("last_name", &dto.last_name, 150)?);
    active.email = Set(validation::email_address("email", &dto.email, 254)?);
    active.tel = Set(accounts::normalize_tel(dto.tel.as_deref())?);
    active.role = Set(dto.role);
    active.is_active = Set(dto.is_active);
    active.is_staff = Set(dto.is_staff);
    if let Some(password) = dto.password {
        if password.len() < 8 {
            return Err(AppError::InvalidInput(
                "Password must be at least 8 characters".to_string(),
            ));
        }
        active.password_hash = Set(accounts::hash_password(&password)?);
    }

    let updated = active.update(&data.db).await?;
    Ok(HttpResponse::Ok().json(UserView::from(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "Users",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deleted successfully"),
        (status = 404, description = "User not found")
    )
)]
#[delete("/{id}")]
pub async fn delete_user(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let existing = find_or_404::<user::Entity, _>(&data.db, path.into_inner(), "User").await?;
    existing.into_active_model().delete(&data.db).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .service(get_users)
            .service(get_user_by_id)
            .service(create_user)
            .service(update_user)
            .service(delete_user),
    );
}
