//! Catalog endpoints: the services price list under `/services` and the
//! materials price list under `/materials`.

use actix_web::{delete, get, post, put, web, HttpResponse};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
    prelude::Decimal,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::{helpers::find_or_404, validation},
    app_state::AppState,
    database::models::{ServiceType, material_pl, service_pl},
    errors::AppError,
};

// --- DTOs (Data Transfer Objects) ---

#[derive(Deserialize, ToSchema, Clone)]
pub struct ServiceDto {
    pub service_type: ServiceType,
    pub title: String,
    #[schema(value_type = String)]
    pub price: Decimal,
}

#[derive(Deserialize, ToSchema, Clone)]
pub struct MaterialDto {
    pub title: String,
    pub description: String,
    #[schema(value_type = String)]
    pub price: Decimal,
}

#[derive(Deserialize, IntoParams)]
pub struct ServiceQuery {
    pub service_type: Option<ServiceType>,
}

pub(crate) fn price(field: &str, value: Decimal) -> Result<Decimal, AppError> {
    if value.is_sign_negative() {
        return Err(AppError::InvalidInput(format!("{} cannot be negative", field)));
    }
    Ok(value.round_dp(2))
}

// --- Services ---

#[utoipa::path(
    get,
    path = "/api/services",
    tag = "Price lists",
    params(ServiceQuery),
    responses(
        (status = 200, description = "List services", body = [service_pl::Model])
    )
)]
#[get("")]
pub async fn get_services(
    data: web::Data<AppState>,
    query: web::Query<ServiceQuery>,
) -> Result<HttpResponse, AppError> {
    let mut select = service_pl::Entity::find().order_by_asc(service_pl::Column::Id);
    if let Some(service_type) = query.service_type {
        select = select.filter(service_pl::Column::ServiceType.eq(service_type));
    }
    Ok(HttpResponse::Ok().json(select.all(&data.db).await?))
}

#[utoipa::path(
    get,
    path = "/api/services/{id}",
    tag = "Price lists",
    params(
        ("id" = i64, Path, description = "Service ID")
    ),
    responses(
        (status = 200, description = "Service found", body = service_pl::Model),
        (status = 404, description = "Service not found")
    )
)]
#[get("/{id}")]
pub async fn get_service_by_id(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let found = find_or_404::<service_pl::Entity, _>(&data.db, path.into_inner(), "Service").await?;
    Ok(HttpResponse::Ok().json(found))
}

#[utoipa::path(
    post,
    path = "/api/services",
    tag = "Price lists",
    request_body = ServiceDto,
    responses(
        (status = 201, description = "Service created successfully", body = service_pl::Model)
    )
)]
#[post("")]
pub async fn create_service(
    data: web::Data<AppState>,
    body: web::Json<ServiceDto>,
) -> Result<HttpResponse, AppError> {
    let created = service_pl::ActiveModel {
        service_type: Set(body.service_type),
        title: Set(validation::required_text("title", &body.title, 50)?),
        price: Set(price("price", body.price)?),
        ..Default::default()
    }
    .insert(&data.db)
    .await?;
    Ok(HttpResponse::Created().json(created))
}

#[utoipa::path(
    put,
    path = "/api/services/{id}",
    tag = "Price lists",
    params(
        ("id" = i64, Path, description = "Service ID")
    ),
    request_body = ServiceDto,
    responses(
        (status = 200, description = "Service updated successfully", body = service_pl::Model),
        (status = 404, description = "Service not found")
    )
)]
#[put("/{id}")]
pub async fn update_service(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<ServiceDto>,
) -> Result<HttpResponse, AppError> {
    let existing = find_or_404::<service_pl::Entity, _>(&data.db, path.into_inner(), "Service").await?;
    let mut active = existing.into_active_model();
    active.service_type = Set(body.service_type);
    active.title = Set(validation::required_text("title", &body.title, 50)?);
    active.price = Set(price("price", body.price)?);
    Ok(HttpResponse::Ok().json(active.update(&data.db).await?))
}

#[utoipa::path(
    delete,
    path = "/api/services/{id}",
    tag = "Price lists",
    params(
        ("id" = i64, Path, description = "Service ID")
    ),
    responses(
        (status = 204, description = "Service deleted successfully"),
        (status = 404, description = "Service not found")
    )
)]
#[delete("/{id}")]
pub async fn delete_service(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let existing = find_or_404::<service_pl::Entity, _>(&data.db, path.into_inner(), "Service").await?;
    existing.into_active_model().delete(&data.db).await?;
    Ok(HttpResponse::NoContent().finish())
}

// --- Materials ---

#[utoipa::path(
    get,
    path = "/api/materials",
    tag = "Price lists",
    responses(
        (status = 200, description = "List materials", body = [material_pl::Model])
    )
)]
#[get("")]
pub async fn get_materials(data: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let materials = material_pl::Entity::find()
        .order_by_asc(material_pl::Column::Id)
        .all(&data.db)
        .await?;
    Ok(HttpResponse::Ok().json(materials))
}

#[utoipa::path(
    get,
    path = "/api/materials/{id}",
    tag = "Price lists",
    params(
        ("id" = i64, Path, description = "Material ID")
    ),
    responses(
        (status = 200, description = "Material found", body = material_pl::Model),
        (status = 404, description = "Material not found")
    )
)]
#[get("/{id}")]
pub async fn get_material_by_id(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let found = find_or_404::<material_pl::Entity, _>(&data.db, path.into_inner(), "Material").await?;
    Ok(HttpResponse::Ok().json(found))
}

#[utoipa::path(
    post,
    path = "/api/materials",
    tag = "Price lists",
    request_body = MaterialDto,
    responses(
        (status = 201, description = "Material created successfully", body = material_pl::Model)
    )
)]
#[post("")]
pub async fn create_material(
    data: web::Data<AppState>,
    body: web::Json<MaterialDto>,
) -> Result<HttpResponse, AppError> {
    let created = material_pl::ActiveModel {
        title: Set(validation::required_text("title", &body.title, 50)?),
        description: Set(validation::required_text("description", &body.description, 150)?),
        price: Set(price("price", body.price)?),
        ..Default::default()
    }
    .insert(&data.db)
    .await?;
    Ok(HttpResponse::Created().json(created))
}

#[utoipa::path(
    put,
    path = "/api/materials/{id}",
    tag = "Price lists",
    params(
        ("id" = i64, Path, description = "Material ID")
    ),
    request_body = MaterialDto,
    responses(
        (status = 200, description = "Material updated successfully", body = material_pl::Model),
        (status = 404, description = "Material not found")
    )
)]
#[put("/{id}")]
pub async fn update_material(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<MaterialDto>,
) -> Result<HttpResponse, AppError> {
    let existing = find_or_404::<material_pl::Entity, _>(&data.db, path.into_inner(), "Material").await?;
    let mut active = existing.into_active_model();
    active.title = Set(validation::required_text("title", &body.title, 50)?);
    active.description = Set(validation::required_text("description", &body.description, 150)?);
    active.price = Set(price("price", body.price)?);
    Ok(HttpResponse::Ok().json(active.update(&data.db).await?))
}

/// Photos rows go with the material; their files stay in storage.
#[utoipa::path(
    delete,
    path = "/api/materials/{id}",
    tag = "Price lists",
    params(
        ("id" = i64, Path, description = "Material ID")
    ),
    responses(
        (status = 204, description = "Material deleted successfully"),
        (status = 404, description = "Material not found")
    )
)]
#[delete("/{id}")]
pub async fn delete_material(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let existing = find_or_404::<material_pl::Entity, _>(&data.db, path.into_inner(), "Material").await?;
    existing.into_active_model().delete(&data.db).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/services")
            .service(get_services)
            .service(get_service_by_id)
            .service(create_service)
            .service(update_service)
            .service(delete_service),
    );
}

/// Material routes; photo routes nested under a material are registered by
/// the photos module inside the same scope.
pub fn material_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_materials)
        .service(get_material_by_id)
        .service(create_material)
        .service(update_material)
        .service(delete_material);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_is_rounded_and_non_negative() {
        assert_eq!(price("price", Decimal::new(12345, 3)).unwrap(), Decimal::new(1234, 2));
        assert!(price("price", Decimal::new(-1, 0)).is_err());
    }
}
