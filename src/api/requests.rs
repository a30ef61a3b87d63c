use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
    prelude::Decimal,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::{
        helpers::{ensure_exists, find_or_404},
        price_lists::price,
        validation,
    },
    app_state::AppState,
    database::models::{
        RequestStatus, chosen_material, chosen_service, client, material_pl, request, service_pl,
    },
    errors::AppError,
    services::billing,
};

// --- DTOs (Data Transfer Objects) ---

#[derive(Deserialize, ToSchema, Clone)]
pub struct RequestDto {
    pub client_id: i64,
    #[schema(value_type = String, format = Date)]
    pub req_date: NaiveDate,
    pub workload: String,
    #[schema(value_type = String)]
    pub final_price: Decimal,
    #[serde(default)]
    pub status: RequestStatus,
}

#[derive(Deserialize, IntoParams)]
pub struct RequestQuery {
    pub client_id: Option<i64>,
    pub status: Option<RequestStatus>,
}

#[derive(Deserialize, ToSchema, Clone)]
pub struct ChosenServiceDto {
    pub service_id: i64,
    /// Defaults to the service's list price.
    #[schema(value_type = Option<String>)]
    pub total_cost: Option<Decimal>,
}

#[derive(Deserialize, ToSchema, Clone)]
pub struct ChosenMaterialDto {
    pub material_id: i64,
    pub amount: i32,
    /// Defaults to list price times amount.
    #[schema(value_type = Option<String>)]
    pub total_cost: Option<Decimal>,
}

/// Request with its display label.
#[derive(Serialize, ToSchema)]
pub struct RequestView {
    #[serde(flatten)]
    pub request: request::Model,
    pub label: String,
}

// --- Requests ---

#[utoipa::path(
    get,
    path = "/api/requests",
    tag = "Requests",
    params(RequestQuery),
    responses(
        (status = 200, description = "List requests", body = [request::Model])
    )
)]
#[get("")]
pub async fn get_requests(
    data: web::Data<AppState>,
    query: web::Query<RequestQuery>,
) -> Result<HttpResponse, AppError> {
    let mut select = request::Entity::find().order_by_desc(request::Column::ReqDate);
    if let Some(client_id) = query.client_id {
        select = select.filter(request::Column::ClientId.eq(client_id));
    }
    if let Some(status) = query.status {
        select = select.filter(request::Column::Status.eq(status));
    }
    Ok(HttpResponse::Ok().json(select.all(&data.db).await?))
}

#[utoipa::path(
    get,
    path = "/api/requests/{id}",
    tag = "Requests",
    params(
        ("id" = i64, Path, description = "Request ID")
    ),
    responses(
        (status = 200, description = "Request found", body = RequestView),
        (status = 404, description = "Request not found")
    )
)]
#[get("/{id}")]
pub async fn get_request_by_id(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let found = billing::find_request(&data.db, path.into_inner()).await?;
    let owner = find_or_404::<client::Entity, _>(&data.db, found.client_id, "Client").await?;
    let label = found.label(&owner);
    Ok(HttpResponse::Ok().json(RequestView {
        request: found,
        label,
    }))
}

#[utoipa::path(
    post,
    path = "/api/requests",
    tag = "Requests",
    request_body = RequestDto,
    responses(
        (status = 201, description = "Request created successfully", body = request::Model),
        (status = 404, description = "Client not found")
    )
)]
#[post("")]
pub async fn create_request(
    data: web::Data<AppState>,
    body: web::Json<RequestDto>,
) -> Result<HttpResponse, AppError> {
    ensure_exists::<client::Entity, _>(&data.db, body.client_id, "Client").await?;
    let created = request::ActiveModel {
        client_id: Set(body.client_id),
        req_date: Set(body.req_date),
        workload: Set(validation::required_text("workload", &body.workload, 30)?),
        final_price: Set(price("final_price", body.final_price)?),
        status: Set(body.status),
        ..Default::default()
    }
    .insert(&data.db)
    .await?;
    log::info!("created request {} for client {}", created.id, created.client_id);
    Ok(HttpResponse::Created().json(created))
}

#[utoipa::path(
    put,
    path = "/api/requests/{id}",
    tag = "Requests",
    params(
        ("id" = i64, Path, description = "Request ID")
    ),
    request_body = RequestDto,
    responses(
        (status = 200, description = "Request updated successfully", body = request::Model),
        (status = 404, description = "Request or client not found")
    )
)]
#[put("/{id}")]
pub async fn update_request(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<RequestDto>,
) -> Result<HttpResponse, AppError> {
    let existing = billing::find_request(&data.db, path.into_inner()).await?;
    ensure_exists::<client::Entity, _>(&data.db, body.client_id, "Client").await?;

    let mut active = existing.into_active_model();
    active.client_id = Set(body.client_id);
    active.req_date = Set(body.req_date);
    active.workload = Set(validation::required_text("workload", &body.workload, 30)?);
    active.final_price = Set(price("final_price", body.final_price)?);
    active.status = Set(body.status);
    Ok(HttpResponse::Ok().json(active.update(&data.db).await?))
}

#[utoipa::path(
    delete,
    path = "/api/requests/{id}",
    tag = "Requests",
    params(
        ("id" = i64, Path, description = "Request ID")
    ),
    responses(
        (status = 204, description = "Request and its dependent records deleted"),
        (status = 404, description = "Request not found")
    )
)]
#[delete("/{id}")]
pub async fn delete_request(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let existing = billing::find_request(&data.db, path.into_inner()).await?;
    existing.into_active_model().delete(&data.db).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    post,
    path = "/api/requests/{id}/recalculate",
    tag = "Requests",
    params(
        ("id" = i64, Path, description = "Request ID")
    ),
    responses(
        (status = 200, description = "Final price set to the sum of chosen lines", body = request::Model),
        (status = 404, description = "Request not found")
    )
)]
#[post("/{id}/recalculate")]
pub async fn recalculate_request(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let updated = billing::recalculate_final_price(&data.db, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(updated))
}

// --- Chosen services ---

#[utoipa::path(
    get,
    path = "/api/requests/{id}/services",
    tag = "Requests",
    params(
        ("id" = i64, Path, description = "Request ID")
    ),
    responses(
        (status = 200, description = "Services chosen for the request", body = [chosen_service::Model])
    )
)]
#[get("/{id}/services")]
pub async fn get_chosen_services(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let request_id = path.into_inner();
    ensure_exists::<request::Entity, _>(&data.db, request_id, "Request").await?;
    let lines = chosen_service::Entity::find()
        .filter(chosen_service::Column::RequestId.eq(request_id))
        .order_by_asc(chosen_service::Column::Id)
        .all(&data.db)
        .await?;
    Ok(HttpResponse::Ok().json(lines))
}

#[utoipa::path(
    post,
    path = "/api/requests/{id}/services",
    tag = "Requests",
    params(
        ("id" = i64, Path, description = "Request ID")
    ),
    request_body = ChosenServiceDto,
    responses(
        (status = 201, description = "Service added to the request", body = chosen_service::Model),
        (status = 404, description = "Request or service not found")
    )
)]
#[post("/{id}/services")]
pub async fn add_chosen_service(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<ChosenServiceDto>,
) -> Result<HttpResponse, AppError> {
    let request_id = path.into_inner();
    ensure_exists::<request::Entity, _>(&data.db, request_id, "Request").await?;
    let service = find_or_404::<service_pl::Entity, _>(&data.db, body.service_id, "Service").await?;

    let total_cost = match body.total_cost {
        Some(cost) => price("total_cost", cost)?,
        None => service.price,
    };
    let created = chosen_service::ActiveModel {
        service_id: Set(service.id),
        request_id: Set(request_id),
        total_cost: Set(total_cost),
        ..Default::default()
    }
    .insert(&data.db)
    .await?;
    Ok(HttpResponse::Created().json(created))
}

#[utoipa::path(
    delete,
    path = "/api/chosen-services/{id}",
    tag = "Requests",
    params(
        ("id" = i64, Path, description = "Chosen service ID")
    ),
    responses(
        (status = 204, description = "Line removed"),
        (status = 404, description = "Line not found")
    )
)]
#[delete("/chosen-services/{id}")]
pub async fn delete_chosen_service(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let line =
        find_or_404::<chosen_service::Entity, _>(&data.db, path.into_inner(), "Chosen service").await?;
    line.into_active_model().delete(&data.db).await?;
    Ok(HttpResponse::NoContent().finish())
}

// --- Chosen materials ---

#[utoipa::path(
    get,
    path = "/api/requests/{id}/materials",
    tag = "Requests",
    params(
        ("id" = i64, Path, description = "Request ID")
    ),
    responses(
        (status = 200, description = "Materials chosen for the request", body = [chosen_material::Model])
    )
)]
#[get("/{id}/materials")]
pub async fn get_chosen_materials(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let request_id = path.into_inner();
    ensure_exists::<request::Entity, _>(&data.db, request_id, "Request").await?;
    let lines = chosen_material::Entity::find()
        .filter(chosen_material::Column::RequestId.eq(request_id))
        .order_by_asc(chosen_material::Column::Id)
        .all(&data.db)
        .await?;
    Ok(HttpResponse::Ok().json(lines))
}

#[utoipa::path(
    post,
    path = "/api/requests/{id}/materials",
    tag = "Requests",
    params(
        ("id" = i64, Path, description = "Request ID")
    ),
    request_body = ChosenMaterialDto,
    responses(
        (status = 201, description = "Material added to the request", body = chosen_material::Model),
        (status = 400, description = "Amount is not positive"),
        (status = 404, description = "Request or material not found")
    )
)]
#[post("/{id}/materials")]
pub async fn add_chosen_material(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<ChosenMaterialDto>,
) -> Result<HttpResponse, AppError> {
    let request_id = path.into_inner();
    ensure_exists::<request::Entity, _>(&data.db, request_id, "Request").await?;
    let material =
        find_or_404::<material_pl::Entity, _>(&data.db, body.material_id, "Material").await?;

    let line_total = billing::material_line_total(material.price, body.amount)?;
    let total_cost = match body.total_cost {
        Some(cost) => price("total_cost", cost)?,
        None => line_total,
    };
    let created = chosen_material::ActiveModel {
        material_id: Set(material.id),
        request_id: Set(request_id),
        total_cost: Set(total_cost),
        amount: Set(body.amount),
        ..Default::default()
    }
    .insert(&data.db)
    .await?;
    Ok(HttpResponse::Created().json(created))
}

#[utoipa::path(
    delete,
    path = "/api/chosen-materials/{id}",
    tag = "Requests",
    params(
        ("id" = i64, Path, description = "Chosen material ID")
    ),
    responses(
        (status = 204, description = "Line removed"),
        (status = 404, description = "Line not found")
    )
)]
#[delete("/chosen-materials/{id}")]
pub async fn delete_chosen_material(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let line =
        find_or_404::<chosen_material::Entity, _>(&data.db, path.into_inner(), "Chosen material").await?;
    line.into_active_model().delete(&data.db).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/requests")
            .service(get_requests)
            .service(get_request_by_id)
            .service(create_request)
            .service(update_request)
            .service(delete_request)
            .service(recalculate_request)
            .service(get_chosen_services)
            .service(add_chosen_service)
            .service(get_chosen_materials)
            .service(add_chosen_material),
    )
    .service(delete_chosen_service)
    .service(delete_chosen_material);
}
