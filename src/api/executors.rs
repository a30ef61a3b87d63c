use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::{
        helpers::{ensure_exists, find_or_404},
        validation,
    },
    app_state::AppState,
    database::models::{executor, request, work_group},
    errors::AppError,
};

// --- DTOs (Data Transfer Objects) ---

#[derive(Deserialize, ToSchema, Clone)]
pub struct ExecutorDto {
    pub full_name: String,
    pub phone_num: String,
}

#[derive(Deserialize, ToSchema, Clone)]
pub struct WorkGroupDto {
    pub request_id: i64,
    pub executor_id: i64,
    #[schema(value_type = String, format = Date)]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = Date)]
    pub end_date: NaiveDate,
}

#[derive(Deserialize, IntoParams)]
pub struct WorkGroupQuery {
    pub request_id: Option<i64>,
    pub executor_id: Option<i64>,
}

fn check_dates(dto: &WorkGroupDto) -> Result<(), AppError> {
    if dto.start_date > dto.end_date {
        return Err(AppError::InvalidInput(format!(
            "start_date {} is after end_date {}",
            dto.start_date, dto.end_date
        )));
    }
    Ok(())
}

// --- Executors ---

#[utoipa::path(
    get,
    path = "/api/executors",
    tag = "Executors",
    responses(
        (status = 200, description = "List executors", body = [executor::Model])
    )
)]
#[get("")]
pub async fn get_executors(data: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let executors = executor::Entity::find()
        .order_by_asc(executor::Column::FullName)
        .all(&data.db)
        .await?;
    Ok(HttpResponse::Ok().json(executors))
}

#[utoipa::path(
    get,
    path = "/api/executors/{id}",
    tag = "Executors",
    params(
        ("id" = i64, Path, description = "Executor ID")
    ),
    responses(
        (status = 200, description = "Executor found", body = executor::Model),
        (status = 404, description = "Executor not found")
    )
)]
#[get("/{id}")]
pub async fn get_executor_by_id(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let found = find_or_404::<executor::Entity, _>(&data.db, path.into_inner(), "Executor").await?;
    Ok(HttpResponse::Ok().json(found))
}

#[utoipa::path(
    post,
    path = "/api/executors",
    tag = "Executors",
    request_body = ExecutorDto,
    responses(
        (status = 201, description = "Executor created successfully", body = executor::Model)
    )
)]
#[post("")]
pub async fn create_executor(
    data: web::Data<AppState>,
    body: web::Json<ExecutorDto>,
) -> Result<HttpResponse, AppError> {
    let created = executor::ActiveModel {
        full_name: Set(validation::required_text("full_name", &body.full_name, 50)?),
        phone_num: Set(validation::phone_number("phone_num", &body.phone_num, 12)?),
        ..Default::default()
    }
    .insert(&data.db)
    .await?;
    Ok(HttpResponse::Created().json(created))
}

#[utoipa::path(
    put,
    path = "/api/executors/{id}",
    tag = "Executors",
    params(
        ("id" = i64, Path, description = "Executor ID")
    ),
    request_body = ExecutorDto,
    responses(
        (status = 200, description = "Executor updated successfully", body = executor::Model),
        (status = 404, description = "Executor not found")
    )
)]
#[put("/{id}")]
pub async fn update_executor(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<ExecutorDto>,
) -> Result<HttpResponse, AppError> {
    let existing = find_or_404::<executor::Entity, _>(&data.db, path.into_inner(), "Executor").await?;
    let mut active = existing.into_active_model();
    active.full_name = Set(validation::required_text("full_name", &body.full_name, 50)?);
    active.phone_num = Set(validation::phone_number("phone_num", &body.phone_num, 12)?);
    Ok(HttpResponse::Ok().json(active.update(&data.db).await?))
}

#[utoipa::path(
    delete,
    path = "/api/executors/{id}",
    tag = "Executors",
    params(
        ("id" = i64, Path, description = "Executor ID")
    ),
    responses(
        (status = 204, description = "Executor and their assignments deleted"),
        (status = 404, description = "Executor not found")
    )
)]
#[delete("/{id}")]
pub async fn delete_executor(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let existing = find_or_404::<executor::Entity, _>(&data.db, path.into_inner(), "Executor").await?;
    existing.into_active_model().delete(&data.db).await?;
    Ok(HttpResponse::NoContent().finish())
}

// --- Work groups ---

#[utoipa::path(
    get,
    path = "/api/work-groups",
    tag = "Executors",
    params(WorkGroupQuery),
    responses(
        (status = 200, description = "List work assignments", body = [work_group::Model])
    )
)]
#[get("")]
pub async fn get_work_groups(
    data: web::Data<AppState>,
    query: web::Query<WorkGroupQuery>,
) -> Result<HttpResponse, AppError> {
    let mut select = work_group::Entity::find().order_by_asc(work_group::Column::StartDate);
    if let Some(request_id) = query.request_id {
        select = select.filter(work_group::Column::RequestId.eq(request_id));
    }
    if let Some(executor_id) = query.executor_id {
        select = select.filter(work_group::Column::ExecutorId.eq(executor_id));
    }
    Ok(HttpResponse::Ok().json(select.all(&data.db).await?))
}

#[utoipa::path(
    get,
    path = "/api/work-groups/{id}",
    tag = "Executors",
    params(
        ("id" = i64, Path, description = "Work group ID")
    ),
    responses(
        (status = 200, description = "Assignment found", body = work_group::Model),
        (status = 404, description = "Assignment not found")
    )
)]
#[get("/{id}")]
pub async fn get_work_group_by_id(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let found = find_or_404::<work_group::Entity, _>(&data.db, path.into_inner(), "Work group").await?;
    Ok(HttpResponse::Ok().json(found))
}

#[utoipa::path(
    post,
    path = "/api/work-groups",
    tag = "Executors",
    request_body = WorkGroupDto,
    responses(
        (status = 201, description = "Executor assigned", body = work_group::Model),
        (status = 400, description = "Start date after end date"),
        (status = 404, description = "Request or executor not found")
    )
)]
#[post("")]
pub async fn create_work_group(
    data: web::Data<AppState>,
    body: web::Json<WorkGroupDto>,
) -> Result<HttpResponse, AppError> {
    check_dates(&body)?;
    ensure_exists::<request::Entity, _>(&data.db, body.request_id, "Request").await?;
    ensure_exists::<executor::Entity, _>(&data.db, body.executor_id, "Executor").await?;

    let created = work_group::ActiveModel {
        request_id: Set(body.request_id),
        executor_id: Set(body.executor_id),
        start_date: Set(body.start_date),
        end_date: Set(body.end_date),
        ..Default::default()
    }
    .insert(&data.db)
    .await?;
    log::info!(
        "assigned executor {} to request {}",
        created.executor_id,
        created.request_id
    );
    Ok(HttpResponse::Created().json(created))
}

#[utoipa::path(
    put,
    path = "/api/work-groups/{id}",
    tag = "Executors",
    params(
        ("id" = i64, Path, description = "Work group ID")
    ),
    request_body = WorkGroupDto,
    responses(
        (status = 200, description = "Assignment updated", body = work_group::Model),
        (status = 404, description = "Assignment, request or executor not found")
    )
)]
#[put("/{id}")]
pub async fn update_work_group(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<WorkGroupDto>,
) -> Result<HttpResponse, AppError> {
    let existing = find_or_404::<work_group::Entity, _>(&data.db, path.into_inner(), "Work group").await?;
    check_dates(&body)?;
    ensure_exists::<request::Entity, _>(&data.db, body.request_id, "Request").await?;
    ensure_exists::<executor::Entity, _>(&data.db, body.executor_id, "Executor").await?;

    let mut active = existing.into_active_model();
    active.request_id = Set(body.request_id);
    active.executor_id = Set(body.executor_id);
    active.start_date = Set(body.start_date);
    active.end_date = Set(body.end_date);
    Ok(HttpResponse::Ok().json(active.update(&data.db).await?))
}

#[utoipa::path(
    delete,
    path = "/api/work-groups/{id}",
    tag = "Executors",
    params(
        ("id" = i64, Path, description = "Work group ID")
    ),
    responses(
        (status = 204, description = "Assignment removed"),
        (status = 404, description = "Assignment not found")
    )
)]
#[delete("/{id}")]
pub async fn delete_work_group(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let existing = find_or_404::<work_group::Entity, _>(&data.db, path.into_inner(), "Work group").await?;
    existing.into_active_model().delete(&data.db).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/executors")
            .service(get_executors)
            .service(get_executor_by_id)
            .service(create_executor)
            .service(update_executor)
            .service(delete_executor),
    )
    .service(
        web::scope("/work-groups")
            .service(get_work_groups)
            .service(get_work_group_by_id)
            .service(create_work_group)
            .service(update_work_group)
            .service(delete_work_group),
    );
}
