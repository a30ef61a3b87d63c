use actix_web::{delete, get, post, put, web, HttpResponse};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::{helpers::find_or_404, validation},
    app_state::AppState,
    database::models::client,
    errors::AppError,
};

// --- DTOs (Data Transfer Objects) ---

#[derive(Deserialize, ToSchema, Clone)]
pub struct ClientDto {
    pub legal_entity: String,
    pub contact_person: String,
    pub phone_num: String,
    pub email: String,
    pub bank_details: String,
    pub old_phone: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct ClientQuery {
    /// Matches legal entity or contact person.
    pub search: Option<String>,
}

struct CleanClient {
    legal_entity: String,
    contact_person: String,
    phone_num: String,
    email: String,
    bank_details: String,
    old_phone: Option<String>,
}

fn clean(dto: &ClientDto) -> Result<CleanClient, AppError> {
    let old_phone = match dto.old_phone.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(phone) => Some(validation::phone_number("old_phone", phone, 12)?),
    };
    Ok(CleanClient {
        legal_entity: validation::required_text("legal_entity", &dto.legal_entity, 60)?,
        contact_person: validation::required_text("contact_person", &dto.contact_person, 60)?,
        phone_num: validation::phone_number("phone_num", &dto.phone_num, 12)?,
        email: validation::email_address("email", &dto.email, 30)?,
        bank_details: validation::required_text("bank_details", &dto.bank_details, 30)?,
        old_phone,
    })
}

// --- Route Handlers ---

#[utoipa::path(
    get,
    path = "/api/clients",
    tag = "Clients",
    params(ClientQuery),
    responses(
        (status = 200, description = "List clients", body = [client::Model])
    )
)]
#[get("")]
pub async fn get_clients(
    data: web::Data<AppState>,
    query: web::Query<ClientQuery>,
) -> Result<HttpResponse, AppError> {
    let mut select = client::Entity::find().order_by_asc(client::Column::Id);
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        select = select.filter(
            Condition::any()
                .add(client::Column::LegalEntity.contains(search))
                .add(client::Column::ContactPerson.contains(search)),
        );
    }
    let clients = select.all(&data.db).await?;
    Ok(HttpResponse::Ok().json(clients))
}

#[utoipa::path(
    get,
    path = "/api/clients/{id}",
    tag = "Clients",
    params(
        ("id" = i64, Path, description = "Client ID")
    ),
    responses(
        (status = 200, description = "Client found", body = client::Model),
        (status = 404, description = "Client not found")
    )
)]
#[get("/{id}")]
pub async fn get_client_by_id(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let found = find_or_404::<client::Entity, _>(&data.db, path.into_inner(), "Client").await?;
    Ok(HttpResponse::Ok().json(found))
}

#[utoipa::path(
    post,
    path = "/api/clients",
    tag = "Clients",
    request_body = ClientDto,
    responses(
        (status = 201, description = "Client created successfully", body = client::Model),
        (status = 400, description = "Invalid input")
    )
)]
#[post("")]
pub async fn create_client(
    data: web::Data<AppState>,
    body: web::Json<ClientDto>,
) -> Result<HttpResponse, AppError> {
    let input = clean(&body)?;
    let created = client::ActiveModel {
        legal_entity: Set(input.legal_entity),
        contact_person: Set(input.contact_person),
        phone_num: Set(input.phone_num),
        email: Set(input.email),
        bank_details: Set(input.bank_details),
        old_phone: Set(input.old_phone),
        ..Default::default()
    }
    .insert(&data.db)
    .await?;

    log::info!("created client {}", created.id);
    Ok(HttpResponse::Created().json(created))
}

#[utoipa::path(
    put,
    path = "/api/clients/{id}",
    tag = "Clients",
    params(
        ("id" = i64, Path, description = "Client ID")
    ),
    request_body = ClientDto,
    responses(
        (status = 200, description = "Client updated successfully", body = client::Model),
        (status = 404, description = "Client not found")
    )
)]
#[put("/{id}")]
pub async fn update_client(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<ClientDto>,
) -> Result<HttpResponse, AppError> {
    let existing = find_or_404::<client::Entity, _>(&data.db, path.into_inner(), "Client").await?;
    let input = clean(&body)?;

    let mut active = existing.into_active_model();
    active.legal_entity = Set(input.legal_entity);
    active.contact_person = Set(input.contact_person);
    active.phone_num = Set(input.phone_num);
    active.email = Set(input.email);
    active.bank_details = Set(input.bank_details);
    active.old_phone = Set(input.old_phone);

    let updated = active.update(&data.db).await?;
    Ok(HttpResponse::Ok().json(updated))
}

/// Deleting a client removes its requests and everything hanging off them.
#[utoipa::path(
    delete,
    path = "/api/clients/{id}",
    tag = "Clients",
    params(
        ("id" = i64, Path, description = "Client ID")
    ),
    responses(
        (status = 204, description = "Client deleted successfully"),
        (status = 404, description = "Client not found")
    )
)]
#[delete("/{id}")]
pub async fn delete_client(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let existing = find_or_404::<client::Entity, _>(&data.db, path.into_inner(), "Client").await?;
    let id = existing.id;
    existing.into_active_model().delete(&data.db).await?;
    log::info!("deleted client {} with dependent records", id);
    Ok(HttpResponse::NoContent().finish())
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/clients")
            .service(get_clients)
            .service(get_client_by_id)
            .service(create_client)
            .service(update_client)
            .service(delete_client),
    );
}
