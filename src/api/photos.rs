use actix_multipart::Multipart;
use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};
use futures_util::StreamExt;
use utoipa::ToSchema;

use crate::{
    api::{
        helpers::{ensure_exists, find_or_404},
        middleware::request_id,
    },
    app_state::AppState,
    database::models::{material_pl, materials_photo},
    errors::AppError,
    services::photo_service::UploadedFile,
};

/// Multipart form accepted by the upload endpoints.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct PhotoUploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    /// Only read when replacing: moves the photo to another material.
    pub material_id: Option<i64>,
}

struct ParsedUpload {
    file: UploadedFile,
    material_id: Option<i64>,
}

/// Reads the `file` and optional `material_id` fields. Stops reading as soon
/// as the file exceeds `max_bytes`.
async fn read_upload(mut payload: Multipart, max_bytes: usize) -> Result<ParsedUpload, AppError> {
    let mut file: Option<UploadedFile> = None;
    let mut material_id: Option<i64> = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| AppError::InvalidInput(e.to_string()))?;
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let filename = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                    .map(str::to_string)
                    .ok_or_else(|| {
                        AppError::InvalidInput("The 'file' field has no filename".to_string())
                    })?;

                let mut content = Vec::new();
                while let Some(chunk) = field.next().await {
                    let chunk = chunk.map_err(|e| AppError::InvalidInput(e.to_string()))?;
                    if content.len() + chunk.len() > max_bytes {
                        log::warn!("upload {} exceeds {} bytes", filename, max_bytes);
                        return Err(AppError::Validation(format!(
                            "File exceeds the limit of {} bytes",
                            max_bytes
                        )));
                    }
                    content.extend_from_slice(&chunk);
                }
                file = Some(UploadedFile::new(filename, content));
            }
            "material_id" => {
                let mut raw = Vec::new();
                while let Some(chunk) = field.next().await {
                    let chunk = chunk.map_err(|e| AppError::InvalidInput(e.to_string()))?;
                    raw.extend_from_slice(&chunk);
                }
                let text = String::from_utf8_lossy(&raw);
                let id = text.trim().parse::<i64>().map_err(|_| {
                    AppError::InvalidInput(format!("Invalid material_id: {}", text.trim()))
                })?;
                material_id = Some(id);
            }
            _ => {
                // drain unknown fields
                while let Some(chunk) = field.next().await {
                    chunk.map_err(|e| AppError::InvalidInput(e.to_string()))?;
                }
            }
        }
    }

    let file =
        file.ok_or_else(|| AppError::InvalidInput("Missing required 'file' field".to_string()))?;
    Ok(ParsedUpload { file, material_id })
}

// --- Route Handlers ---

#[utoipa::path(
    get,
    path = "/api/materials/{id}/photos",
    tag = "Photos",
    params(
        ("id" = i64, Path, description = "Material ID")
    ),
    responses(
        (status = 200, description = "Photos of the material", body = [materials_photo::Model]),
        (status = 404, description = "Material not found")
    )
)]
#[get("/{id}/photos")]
pub async fn get_material_photos(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let material_id = path.into_inner();
    ensure_exists::<material_pl::Entity, _>(&data.db, material_id, "Material").await?;
    let photos = data.photos.list_for_material(&data.db, material_id).await?;
    Ok(HttpResponse::Ok().json(photos))
}

#[utoipa::path(
    post,
    path = "/api/materials/{id}/photos",
    tag = "Photos",
    params(
        ("id" = i64, Path, description = "Material ID")
    ),
    request_body(content = PhotoUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Photo stored", body = materials_photo::Model),
        (status = 404, description = "Material not found"),
        (status = 422, description = "File type or size rejected")
    )
)]
#[post("/{id}/photos")]
pub async fn upload_photo(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i64>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let material_id = path.into_inner();
    let upload = read_upload(payload, data.photos.policy().max_bytes).await?;
    log::debug!(
        "request_id={} upload {} ({} bytes) for material {}",
        request_id(&req),
        upload.file.name,
        upload.file.size(),
        material_id
    );
    let photo = data.photos.create(&data.db, material_id, upload.file).await?;
    Ok(HttpResponse::Created().json(photo))
}

#[utoipa::path(
    get,
    path = "/api/photos/{id}",
    tag = "Photos",
    params(
        ("id" = i64, Path, description = "Photo ID")
    ),
    responses(
        (status = 200, description = "Photo found", body = materials_photo::Model),
        (status = 404, description = "Photo not found")
    )
)]
#[get("/{id}")]
pub async fn get_photo_by_id(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let photo = find_or_404::<materials_photo::Entity, _>(&data.db, path.into_inner(), "Photo").await?;
    Ok(HttpResponse::Ok().json(photo))
}

#[utoipa::path(
    put,
    path = "/api/photos/{id}",
    tag = "Photos",
    params(
        ("id" = i64, Path, description = "Photo ID")
    ),
    request_body(content = PhotoUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Photo replaced", body = materials_photo::Model),
        (status = 404, description = "Photo or material not found"),
        (status = 422, description = "File type or size rejected")
    )
)]
#[put("/{id}")]
pub async fn replace_photo(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i64>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let photo_id = path.into_inner();
    let upload = read_upload(payload, data.photos.policy().max_bytes).await?;
    log::debug!(
        "request_id={} replace photo {} with {} ({} bytes)",
        request_id(&req),
        photo_id,
        upload.file.name,
        upload.file.size()
    );
    let photo = data
        .photos
        .replace(&data.db, photo_id, upload.material_id, upload.file)
        .await?;
    Ok(HttpResponse::Ok().json(photo))
}

#[utoipa::path(
    delete,
    path = "/api/photos/{id}",
    tag = "Photos",
    params(
        ("id" = i64, Path, description = "Photo ID")
    ),
    responses(
        (status = 204, description = "Photo and its file removed"),
        (status = 404, description = "Photo not found")
    )
)]
#[delete("/{id}")]
pub async fn delete_photo(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let photo_id = path.into_inner();
    log::debug!("request_id={} delete photo {}", request_id(&req), photo_id);
    data.photos.delete(&data.db, photo_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Routes mounted inside the `/materials` scope.
pub fn material_photo_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_material_photos).service(upload_photo);
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/photos")
            .service(get_photo_by_id)
            .service(replace_photo)
            .service(delete_photo),
    );
}
