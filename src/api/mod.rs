use actix_web::web;

use crate::errors::AppError;

pub mod billing;
pub mod clients;
pub mod executors;
pub mod helpers;
pub mod middleware;
pub mod photos;
pub mod price_lists;
pub mod requests;
pub mod users;
pub mod validation;

/// Registers every resource under `/api`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(users::init_routes)
            .configure(clients::init_routes)
            .configure(price_lists::init_routes)
            .service(
                web::scope("/materials")
                    .configure(price_lists::material_routes)
                    .configure(photos::material_photo_routes),
            )
            .configure(photos::init_routes)
            .configure(requests::init_routes)
            .configure(executors::init_routes)
            .configure(billing::init_routes),
    );
}

/// JSON extractor settings: body limit, and malformed payloads (including
/// unknown enum values) answered with the unified error body.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| AppError::InvalidInput(err.to_string()).into())
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| AppError::InvalidInput(err.to_string()).into())
}
