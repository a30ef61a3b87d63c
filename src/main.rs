use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use dotenvy::dotenv;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use ad_agency::api::{
    self, billing, clients, executors, photos, price_lists, requests, users,
};
use ad_agency::config::Config;
use ad_agency::database::{self, models};
use ad_agency::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        // Users
        users::get_users,
        users::get_user_by_id,
        users::create_user,
        users::update_user,
        users::delete_user,
        // Clients
        clients::get_clients,
        clients::get_client_by_id,
        clients::create_client,
        clients::update_client,
        clients::delete_client,
        // Price lists
        price_lists::get_services,
        price_lists::get_service_by_id,
        price_lists::create_service,
        price_lists::update_service,
        price_lists::delete_service,
        price_lists::get_materials,
        price_lists::get_material_by_id,
        price_lists::create_material,
        price_lists::update_material,
        price_lists::delete_material,
        // Photos
        photos::get_material_photos,
        photos::upload_photo,
        photos::get_photo_by_id,
        photos::replace_photo,
        photos::delete_photo,
        // Requests
        requests::get_requests,
        requests::get_request_by_id,
        requests::create_request,
        requests::update_request,
        requests::delete_request,
        requests::recalculate_request,
        requests::get_chosen_services,
        requests::add_chosen_service,
        requests::delete_chosen_service,
        requests::get_chosen_materials,
        requests::add_chosen_material,
        requests::delete_chosen_material,
        // Executors
        executors::get_executors,
        executors::get_executor_by_id,
        executors::create_executor,
        executors::update_executor,
        executors::delete_executor,
        executors::get_work_groups,
        executors::get_work_group_by_id,
        executors::create_work_group,
        executors::update_work_group,
        executors::delete_work_group,
        // Billing
        billing::get_invoices,
        billing::get_invoice_by_id,
        billing::create_invoice,
        billing::delete_invoice,
        billing::get_payment_orders,
        billing::get_payment_order_by_id,
        billing::create_payment_order,
        billing::delete_payment_order,
    ),
    components(
        schemas(
            // --- Models ---
            models::client::Model,
            models::service_pl::Model,
            models::material_pl::Model,
            models::request::Model,
            models::chosen_service::Model,
            models::chosen_material::Model,
            models::executor::Model,
            models::work_group::Model,
            models::invoice::Model,
            models::payment_order::Model,
            models::materials_photo::Model,
            models::UserRole,
            models::ServiceType,
            models::RequestStatus,

            // --- DTOs & API Structs ---
            users::CreateUserDto,
            users::UpdateUserDto,
            users::UserView,
            clients::ClientDto,
            price_lists::ServiceDto,
            price_lists::MaterialDto,
            photos::PhotoUploadForm,
            requests::RequestDto,
            requests::RequestView,
            requests::ChosenServiceDto,
            requests::ChosenMaterialDto,
            executors::ExecutorDto,
            executors::WorkGroupDto,
            billing::InvoiceDto,
            billing::InvoiceView,
            billing::PaymentOrderDto,
        )
    ),
    tags(
        (name = "Users", description = "Back-office accounts"),
        (name = "Clients", description = "Contracting organizations"),
        (name = "Price lists", description = "Services and materials catalog"),
        (name = "Photos", description = "Material photo uploads"),
        (name = "Requests", description = "Client orders and their chosen services/materials"),
        (name = "Executors", description = "Workers and their assignments"),
        (name = "Billing", description = "Invoices and payment orders")
    )
)]
struct ApiDoc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("Failed to load configuration: {}", e))
    })?;
    let db = database::connect().await?;

    let state = AppState::new(db, config.clone());
    let media_root = config.effective_media_root();
    std::fs::create_dir_all(&media_root)?;

    let host = config.host.clone();
    let port = config.port;
    let workers = config.effective_workers();
    let json_limit = config.effective_max_body_bytes();

    log::info!("Starting server at http://{}:{} ({} workers)", host, port, workers);
    log::info!("Serving uploads from {}", media_root.display());
    log::info!("Swagger UI available at http://{}:{}/swagger-ui/", host, port);

    HttpServer::new(move || {
        let cors = match &config.cors_allowed_origin {
            Some(origin) => Cors::default()
                .allowed_origin(origin)
                .allow_any_method()
                .allow_any_header(),
            None => Cors::permissive(),
        };

        App::new()
            .wrap(middleware::NormalizePath::trim())
            .wrap(middleware::Logger::default())
            .wrap(api::middleware::RequestId)
            .wrap(cors)
            .app_data(web::Data::new(state.clone()))
            .app_data(api::json_config(json_limit))
            .app_data(api::query_config())
            .configure(api::configure)
            .service(actix_files::Files::new("/media", media_root.clone()))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
