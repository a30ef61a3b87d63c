#![allow(dead_code)]

use ad_agency::AppState;
use ad_agency::config::{Config, DatabaseSettings};
use ad_agency::database::models::{
    RequestStatus, ServiceType, client, executor, material_pl, request, service_pl,
};
use ad_agency::database;
use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, prelude::Decimal};
use tempfile::TempDir;

pub const UPLOAD_LIMIT: usize = 2048;

pub fn test_config(media_root: &std::path::Path) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 8080,
        max_body_bytes: None,
        media_root: Some(media_root.to_string_lossy().to_string()),
        upload_max_bytes: Some(UPLOAD_LIMIT),
        upload_allowed_types: Some("png,jpg,jpeg".to_string()),
        workers: Some(1),
        cors_allowed_origin: None,
    }
}

/// A single-connection in-memory database with the full schema.
pub async fn test_db() -> DatabaseConnection {
    let settings = DatabaseSettings {
        url: "sqlite::memory:".to_string(),
        max_connections: None,
        min_connections: None,
        connect_timeout_secs: None,
        acquire_timeout_secs: None,
        idle_timeout_secs: None,
        sql_log: Some(false),
        auto_migrate: true,
    };
    database::connect_with_settings(&settings)
        .await
        .expect("sqlite connect")
}

pub struct TestEnv {
    pub state: AppState,
    pub media: TempDir,
}

pub async fn setup() -> TestEnv {
    let media = tempfile::tempdir().expect("tempdir");
    let db = test_db().await;
    let state = AppState::new(db, test_config(media.path()));
    TestEnv { state, media }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub async fn seed_client(db: &DatabaseConnection, legal_entity: &str) -> client::Model {
    client::ActiveModel {
        legal_entity: Set(legal_entity.to_string()),
        contact_person: Set("Anna Petrova".to_string()),
        phone_num: Set("+79990001122".to_string()),
        email: Set("anna@vector.ru".to_string()),
        bank_details: Set("40702810900000000001".to_string()),
        old_phone: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn seed_request(db: &DatabaseConnection, client_id: i64) -> request::Model {
    request::ActiveModel {
        client_id: Set(client_id),
        req_date: Set(date(2024, 3, 1)),
        workload: Set("city light boxes".to_string()),
        final_price: Set(Decimal::ZERO),
        status: Set(RequestStatus::Unpaid),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn seed_service(db: &DatabaseConnection, price: Decimal) -> service_pl::Model {
    service_pl::ActiveModel {
        service_type: Set(ServiceType::Street),
        title: Set("Billboard placement".to_string()),
        price: Set(price),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn seed_material(db: &DatabaseConnection, title: &str, price: Decimal) -> material_pl::Model {
    material_pl::ActiveModel {
        title: Set(title.to_string()),
        description: Set("Self-adhesive, 80 micron".to_string()),
        price: Set(price),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn seed_executor(db: &DatabaseConnection) -> executor::Model {
    executor::ActiveModel {
        full_name: Set("Ivan Sidorov".to_string()),
        phone_num: Set("+79110002233".to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub const BOUNDARY: &str = "----adagencyboundary";

/// Builds a multipart/form-data body with one file part and optional text parts.
pub fn multipart_body(filename: &str, content: &[u8], fields: &[(&str, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}
