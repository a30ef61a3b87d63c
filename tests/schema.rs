mod common;

use std::str::FromStr;

use ad_agency::database::models::UserRole;
use ad_agency::database::schema;
use ad_agency::errors::AppError;
use ad_agency::services::accounts::{self, NewUser};
use sea_orm::prelude::Decimal;
use serde_json::Value;

use common::{seed_material, test_db};

#[actix_web::test]
async fn dump_keeps_column_values_and_types() {
    let db = test_db().await;
    let film = seed_material(&db, "Vinyl film", Decimal::new(4500, 2)).await;
    seed_material(&db, "Banner mesh", Decimal::new(30000, 2)).await;

    let rows = schema::dump_table(&db, "materials_price_list", None).await.unwrap();
    assert_eq!(rows.len(), 2);
    let first = &rows[0];
    assert_eq!(first["id"], Value::from(film.id));
    assert_eq!(first["title"], "Vinyl film");
    let price = Decimal::from_str(first["price"].as_str().unwrap()).unwrap();
    assert_eq!(price, Decimal::new(4500, 2));

    let rows = schema::dump_table(&db, "materials_price_list", Some("title = 'Banner mesh'"))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["title"], "Banner mesh");
    assert!(rows[0]["id"].is_i64());
}

#[actix_web::test]
async fn dump_of_users_leaves_out_password_hash() {
    let db = test_db().await;
    accounts::create_user(
        &db,
        NewUser {
            username: "olga".to_string(),
            password: "correct-horse".to_string(),
            first_name: "Olga".to_string(),
            last_name: "Petrova".to_string(),
            email: "olga@example.com".to_string(),
            tel: None,
            role: UserRole::Manager,
            is_staff: true,
            is_superuser: false,
        },
    )
    .await
    .unwrap();

    let rows = schema::dump_table(&db, "users", None).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["username"], "olga");
    assert_eq!(rows[0]["is_staff"], true);
    assert!(rows[0].get("password_hash").is_none());
}

#[actix_web::test]
async fn dump_of_unknown_table_lists_known_ones() {
    let db = test_db().await;
    let err = schema::dump_table(&db, "sqlite_master", None).await.unwrap_err();
    match err {
        AppError::InvalidInput(msg) => assert!(msg.contains("requests")),
        other => panic!("unexpected error: {:?}", other),
    }
}
