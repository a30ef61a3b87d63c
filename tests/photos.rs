mod common;

use actix_web::{App, http::StatusCode, test, web};
use ad_agency::api;
use ad_agency::database::models::materials_photo;
use ad_agency::errors::AppError;
use ad_agency::services::photo_service::{UploadedFile, upload_path};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, EntityTrait, IntoActiveModel, PaginatorTrait, Set,
    prelude::Decimal,
};
use serde_json::Value;

use common::{UPLOAD_LIMIT, multipart_body, multipart_content_type, seed_material, setup};

#[actix_web::test]
async fn create_captures_size_and_stored_name() {
    let env = setup().await;
    let db = &env.state.db;
    let material = seed_material(db, "Vinyl film", Decimal::new(45000, 2)).await;

    let content = vec![7u8; 321];
    let photo = env
        .state
        .photos
        .create(db, material.id, UploadedFile::new("roll.png", content))
        .await
        .unwrap();

    assert_eq!(photo.size, 321);
    assert_eq!(photo.filename, "images/Vinyl film/roll.png");
    assert_eq!(photo.file, photo.filename);
    assert_eq!(photo.file, upload_path(&material, "roll.png"));

    let on_disk = env.media.path().join("images/Vinyl film/roll.png");
    assert_eq!(std::fs::metadata(on_disk).unwrap().len(), 321);
}

#[actix_web::test]
async fn every_save_recomputes_metadata() {
    let env = setup().await;
    let db = &env.state.db;
    let material = seed_material(db, "Banner mesh", Decimal::new(30000, 2)).await;

    let photo = env
        .state
        .photos
        .create(db, material.id, UploadedFile::new("a.jpg", vec![1u8; 100]))
        .await
        .unwrap();

    let replaced = env
        .state
        .photos
        .replace(db, photo.id, None, UploadedFile::new("b.jpg", vec![2u8; 250]))
        .await
        .unwrap();

    assert_eq!(replaced.id, photo.id);
    assert_eq!(replaced.size, 250);
    assert_eq!(replaced.filename, "images/Banner mesh/b.jpg");

    let stored = materials_photo::Entity::find_by_id(photo.id)
        .one(db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.size, 250);
    assert_eq!(stored.filename, "images/Banner mesh/b.jpg");

    // the replaced file is gone, the new one is present
    assert!(!env.media.path().join("images/Banner mesh/a.jpg").exists());
    assert!(env.media.path().join("images/Banner mesh/b.jpg").exists());
}

#[actix_web::test]
async fn derived_columns_cannot_be_edited_directly() {
    let env = setup().await;
    let db = &env.state.db;
    let material = seed_material(db, "Banner mesh", Decimal::new(30000, 2)).await;
    let photo = env
        .state
        .photos
        .create(db, material.id, UploadedFile::new("a.jpg", vec![1u8; 100]))
        .await
        .unwrap();

    let mut size_only = photo.clone().into_active_model();
    size_only.size = Set(999_999);
    assert!(size_only.update(db).await.is_err());

    let mut filename_only = photo.clone().into_active_model();
    filename_only.filename = Set("elsewhere.jpg".to_string());
    assert!(filename_only.update(db).await.is_err());

    let mut file_without_size = photo.clone().into_active_model();
    file_without_size.file = Set("images/Banner mesh/other.jpg".to_string());
    assert!(file_without_size.update(db).await.is_err());

    let stored = materials_photo::Entity::find_by_id(photo.id)
        .one(db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored, photo);
    let on_disk = std::fs::metadata(env.media.path().join(&stored.file)).unwrap();
    assert_eq!(on_disk.len() as i64, stored.size);
}

#[actix_web::test]
async fn same_name_uploads_get_their_own_files() {
    let env = setup().await;
    let db = &env.state.db;
    let material = seed_material(db, "Vinyl film", Decimal::new(45000, 2)).await;

    let first = env
        .state
        .photos
        .create(db, material.id, UploadedFile::new("a.png", vec![1u8; 10]))
        .await
        .unwrap();
    let second = env
        .state
        .photos
        .create(db, material.id, UploadedFile::new("a.png", vec![2u8; 20]))
        .await
        .unwrap();

    assert_eq!(first.file, "images/Vinyl film/a.png");
    assert_eq!(second.file, "images/Vinyl film/a_1.png");
    assert_eq!(second.filename, second.file);
    for photo in [&first, &second] {
        let len = std::fs::metadata(env.media.path().join(&photo.file)).unwrap().len();
        assert_eq!(len as i64, photo.size);
    }

    env.state.photos.delete(db, second.id).await.unwrap();
    let remaining = std::fs::read(env.media.path().join(&first.file)).unwrap();
    assert_eq!(remaining, vec![1u8; 10]);
}

#[actix_web::test]
async fn stray_file_on_disk_is_not_overwritten() {
    let env = setup().await;
    let db = &env.state.db;
    let material = seed_material(db, "Film", Decimal::new(10000, 2)).await;
    let dir = env.media.path().join("images/Film");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("a.png"), b"keep me").unwrap();

    let photo = env
        .state
        .photos
        .create(db, material.id, UploadedFile::new("a.png", vec![9u8; 5]))
        .await
        .unwrap();

    assert_eq!(photo.file, "images/Film/a_1.png");
    assert_eq!(std::fs::read(dir.join("a.png")).unwrap(), b"keep me");
}

#[actix_web::test]
async fn replacing_with_the_same_name_keeps_size_in_step() {
    let env = setup().await;
    let db = &env.state.db;
    let material = seed_material(db, "Film", Decimal::new(10000, 2)).await;
    let photo = env
        .state
        .photos
        .create(db, material.id, UploadedFile::new("a.png", vec![1u8; 10]))
        .await
        .unwrap();

    let replaced = env
        .state
        .photos
        .replace(db, photo.id, None, UploadedFile::new("a.png", vec![2u8; 30]))
        .await
        .unwrap();

    // the old file is still claimed by this row while the new one is written
    assert_eq!(replaced.file, "images/Film/a_1.png");
    assert_eq!(replaced.size, 30);
    let len = std::fs::metadata(env.media.path().join(&replaced.file)).unwrap().len();
    assert_eq!(len, 30);
    assert!(!env.media.path().join(&photo.file).exists());
}

#[actix_web::test]
async fn moving_to_missing_material_keeps_the_photo() {
    let env = setup().await;
    let db = &env.state.db;
    let material = seed_material(db, "Film", Decimal::new(10000, 2)).await;
    let photo = env
        .state
        .photos
        .create(db, material.id, UploadedFile::new("x.png", vec![3u8; 40]))
        .await
        .unwrap();

    let result = env
        .state
        .photos
        .replace(db, photo.id, Some(9_999), UploadedFile::new("y.png", vec![4u8; 60]))
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let stored = materials_photo::Entity::find_by_id(photo.id)
        .one(db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored, photo);
    assert!(env.media.path().join("images/Film/x.png").exists());
    assert!(!env.media.path().join("images/Film/y.png").exists());
}

#[actix_web::test]
async fn failed_row_write_removes_the_stored_file() {
    let env = setup().await;
    let db = &env.state.db;
    let material = seed_material(db, "Film", Decimal::new(10000, 2)).await;
    db.execute_unprepared(
        "CREATE TRIGGER refuse_photos BEFORE INSERT ON materials_photos \
         BEGIN SELECT RAISE(ABORT, 'photos are read-only'); END;",
    )
    .await
    .unwrap();

    let result = env
        .state
        .photos
        .create(db, material.id, UploadedFile::new("a.png", vec![1u8; 10]))
        .await;

    assert!(matches!(result, Err(AppError::DbError(_))));
    assert!(!env.media.path().join("images/Film/a.png").exists());
    assert_eq!(materials_photo::Entity::find().count(db).await.unwrap(), 0);
}

#[actix_web::test]
async fn filename_follows_file_even_when_set_directly() {
    let env = setup().await;
    let db = &env.state.db;
    let material = seed_material(db, "Acrylic", Decimal::new(99000, 2)).await;

    let inserted = materials_photo::ActiveModel {
        material_id: Set(material.id),
        file: Set("images/Acrylic/sheet.png".to_string()),
        filename: Set("something-else.png".to_string()),
        size: Set(10),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();

    assert_eq!(inserted.filename, "images/Acrylic/sheet.png");
}

#[actix_web::test]
async fn disallowed_type_is_rejected_without_side_effects() {
    let env = setup().await;
    let db = &env.state.db;
    let material = seed_material(db, "Vinyl film", Decimal::new(45000, 2)).await;

    let result = env
        .state
        .photos
        .create(db, material.id, UploadedFile::new("payload.exe", vec![1u8; 10]))
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(materials_photo::Entity::find().count(db).await.unwrap(), 0);
    assert!(!env.media.path().join("images").exists());
}

#[actix_web::test]
async fn oversized_file_is_rejected_without_side_effects() {
    let env = setup().await;
    let db = &env.state.db;
    let material = seed_material(db, "Vinyl film", Decimal::new(45000, 2)).await;

    let result = env
        .state
        .photos
        .create(
            db,
            material.id,
            UploadedFile::new("huge.png", vec![0u8; UPLOAD_LIMIT + 1]),
        )
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(materials_photo::Entity::find().count(db).await.unwrap(), 0);
    assert!(!env.media.path().join("images").exists());
}

#[actix_web::test]
async fn upload_to_missing_material_is_not_found() {
    let env = setup().await;
    let result = env
        .state
        .photos
        .create(&env.state.db, 404, UploadedFile::new("a.png", vec![1u8; 5]))
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[actix_web::test]
async fn multipart_upload_and_delete_over_http() {
    let env = setup().await;
    let material = seed_material(&env.state.db, "Film", Decimal::new(10000, 2)).await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(env.state.clone()))
            .app_data(api::json_config(1024 * 1024))
            .configure(api::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/materials/{}/photos", material.id))
        .insert_header(("content-type", multipart_content_type()))
        .set_payload(multipart_body("front.png", b"\x89PNG\r\n\x1a\nbody", &[]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let photo: Value = test::read_body_json(resp).await;
    assert_eq!(photo["filename"], "images/Film/front.png");
    assert_eq!(photo["size"], 12);

    let req = test::TestRequest::get()
        .uri(&format!("/api/materials/{}/photos", material.id))
        .to_request();
    let list: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(list.len(), 1);

    let id = photo["id"].as_i64().unwrap();
    let req = test::TestRequest::delete()
        .uri(&format!("/api/photos/{}", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(!env.media.path().join("images/Film/front.png").exists());
}

#[actix_web::test]
async fn multipart_upload_with_bad_type_answers_422() {
    let env = setup().await;
    let material = seed_material(&env.state.db, "Film", Decimal::new(10000, 2)).await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(env.state.clone()))
            .configure(api::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/materials/{}/photos", material.id))
        .insert_header(("content-type", multipart_content_type()))
        .set_payload(multipart_body("notes.txt", b"hello", &[]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(
        materials_photo::Entity::find().count(&env.state.db).await.unwrap(),
        0
    );
}

#[actix_web::test]
async fn replace_can_move_photo_to_another_material() {
    let env = setup().await;
    let db = &env.state.db;
    let first = seed_material(db, "Film", Decimal::new(10000, 2)).await;
    let second = seed_material(db, "Mesh", Decimal::new(20000, 2)).await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(env.state.clone()))
            .configure(api::configure),
    )
    .await;

    let photo = env
        .state
        .photos
        .create(db, first.id, UploadedFile::new("x.png", vec![3u8; 40]))
        .await
        .unwrap();

    let second_id = second.id.to_string();
    let req = test::TestRequest::put()
        .uri(&format!("/api/photos/{}", photo.id))
        .insert_header(("content-type", multipart_content_type()))
        .set_payload(multipart_body("x.png", &[4u8; 60], &[("material_id", &second_id)]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["material_id"], second.id);
    assert_eq!(body["filename"], "images/Mesh/x.png");
    assert_eq!(body["size"], 60);
    assert!(!env.media.path().join("images/Film/x.png").exists());
}
