//! CSV import and export round the HTTP surface.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::Value;

use delivery_tracker_core::DeliveryStatus::Pending;
use delivery_tracker_integration_tests::{ADMIN_EMAIL, TestServer, USER_EMAIL, delivery};

const CSV: &str = "名前,住所,ステータス,配送日\n\
    山田太郎,東京都千代田区1-1,配送待ち,2024-02-20\n\
    佐藤花子,大阪府大阪市2-2,配送中,2024-02-21\n\
    鈴木一郎,愛知県名古屋市3-3,紛失,2024-02-22\n";

#[tokio::test]
async fn test_strict_import_is_all_or_nothing() {
    let server = TestServer::start().await;
    let admin = server.login(ADMIN_EMAIL).await;

    let response = admin
        .post(server.url("/api/deliveries/import"))
        .body(CSV)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["errors"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    assert!(server.state.deliveries().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_skip_invalid_imports_good_rows() {
    let server = TestServer::start().await;
    let admin = server.login(ADMIN_EMAIL).await;

    let body: Value = admin
        .post(server.url("/api/deliveries/import?mode=skip_invalid"))
        .body(CSV)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["imported"], 2);
    assert_eq!(body["errors"].as_array().unwrap().len(), 1);
    assert_eq!(server.state.deliveries().list().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_user_exports_csv() {
    let server = TestServer::start().await;
    server
        .store(&[delivery("DEL1", "山田太郎", Pending, "2024-02-20")])
        .await;
    let user = server.login(USER_EMAIL).await;

    let response = user
        .get(server.url("/api/deliveries/export?format=csv"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response.headers()["content-disposition"].to_str().unwrap().to_owned();
    assert!(disposition.contains("deliveries_"));
    assert!(disposition.contains(".csv"));

    let text = response.text().await.unwrap();
    assert!(text.contains("山田太郎"));
    assert!(text.contains("配送待ち"));
}
