use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rocket::http::Status;
use serde_json::json;
use task_tracker::db::set_up_db;
use task_tracker::errors::AppError;
use task_tracker::services::report_service::{ReportRequest, ReportService};
use migration::{Migrator, MigratorTrait};

mod common;

#[rocket::async_test]
async fn test_report_requires_admin() {
    let app = common::setup().await;
    let bob = app.register("Bob", "bob@example.com").await;

    let (status, _) = app.post_json("/api/reports/send-email", Some(&bob.token), json!({})).await;
    assert_eq!(status, Status::Forbidden);
    assert!(app.mailer.sent().is_empty());
}

#[rocket::async_test]
async fn test_generated_report_goes_to_every_admin() {
    let app = common::setup().await;
    let admin = app.register_admin("Admin", "admin@example.com").await;
    app.register_admin("Second", "second@example.com").await;
    let bob = app.register("Bob", "bob@example.com").await;

    app.create_task(
        &admin.token,
        json!({ "title": "Quarterly, numbers", "description": "x", "dueDate": "2025-06-30", "assignedTo": bob.id }),
    )
    .await;

    let (status, body) = app.post_json("/api/reports/send-email", Some(&admin.token), json!({})).await;
    assert_eq!(status, Status::Ok, "{}", body);
    assert_eq!(body["recipients"], 2);
    let filename = body["filename"].as_str().unwrap();
    assert!(filename.starts_with("task-report-") && filename.ends_with(".csv"));

    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, ["admin@example.com", "second@example.com"]);

    let attachment = sent[0].attachment.as_ref().unwrap();
    assert_eq!(attachment.filename, filename);
    let csv = String::from_utf8(attachment.content.clone()).unwrap();
    assert!(csv.starts_with("ID,Title,Description,Status"));
    assert!(csv.contains("\"Quarterly, numbers\""));
    assert!(csv.contains(",Bob,"));
}

#[rocket::async_test]
async fn test_relayed_report_is_decoded() {
    let app = common::setup().await;
    let admin = app.register_admin("Admin", "admin@example.com").await;

    let payload = "ID,Title\r\n1,From the browser\r\n";
    let (status, body) = app
        .post_json(
            "/api/reports/send-email",
            Some(&admin.token),
            json!({ "filename": "export.csv", "fileData": STANDARD.encode(payload) }),
        )
        .await;
    assert_eq!(status, Status::Ok);
    assert_eq!(body["filename"], "export.csv");

    let sent = app.mailer.sent();
    let attachment = sent[0].attachment.as_ref().unwrap();
    assert_eq!(attachment.content, payload.as_bytes());
}

#[rocket::async_test]
async fn test_report_request_validation() {
    let app = common::setup().await;
    let admin = app.register_admin("Admin", "admin@example.com").await;

    let (status, body) = app
        .post_json("/api/reports/send-email", Some(&admin.token), json!({ "filename": "only.csv" }))
        .await;
    assert_eq!(status, Status::BadRequest);
    assert_eq!(body["message"], "Please provide both filename and file data");

    let (status, body) = app
        .post_json(
            "/api/reports/send-email",
            Some(&admin.token),
            json!({ "filename": "bad.csv", "fileData": "***not base64***" }),
        )
        .await;
    assert_eq!(status, Status::BadRequest);
    assert_eq!(body["message"], "File data must be base64 encoded");

    assert!(app.mailer.sent().is_empty());
}

#[rocket::async_test]
async fn test_report_needs_an_admin_recipient() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::test_config(&dir);
    let db = set_up_db(&config).await.unwrap();
    Migrator::up(&db, None).await.unwrap();

    let mailer = common::RecordingMailer::default();
    let result = ReportService::send_task_report(&db, &mailer, ReportRequest::default()).await;

    match result {
        Err(AppError::NotFound(message)) => assert_eq!(message, "No admin users found"),
        other => panic!("expected NotFound, got {:?}", other),
    }
    assert!(mailer.sent().is_empty());
}
