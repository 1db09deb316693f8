#[macro_use]
extern crate rocket;

use std::sync::Arc;

use anyhow::Context;
use migration::{Migrator, MigratorTrait};
use rocket::data::{Limits, ToByteUnit};
use rocket::fs::FileServer;
use rocket::serde::json::{json, Json, Value};
use rocket::{Build, Rocket};

pub mod auth_utils;
pub mod config;
pub mod controllers;
pub mod db;
pub mod entities;
pub mod errors;
pub mod fairings;
pub mod guards;
pub mod lifecycle;
pub mod mailer;
pub mod services;
pub mod storage;
pub mod validation;
pub mod views;

use config::AppConfig;
use fairings::cors::Cors;
use fairings::request_log::RequestLogger;
use mailer::{LogMailer, Mailer, SmtpMailer};
use storage::FileStorage;

/// 設定に応じたメーラーを選びます。SMTP が未設定ならログ出力のみ。
pub fn mailer_from_config(config: &AppConfig) -> anyhow::Result<Arc<dyn Mailer>> {
    match &config.smtp {
        Some(smtp) => Ok(Arc::new(SmtpMailer::new(smtp, &config.mail_from)?)),
        None => {
            tracing::warn!("SMTP_HOST is not set; outgoing mail will only be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}

/// Rocketインスタンスを構築する関数。
/// テスト時にも利用できるように分離しています。
pub async fn build_rocket(config: AppConfig, mailer: Arc<dyn Mailer>) -> anyhow::Result<Rocket<Build>> {
    // 1. データベース接続
    let db = db::set_up_db(&config).await.context("Failed to connect to DB")?;

    // 2. マイグレーションの実行 (Djangoの `migrate` コマンドに相当)
    Migrator::up(&db, None).await.context("Failed to run migrations")?;

    // 3. アップロード先の作成
    let storage = FileStorage::new(config.upload_dir.clone());
    storage
        .ensure_dirs()
        .await
        .with_context(|| format!("Failed to create upload directory {}", config.upload_dir.display()))?;

    // 4. アップロードサイズの上限 (1ファイル 10MB)
    let figment = rocket::Config::figment().merge((
        "limits",
        Limits::default()
            .limit("file", 10.mebibytes())
            .limit("data-form", 64.mebibytes())
            .limit("json", 2.mebibytes()),
    ));

    // 5. Rocketインスタンスの構築 (Djangoの `urls.py` に相当)
    Ok(rocket::custom(figment)
        .attach(RequestLogger)
        .attach(Cors::new(config.allowed_origins.clone()))
        .mount("/", routes![health, fairings::cors::preflight])
        .mount("/api/auth", controllers::auth::routes())
        .mount("/api/users", controllers::users::routes())
        .mount("/api/tasks", controllers::tasks::routes())
        .mount("/api/reports", controllers::reports::routes())
        // アップロード済みファイルの配信 (Djangoの `MEDIA_URL` に相当)
        .mount("/uploads", FileServer::from(storage.root().to_path_buf()))
        .register("/", controllers::catchers::catchers())
        .manage(db)
        .manage(storage)
        .manage(mailer)
        .manage(config))
}

#[get("/health")]
fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
