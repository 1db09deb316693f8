use std::sync::Arc;

use rocket::serde::json::{json, Json, Value};
use rocket::State;
use sea_orm::DatabaseConnection;

use crate::errors::AppError;
use crate::guards::auth::AdminUser;
use crate::mailer::Mailer;
use crate::services::report_service::{ReportRequest, ReportService};

/// タスクレポートを管理者全員にメールで送る (管理者のみ)。
/// `filename` と `fileData` (base64) を送ればそのまま添付し、空の `{}` ならサーバー側で CSV を作る。
#[post("/send-email", data = "<request>")]
pub async fn send_email(
    db: &State<DatabaseConnection>,
    mailer: &State<Arc<dyn Mailer>>,
    admin: AdminUser,
    request: Json<ReportRequest>,
) -> Result<Json<Value>, AppError> {
    let receipt = ReportService::send_task_report(db.inner(), mailer.inner().as_ref(), request.into_inner()).await?;
    tracing::debug!(requested_by = admin.actor().id, "report request handled");

    Ok(Json(json!({
        "success": true,
        "message": "Report sent to admin email successfully",
        "filename": receipt.filename,
        "recipients": receipt.recipients,
    })))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![send_email]
}
