use rocket::http::Status;
use rocket::response::{self, Responder, Response};
use rocket::serde::json::{json, Json, Value};
use rocket::Request;
use sea_orm::{DbErr, SqlErr};

use crate::config::AppConfig;

/// アプリケーション全体で使用するエラー型。
/// 各バリアントが HTTP ステータスに一対一で対応します。
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 入力不備・不正な識別子 (400 Bad Request)
    #[error("{0}")]
    Validation(String),
    /// トークンが無い・不正・期限切れ、またはログイン失敗 (401 Unauthorized)
    #[error("{0}")]
    Unauthenticated(String),
    /// 認証済みだが権限が無い (403 Forbidden)
    #[error("{0}")]
    Forbidden(String),
    /// リソースが見つからない (404 Not Found)
    #[error("{0}")]
    NotFound(String),
    /// メールアドレスの重複など (409 Conflict)
    #[error("{0}")]
    Conflict(String),
    /// データベースエラー (500)
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// その他の内部エラー (500)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// ログイン失敗。メールアドレスの有無を区別しない。
    pub fn invalid_credentials() -> Self {
        AppError::Unauthenticated("Incorrect email or password".into())
    }

    pub fn duplicate_email() -> Self {
        AppError::Conflict("User already exists with this email".into())
    }

    pub fn assignee_not_found() -> Self {
        AppError::NotFound("Assigned user not found".into())
    }

    pub fn wrong_current_password() -> Self {
        AppError::Validation("Current password is incorrect".into())
    }

    pub fn task_not_found() -> Self {
        AppError::NotFound("Task not found".into())
    }

    /// 一意制約違反だけを `Conflict` に読み替え、それ以外はそのまま DB エラーとする。
    pub fn from_unique_violation(err: DbErr, conflict: AppError) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => conflict,
            _ => AppError::Database(err),
        }
    }

    pub fn status(&self) -> Status {
        match self {
            AppError::Validation(_) => Status::BadRequest,
            AppError::Unauthenticated(_) => Status::Unauthorized,
            AppError::Forbidden(_) => Status::Forbidden,
            AppError::NotFound(_) => Status::NotFound,
            AppError::Conflict(_) => Status::Conflict,
            AppError::Database(_) | AppError::Internal(_) => Status::InternalServerError,
        }
    }

    /// クライアントに見せるメッセージ。内部エラーの詳細はここに含めない。
    pub fn public_message(&self) -> String {
        match self {
            AppError::Database(_) | AppError::Internal(_) => "Something went wrong!".to_string(),
            other => other.to_string(),
        }
    }
}

/// エラーレスポンスの共通形式。`detail` は開発環境でのみ付与する。
pub fn error_body(message: &str, detail: Option<String>) -> Value {
    match detail {
        Some(detail) => json!({ "success": false, "message": message, "error": detail }),
        None => json!({ "success": false, "message": message }),
    }
}

pub(crate) fn is_development(request: &Request<'_>) -> bool {
    request
        .rocket()
        .state::<AppConfig>()
        .map(|config| config.is_development())
        .unwrap_or(false)
}

impl<'r> Responder<'r, 'static> for AppError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        if status == Status::InternalServerError {
            tracing::error!(error = %self, path = %request.uri(), "request failed");
        }

        let detail = if is_development(request) && status == Status::InternalServerError {
            Some(self.to_string())
        } else {
            None
        };
        let body = error_body(&self.public_message(), detail);

        Response::build_from(Json(body).respond_to(request)?)
            .status(status)
            .ok()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Internal(e.to_string())
    }
}
