use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use validator::Validate;

use crate::errors::AppError;

lazy_static! {
    /// 添付を許可する拡張子 (画像とドキュメント)
    static ref UPLOAD_EXTENSION_REGEX: Regex = Regex::new(r"^(jpeg|jpg|png|gif|pdf|doc|docx|xls|xlsx|txt)$").unwrap();
    /// プロフィール画像として許可する拡張子
    static ref IMAGE_EXTENSION_REGEX: Regex = Regex::new(r"^(jpeg|jpg|png|gif)$").unwrap();
}

/// ユーザー登録・作成フォームのバリデーション。
#[derive(Debug, Validate)]
pub struct UserFormValidation {
    #[validate(length(min = 1, max = 50, message = "Name must be between 1 and 50 characters"))]
    pub name: String,

    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
}

impl UserFormValidation {
    pub fn new(name: &str, email: &str, password: Option<&str>) -> Self {
        Self {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            password: password.map(|p| p.to_string()),
        }
    }

    /// バリデーションを実行し、エラーメッセージを返す
    pub fn validate_form(&self) -> Result<(), Vec<String>> {
        match self.validate() {
            Ok(_) => Ok(()),
            Err(errors) => {
                let mut messages = Vec::new();
                for (field, field_errors) in errors.field_errors() {
                    for error in field_errors {
                        let msg = error
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("{} is invalid", field));
                        messages.push(msg);
                    }
                }
                messages.sort();
                Err(messages)
            }
        }
    }

    /// 検証結果を `AppError::Validation` に変換します。
    pub fn check(&self) -> Result<(), AppError> {
        self.validate_form()
            .map_err(|messages| AppError::Validation(messages.join(", ")))
    }
}

/// パスに含まれる識別子を検証します。正の整数でなければ検索前に 400 を返す。
pub fn parse_id(raw: &str, what: &str) -> Result<i32, AppError> {
    match raw.parse::<i32>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::Validation(format!("Invalid {} ID format", what))),
    }
}

/// 期日を解釈します。`YYYY-MM-DD` (UTC の 0 時) と RFC 3339 の両方を受け付ける。
pub fn parse_due_date(raw: &str) -> Result<DateTime<FixedOffset>, AppError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
        .ok_or_else(|| AppError::Validation("Invalid due date".into()))
}

pub fn now() -> DateTime<FixedOffset> {
    Utc::now().fixed_offset()
}

/// 添付として受け付けるファイルか判定します。
/// 拡張子を許可リストで確認し、MIME タイプがその拡張子に対応するものかを確認する。
pub fn is_allowed_upload(extension: &str, mime_type: &str) -> bool {
    let extension = extension.to_lowercase();
    if !UPLOAD_EXTENSION_REGEX.is_match(&extension) {
        return false;
    }
    let mime = mime_type.to_lowercase();
    expected_mime_prefixes(&extension).iter().any(|prefix| mime.starts_with(prefix))
}

/// プロフィール画像として受け付けるファイルか判定します。
pub fn is_allowed_image(extension: &str, mime_type: &str) -> bool {
    IMAGE_EXTENSION_REGEX.is_match(&extension.to_lowercase()) && mime_type.to_lowercase().starts_with("image/")
}

// 拡張子ごとに受け付ける MIME タイプ
fn expected_mime_prefixes(extension: &str) -> &'static [&'static str] {
    match extension {
        "jpeg" | "jpg" | "png" | "gif" => &["image/"],
        "pdf" => &["application/pdf"],
        "txt" => &["text/plain"],
        "doc" => &["application/msword"],
        "docx" => &["application/vnd.openxmlformats-officedocument.wordprocessingml"],
        "xls" => &["application/vnd.ms-excel"],
        "xlsx" => &["application/vnd.openxmlformats-officedocument.spreadsheetml"],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_user_form() {
        let form = UserFormValidation::new("Alice", "alice@example.com", Some("secret1"));
        assert!(form.validate_form().is_ok());
    }

    #[test]
    fn test_empty_name() {
        let form = UserFormValidation::new("   ", "alice@example.com", Some("secret1"));
        assert!(form.validate_form().is_err());
    }

    #[test]
    fn test_name_too_long() {
        let long_name = "a".repeat(51);
        let form = UserFormValidation::new(&long_name, "alice@example.com", Some("secret1"));
        assert!(form.validate_form().is_err());
    }

    #[test]
    fn test_invalid_email() {
        let form = UserFormValidation::new("Alice", "not-an-email", Some("secret1"));
        let err = form.validate_form().unwrap_err();
        assert_eq!(err, vec!["Please provide a valid email".to_string()]);
    }

    #[test]
    fn test_password_too_short() {
        let form = UserFormValidation::new("Alice", "alice@example.com", Some("short"));
        assert!(form.check().is_err());
    }

    #[test]
    fn test_password_optional_for_update() {
        let form = UserFormValidation::new("Alice", "alice@example.com", None);
        assert!(form.validate_form().is_ok());
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("12", "task").unwrap(), 12);
        assert!(parse_id("0", "task").is_err());
        assert!(parse_id("-3", "task").is_err());
        assert!(parse_id("undefined", "task").is_err());
        assert!(parse_id("507f1f77bcf86cd799439011", "task").is_err());
    }

    #[test]
    fn test_parse_due_date() {
        let date = parse_due_date("2025-01-01").unwrap();
        assert_eq!(date.to_rfc3339(), "2025-01-01T00:00:00+00:00");

        let full = parse_due_date("2025-03-04T10:30:00+09:00").unwrap();
        assert_eq!(full.to_rfc3339(), "2025-03-04T10:30:00+09:00");

        assert!(parse_due_date("tomorrow").is_err());
        assert!(parse_due_date("").is_err());
    }

    #[test]
    fn test_allowed_uploads() {
        assert!(is_allowed_upload("pdf", "application/pdf"));
        assert!(is_allowed_upload("PNG", "image/png"));
        assert!(is_allowed_upload("txt", "text/plain"));
        assert!(is_allowed_upload("docx", "application/vnd.openxmlformats-officedocument.wordprocessingml.document"));
        assert!(!is_allowed_upload("exe", "application/octet-stream"));
        assert!(!is_allowed_upload("sh", "text/x-shellscript"));
    }

    #[test]
    fn test_upload_mime_must_match_extension() {
        assert!(is_allowed_upload("TXT", "text/plain; charset=utf-8"));
        assert!(is_allowed_upload("xls", "application/vnd.ms-excel"));
        assert!(!is_allowed_upload("txt", "application/x-msdownload"));
        assert!(!is_allowed_upload("pdf", "text/plain"));
        assert!(!is_allowed_upload("txt.exe", "text/plain"));
        assert!(!is_allowed_upload("mytxt", "text/plain"));
    }

    #[test]
    fn test_allowed_images() {
        assert!(is_allowed_image("jpg", "image/jpeg"));
        assert!(!is_allowed_image("pdf", "application/pdf"));
        assert!(!is_allowed_image("png", "text/plain"));
    }
}
