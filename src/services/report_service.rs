use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sea_orm::*;
use serde::Deserialize;

use crate::entities::{prelude::*, task};
use crate::errors::AppError;
use crate::mailer::{MailAttachment, Mailer, OutgoingMail};
use crate::services::user_service::UserService;
use crate::validation;
use crate::views::task::UserDirectory;

const CSV_HEADER: [&str; 10] = [
    "ID",
    "Title",
    "Description",
    "Status",
    "Priority",
    "Due Date",
    "Assigned To",
    "Progress",
    "Completed At",
    "Created At",
];

/// レポート送信リクエスト。
/// ファイル名とデータ (base64) の両方があればそのまま中継し、両方とも無ければサーバー側で CSV を作る。
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub filename: Option<String>,
    pub file_data: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct ReportReceipt {
    pub filename: String,
    pub recipients: usize,
}

/// CSV の1フィールドをエスケープします。
pub fn escape_csv(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn csv_line<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fields
        .into_iter()
        .map(|f| escape_csv(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// タスク一覧から CSV を組み立てます。
pub fn build_csv(tasks: &[task::Model], users: &UserDirectory) -> String {
    let mut out = csv_line(CSV_HEADER);
    out.push_str("\r\n");

    for task in tasks {
        let assignee = task
            .assigned_to
            .and_then(|id| users.get(&id))
            .map(|u| u.name.clone())
            .unwrap_or_else(|| "Unassigned".to_string());

        out.push_str(&csv_line([
            task.id.to_string(),
            task.title.clone(),
            task.description.clone(),
            task.status.label().to_string(),
            task.priority.label().to_string(),
            task.due_date.format("%Y-%m-%d").to_string(),
            assignee,
            task.progress.to_string(),
            task.completed_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
            task.created_at.to_rfc3339(),
        ]));
        out.push_str("\r\n");
    }
    out
}

fn safe_filename(name: &str) -> Result<String, AppError> {
    let name = name.rsplit(['/', '\\']).next().unwrap_or("").trim();
    if name.is_empty() || name.starts_with('.') {
        return Err(AppError::Validation("Invalid filename".into()));
    }
    Ok(name.to_string())
}

/// タスクレポートを全管理者へメールで送ります。
pub struct ReportService;

impl ReportService {
    async fn generate(db: &DatabaseConnection) -> Result<(String, Vec<u8>), AppError> {
        let tasks = Task::find()
            .order_by_desc(task::Column::CreatedAt)
            .order_by_desc(task::Column::Id)
            .all(db)
            .await?;
        let users = UserService::summaries(db, tasks.iter().filter_map(|t| t.assigned_to)).await?;

        let filename = format!("task-report-{}.csv", validation::now().format("%Y-%m-%d"));
        Ok((filename, build_csv(&tasks, &users).into_bytes()))
    }

    pub async fn send_task_report(
        db: &DatabaseConnection,
        mailer: &dyn Mailer,
        request: ReportRequest,
    ) -> Result<ReportReceipt, AppError> {
        let (filename, content) = match (request.filename, request.file_data) {
            (None, None) => Self::generate(db).await?,
            (Some(filename), Some(data)) if !filename.trim().is_empty() && !data.trim().is_empty() => {
                let content = STANDARD
                    .decode(data.trim())
                    .map_err(|_| AppError::Validation("File data must be base64 encoded".into()))?;
                (safe_filename(&filename)?, content)
            }
            _ => return Err(AppError::Validation("Please provide both filename and file data".into())),
        };

        let recipients = UserService::admin_emails(db).await?;
        if recipients.is_empty() {
            return Err(AppError::NotFound("No admin users found".into()));
        }

        let count = recipients.len();
        let mail = OutgoingMail {
            to: recipients,
            subject: format!("Task Report - {}", validation::now().format("%Y-%m-%d")),
            text: "Please find attached the latest task report.".to_string(),
            attachment: Some(MailAttachment {
                filename: filename.clone(),
                content,
                content_type: "text/csv".to_string(),
            }),
        };

        mailer
            .send(mail)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to send email: {:#}", e)))?;

        tracing::info!(recipients = count, filename = %filename, "task report sent");
        Ok(ReportReceipt { filename, recipients: count })
    }
}
