use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::http::Status;
use rocket::serde::json::{json, Json, Value};
use rocket::State;
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::errors::AppError;
use crate::guards::auth::{AdminUser, AuthenticatedUser};
use crate::services::dashboard_service::DashboardService;
use crate::services::task_service::{NewTask, TaskChanges, TaskListQuery, TaskService};
use crate::storage::FileStorage;
use crate::validation::parse_id;
use crate::views::pagination::PageRequest;
use crate::views::task::{AdminDashboard, UserDashboard};

/// タスク一覧のクエリパラメータ
#[derive(FromForm)]
pub struct TaskListParams {
    pub status: Option<String>,
    #[field(name = "assignedTo")]
    pub assigned_to: Option<String>,
    #[field(name = "sortBy")]
    pub sort_by: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Deserialize)]
pub struct StatusChange {
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct CommentInput {
    pub text: Option<String>,
}

/// ファイル付きコメント (multipart)
#[derive(FromForm)]
pub struct CommentUpload<'r> {
    pub text: Option<String>,
    pub files: Vec<TempFile<'r>>,
}

#[derive(FromForm)]
pub struct AttachmentUpload<'r> {
    pub file: Option<TempFile<'r>>,
}

fn data(value: impl serde::Serialize) -> Json<Value> {
    Json(json!({ "success": true, "data": value }))
}

/// タスク一覧。
/// Djangoの `ListView` に相当し、フィルタ・ソート・ページングに対応します。
#[get("/?<params..>")]
pub async fn list_tasks(
    db: &State<DatabaseConnection>,
    auth: AuthenticatedUser,
    params: TaskListParams,
) -> Result<Json<Value>, AppError> {
    let page = PageRequest::from_query(params.page.as_deref(), params.limit.as_deref())?;
    let query = TaskListQuery {
        status: params.status,
        assigned_to: params.assigned_to,
        sort_by: params.sort_by,
        page,
    };

    let result = TaskService::list(db.inner(), &auth.actor(), query).await?;
    Ok(Json(json!({
        "success": true,
        "count": result.tasks.len(),
        "total": result.total,
        "totalPages": result.page.total_pages(result.total),
        "currentPage": result.page.page,
        "tasks": result.tasks,
    })))
}

/// タスク作成。Djangoの `CreateView` に相当。
#[post("/", data = "<input>")]
pub async fn create_task(
    db: &State<DatabaseConnection>,
    auth: AuthenticatedUser,
    input: Json<NewTask>,
) -> Result<(Status, Json<Value>), AppError> {
    let task = TaskService::create(db.inner(), &auth.actor(), input.into_inner()).await?;
    Ok((Status::Created, data(task)))
}

#[get("/dashboard-data")]
pub async fn dashboard_data(db: &State<DatabaseConnection>, _auth: AuthenticatedUser) -> Result<Json<AdminDashboard>, AppError> {
    Ok(Json(DashboardService::admin_dashboard(db.inner()).await?))
}

#[get("/user-dashboard-data")]
pub async fn user_dashboard_data(db: &State<DatabaseConnection>, auth: AuthenticatedUser) -> Result<Json<UserDashboard>, AppError> {
    Ok(Json(DashboardService::user_dashboard(db.inner(), auth.user.id).await?))
}

#[get("/<id>")]
pub async fn get_task(db: &State<DatabaseConnection>, auth: AuthenticatedUser, id: &str) -> Result<Json<Value>, AppError> {
    let id = parse_id(id, "task")?;
    Ok(data(TaskService::get(db.inner(), &auth.actor(), id).await?))
}

/// タスク更新。Djangoの `UpdateView` に相当。
#[put("/<id>", data = "<changes>")]
pub async fn update_task(
    db: &State<DatabaseConnection>,
    auth: AuthenticatedUser,
    id: &str,
    changes: Json<TaskChanges>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(id, "task")?;
    Ok(data(TaskService::update(db.inner(), &auth.actor(), id, changes.into_inner()).await?))
}

/// タスク削除 (管理者のみ)
#[delete("/<id>")]
pub async fn delete_task(
    db: &State<DatabaseConnection>,
    storage: &State<FileStorage>,
    admin: AdminUser,
    id: &str,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(id, "task")?;
    TaskService::delete(db.inner(), storage.inner(), &admin.actor(), id).await?;
    Ok(data(json!({})))
}

#[put("/<id>/status", data = "<change>")]
pub async fn update_status(
    db: &State<DatabaseConnection>,
    auth: AuthenticatedUser,
    id: &str,
    change: Json<StatusChange>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(id, "task")?;
    let task = TaskService::update_status(db.inner(), &auth.actor(), id, change.into_inner().status).await?;
    Ok(data(task))
}

#[post("/<id>/comments", format = "json", data = "<input>")]
pub async fn add_comment(
    db: &State<DatabaseConnection>,
    storage: &State<FileStorage>,
    auth: AuthenticatedUser,
    id: &str,
    input: Json<CommentInput>,
) -> Result<(Status, Json<Value>), AppError> {
    let id = parse_id(id, "task")?;
    let comment =
        TaskService::add_comment(db.inner(), storage.inner(), &auth.actor(), id, input.into_inner().text, &mut []).await?;
    Ok((Status::Created, data(comment)))
}

#[post("/<id>/comments", format = "multipart/form-data", data = "<form>", rank = 2)]
pub async fn add_comment_with_files(
    db: &State<DatabaseConnection>,
    storage: &State<FileStorage>,
    auth: AuthenticatedUser,
    id: &str,
    mut form: Form<CommentUpload<'_>>,
) -> Result<(Status, Json<Value>), AppError> {
    let id = parse_id(id, "task")?;
    let text = form.text.take();
    let comment =
        TaskService::add_comment(db.inner(), storage.inner(), &auth.actor(), id, text, &mut form.files).await?;
    Ok((Status::Created, data(comment)))
}

/// コメント削除 (投稿者か管理者のみ)
#[delete("/<id>/comments/<comment_id>")]
pub async fn delete_comment(
    db: &State<DatabaseConnection>,
    storage: &State<FileStorage>,
    auth: AuthenticatedUser,
    id: &str,
    comment_id: &str,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(id, "task")?;
    let comment_id = parse_id(comment_id, "comment")?;
    TaskService::delete_comment(db.inner(), storage.inner(), &auth.actor(), id, comment_id).await?;
    Ok(data(json!({})))
}

#[post("/<id>/attachments", data = "<form>")]
pub async fn upload_attachment(
    db: &State<DatabaseConnection>,
    storage: &State<FileStorage>,
    auth: AuthenticatedUser,
    id: &str,
    mut form: Form<AttachmentUpload<'_>>,
) -> Result<(Status, Json<Value>), AppError> {
    let id = parse_id(id, "task")?;
    let attachment =
        TaskService::add_attachment(db.inner(), storage.inner(), &auth.actor(), id, form.file.as_mut()).await?;
    Ok((Status::Created, data(attachment)))
}

/// 添付削除 (アップロードした本人か管理者のみ)
#[delete("/<id>/attachments/<attachment_id>")]
pub async fn delete_attachment(
    db: &State<DatabaseConnection>,
    storage: &State<FileStorage>,
    auth: AuthenticatedUser,
    id: &str,
    attachment_id: &str,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(id, "task")?;
    let attachment_id = parse_id(attachment_id, "attachment")?;
    TaskService::delete_attachment(db.inner(), storage.inner(), &auth.actor(), id, attachment_id).await?;
    Ok(data(json!({})))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        list_tasks,
        create_task,
        dashboard_data,
        user_dashboard_data,
        get_task,
        update_task,
        delete_task,
        update_status,
        add_comment,
        add_comment_with_files,
        delete_comment,
        upload_attachment,
        delete_attachment,
    ]
}
