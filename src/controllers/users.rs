use rocket::http::Status;
use rocket::serde::json::{json, Json, Value};
use rocket::State;
use sea_orm::DatabaseConnection;

use crate::errors::AppError;
use crate::guards::auth::{AdminUser, AuthenticatedUser};
use crate::services::user_service::{AdminUserChanges, NewUser, UserListQuery, UserService};
use crate::storage::FileStorage;
use crate::validation::parse_id;
use crate::views::pagination::{PageLinks, PageRequest};
use crate::views::user::{AdminUserView, AssignableUser};

/// ユーザー一覧のクエリパラメータ
#[derive(FromForm)]
pub struct UserListParams {
    pub search: Option<String>,
    pub role: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    #[field(name = "includeInactive")]
    pub include_inactive: Option<String>,
}

/// ユーザー一覧 (管理者のみ)。
/// Djangoの管理サイトの changelist に相当します。
#[get("/?<params..>")]
pub async fn list_users(
    db: &State<DatabaseConnection>,
    _admin: AdminUser,
    params: UserListParams,
) -> Result<Json<Value>, AppError> {
    let page = PageRequest::from_query(params.page.as_deref(), params.limit.as_deref())?;
    let query = UserListQuery {
        search: params.search,
        role: params.role,
        include_inactive: params.include_inactive.as_deref() == Some("true"),
        sort: params.sort,
        page,
    };

    let (users, total) = UserService::list(db.inner(), query).await?;
    Ok(Json(json!({
        "success": true,
        "count": users.len(),
        "total": total,
        "pagination": PageLinks::new(page, total),
        "data": users,
    })))
}

#[post("/", data = "<input>")]
pub async fn create_user(
    db: &State<DatabaseConnection>,
    _admin: AdminUser,
    input: Json<NewUser>,
) -> Result<(Status, Json<Value>), AppError> {
    let user = UserService::create(db.inner(), input.into_inner()).await?;
    Ok((
        Status::Created,
        Json(json!({ "success": true, "data": AdminUserView::from(&user) })),
    ))
}

/// 担当者選択用のユーザー一覧 (有効な一般ユーザーのみ)
#[get("/for-assignment")]
pub async fn for_assignment(db: &State<DatabaseConnection>, _auth: AuthenticatedUser) -> Result<Json<Vec<AssignableUser>>, AppError> {
    let users = UserService::for_assignment(db.inner()).await?;
    Ok(Json(users.iter().map(AssignableUser::from).collect()))
}

#[get("/<id>")]
pub async fn get_user(db: &State<DatabaseConnection>, _auth: AuthenticatedUser, id: &str) -> Result<Json<Value>, AppError> {
    let id = parse_id(id, "user")?;
    let detail = UserService::detail(db.inner(), id).await?;
    Ok(Json(json!({ "success": true, "data": detail })))
}

/// 役割・有効フラグの変更 (管理者のみ)
#[put("/<id>", data = "<changes>")]
pub async fn update_user(
    db: &State<DatabaseConnection>,
    _admin: AdminUser,
    id: &str,
    changes: Json<AdminUserChanges>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(id, "user")?;
    let user = UserService::admin_update(db.inner(), id, changes.into_inner()).await?;
    Ok(Json(json!({ "success": true, "data": AdminUserView::from(&user) })))
}

#[delete("/<id>")]
pub async fn delete_user(
    db: &State<DatabaseConnection>,
    storage: &State<FileStorage>,
    admin: AdminUser,
    id: &str,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(id, "user")?;
    UserService::delete(db.inner(), storage.inner(), &admin.actor(), id).await?;
    Ok(Json(json!({ "success": true, "data": {} })))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![list_users, create_user, for_assignment, get_user, update_user, delete_user]
}
