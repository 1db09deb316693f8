use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::http::Status;
use rocket::serde::json::{json, Json, Value};
use rocket::State;
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::guards::auth::AuthenticatedUser;
use crate::services::user_service::{AuthSession, ProfileChanges, Registration, UserService};
use crate::storage::FileStorage;
use crate::views::user::PublicUser;

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(FromForm)]
pub struct ImageUpload<'r> {
    pub image: Option<TempFile<'r>>,
}

fn session_body(session: &AuthSession) -> Value {
    json!({
        "success": true,
        "token": session.token,
        "data": { "user": PublicUser::from(&session.user) },
    })
}

/// ユーザー登録。
/// Djangoの `UserCreationForm` を使ったサインアップビューに相当します。
#[post("/register", data = "<input>")]
pub async fn register(
    db: &State<DatabaseConnection>,
    config: &State<AppConfig>,
    input: Json<Registration>,
) -> Result<(Status, Json<Value>), AppError> {
    let session = UserService::register(db.inner(), config.inner(), input.into_inner()).await?;
    Ok((Status::Created, Json(session_body(&session))))
}

/// ログイン処理を行うビュー。
/// Djangoの `LoginView` に相当しますが、セッションの代わりにトークンを返します。
#[post("/login", data = "<form>")]
pub async fn login(
    db: &State<DatabaseConnection>,
    config: &State<AppConfig>,
    form: Json<LoginForm>,
) -> Result<Json<Value>, AppError> {
    let form = form.into_inner();
    let session = UserService::login(db.inner(), config.inner(), form.email, form.password).await?;
    Ok(Json(session_body(&session)))
}

#[get("/profile")]
pub fn profile(auth: AuthenticatedUser) -> Json<Value> {
    Json(json!({ "success": true, "data": PublicUser::from(&auth.user) }))
}

#[put("/profile", data = "<changes>")]
pub async fn update_profile(
    db: &State<DatabaseConnection>,
    config: &State<AppConfig>,
    auth: AuthenticatedUser,
    changes: Json<ProfileChanges>,
) -> Result<Json<Value>, AppError> {
    let session = UserService::update_profile(db.inner(), config.inner(), auth.user, changes.into_inner()).await?;
    Ok(Json(session_body(&session)))
}

/// パスワード変更。新しいトークンを返し、古いトークンは使えなくなる。
#[put("/update-password", data = "<change>")]
pub async fn update_password(
    db: &State<DatabaseConnection>,
    config: &State<AppConfig>,
    auth: AuthenticatedUser,
    change: Json<PasswordChange>,
) -> Result<Json<Value>, AppError> {
    let change = change.into_inner();
    let session = UserService::change_password(
        db.inner(),
        config.inner(),
        auth.user,
        change.current_password,
        change.new_password,
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Password updated successfully",
        "token": session.token,
    })))
}

#[post("/upload-image", data = "<form>")]
pub async fn upload_image(
    db: &State<DatabaseConnection>,
    storage: &State<FileStorage>,
    auth: AuthenticatedUser,
    mut form: Form<ImageUpload<'_>>,
) -> Result<Json<Value>, AppError> {
    let url = UserService::set_profile_image(db.inner(), storage.inner(), auth.user, form.image.as_mut()).await?;
    Ok(Json(json!({ "success": true, "imageUrl": url })))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![register, login, profile, update_profile, update_password, upload_image]
}
