use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};
use sea_orm::DatabaseConnection;

use crate::auth_utils::decode_token;
use crate::config::AppConfig;
use crate::entities::user;
use crate::lifecycle::Actor;
use crate::services::user_service::UserService;

/// ガードが失敗した理由。JSON キャッチャーがメッセージとして使います。
#[derive(Clone, Debug, Default)]
pub struct GuardFailure(pub Option<String>);

type AuthResult = Result<user::Model, (Status, String)>;

fn bearer_token<'r>(request: &'r Request<'_>) -> Option<&'r str> {
    let header = request.headers().get_one("Authorization")?;
    let token = header.strip_prefix("Bearer ").or_else(|| header.strip_prefix("bearer "))?;
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

async fn authenticate(request: &Request<'_>) -> AuthResult {
    let internal = || (Status::InternalServerError, "Something went wrong!".to_string());

    let (Some(db), Some(config)) = (
        request.rocket().state::<DatabaseConnection>(),
        request.rocket().state::<AppConfig>(),
    ) else {
        return Err(internal());
    };

    let token = bearer_token(request)
        .ok_or_else(|| (Status::Unauthorized, "Not authorized, no token".to_string()))?;

    let claims = decode_token(&config.jwt_secret, token).map_err(|e| (Status::Unauthorized, e.to_string()))?;
    let user_id = claims
        .user_id()
        .ok_or_else(|| (Status::Unauthorized, "Not authorized to access this route".to_string()))?;

    let user = match UserService::find_active_by_id(db, user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return Err((Status::Unauthorized, "User not found".to_string())),
        Err(e) => {
            tracing::error!(error = %e, "failed to load user for token");
            return Err(internal());
        }
    };

    // パスワード変更前に発行されたトークンは無効
    if user.token_version != claims.ver {
        return Err((Status::Unauthorized, "Token has been revoked".to_string()));
    }

    Ok(user)
}

fn reject<T>(request: &Request<'_>, status: Status, message: String) -> Outcome<T, String> {
    request.local_cache(|| GuardFailure(Some(message.clone())));
    Outcome::Error((status, message))
}

/// 認証済みユーザーを表すリクエストガード。
/// Djangoの `request.user` に相当し、ハンドラの引数に含めるだけで
/// `Authorization: Bearer <token>` の検証が行われます。
pub struct AuthenticatedUser {
    pub user: user::Model,
}

impl AuthenticatedUser {
    pub fn actor(&self) -> Actor {
        Actor::new(self.user.id, self.user.role)
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedUser {
    type Error = String;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        // 同じリクエスト内では一度だけ検証する
        let result: &AuthResult = request.local_cache_async(authenticate(request)).await;

        match result {
            Ok(user) => Outcome::Success(AuthenticatedUser { user: user.clone() }),
            Err((status, message)) => reject(request, *status, message.clone()),
        }
    }
}

/// 管理者ユーザーのみを許可するガード。
/// Djangoの `user.is_staff` や `PermissionRequiredMixin` に相当。
pub struct AdminUser(pub AuthenticatedUser);

impl AdminUser {
    pub fn actor(&self) -> Actor {
        self.0.actor()
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminUser {
    type Error = String;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match AuthenticatedUser::from_request(request).await {
            Outcome::Success(auth) if auth.user.is_admin() => Outcome::Success(AdminUser(auth)),
            Outcome::Success(_) => reject(request, Status::Forbidden, "Admin access required".to_string()),
            Outcome::Error(e) => Outcome::Error(e),
            Outcome::Forward(f) => Outcome::Forward(f),
        }
    }
}
