use std::collections::HashSet;

use rocket::fs::TempFile;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::*;
use serde::Deserialize;

use crate::auth_utils::{hash_password_async, issue_token, verify_password_async};
use crate::config::AppConfig;
use crate::entities::user::Role;
use crate::entities::{prelude::*, user};
use crate::errors::AppError;
use crate::lifecycle::Actor;
use crate::services::dashboard_service::DashboardService;
use crate::storage::{FileStorage, UploadKind, UploadMeta};
use crate::validation::{self, UserFormValidation};
use crate::views::pagination::{self, PageRequest};
use crate::views::task::UserDirectory;
use crate::views::user::{UserDetail, UserSummary, UserWithCounts};

/// 登録フォーム
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub profile_image_url: Option<String>,
    pub admin_invite_token: Option<String>,
}

/// 管理者によるユーザー作成
#[derive(Debug, Default, Deserialize)]
pub struct NewUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// プロフィール更新。指定された項目だけを書き換える。
#[derive(Debug, Default, Deserialize)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// 管理者による権限・有効フラグの変更
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserChanges {
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

/// ユーザー一覧の検索条件
#[derive(Debug, Clone)]
pub struct UserListQuery {
    pub search: Option<String>,
    pub role: Option<String>,
    pub include_inactive: bool,
    pub sort: Option<String>,
    pub page: PageRequest,
}

/// 認証に成功したユーザーと発行したトークン
#[derive(Debug)]
pub struct AuthSession {
    pub token: String,
    pub user: user::Model,
}

const SORTABLE_COLUMNS: &[(&str, user::Column)] = &[
    ("name", user::Column::Name),
    ("email", user::Column::Email),
    ("role", user::Column::Role),
    ("createdAt", user::Column::CreatedAt),
    ("lastLogin", user::Column::LastLogin),
];

/// メールアドレスは前後の空白を除き小文字で扱う。
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// ユーザー関連のビジネスロジックを集約するサービス。
/// Djangoの Manager やカスタム QuerySet メソッドに相当します。
pub struct UserService;

impl UserService {
    /// 有効なユーザーをIDで検索 (無効化されたユーザーは既定の検索から除外される)
    pub async fn find_active_by_id(db: &DatabaseConnection, id: i32) -> Result<Option<user::Model>, AppError> {
        User::find_by_id(id)
            .filter(user::Column::IsActive.eq(true))
            .one(db)
            .await
            .map_err(AppError::Database)
    }

    pub async fn find_active_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<user::Model>, AppError> {
        User::find()
            .filter(user::Column::Email.eq(normalize_email(email)))
            .filter(user::Column::IsActive.eq(true))
            .one(db)
            .await
            .map_err(AppError::Database)
    }

    /// 一意性の確認は無効化されたユーザーも含めて行う
    async fn email_taken(db: &DatabaseConnection, email: &str, except: Option<i32>) -> Result<bool, AppError> {
        let mut query = User::find().filter(user::Column::Email.eq(email));
        if let Some(id) = except {
            query = query.filter(user::Column::Id.ne(id));
        }
        Ok(query.count(db).await? > 0)
    }

    fn session(config: &AppConfig, user: user::Model) -> Result<AuthSession, AppError> {
        let token = issue_token(&config.jwt_secret, user.id, user.token_version, config.token_ttl_days)?;
        Ok(AuthSession { token, user })
    }

    async fn insert_user(
        db: &DatabaseConnection,
        name: &str,
        email: &str,
        password: String,
        role: Role,
        profile_image_url: Option<String>,
    ) -> Result<user::Model, AppError> {
        if Self::email_taken(db, email, None).await? {
            return Err(AppError::duplicate_email());
        }

        let password_hash = hash_password_async(password).await?;
        let now = validation::now();
        let new_user = user::ActiveModel {
            name: Set(name.to_owned()),
            email: Set(email.to_owned()),
            password_hash: Set(password_hash),
            role: Set(role),
            is_active: Set(true),
            token_version: Set(0),
            last_login: Set(None),
            profile_image_url: Set(profile_image_url),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        new_user
            .insert(db)
            .await
            .map_err(|e| AppError::from_unique_violation(e, AppError::duplicate_email()))
    }

    /// ユーザー登録 (Django: User.objects.create_user())
    /// 招待トークンが一致した場合のみ admin になる。
    pub async fn register(db: &DatabaseConnection, config: &AppConfig, input: Registration) -> Result<AuthSession, AppError> {
        let (Some(name), Some(email), Some(password)) = (input.name, input.email, input.password) else {
            return Err(AppError::Validation("Please provide name, email and password".into()));
        };
        UserFormValidation::new(&name, &email, Some(&password)).check()?;

        let role = match (&config.admin_invite_token, input.admin_invite_token.as_deref()) {
            (Some(expected), Some(given)) if expected == given => Role::Admin,
            _ => Role::Member,
        };

        let email = normalize_email(&email);
        let user = Self::insert_user(
            db,
            name.trim(),
            &email,
            password,
            role,
            non_empty(input.profile_image_url),
        )
        .await?;

        tracing::info!(user_id = user.id, role = role.as_str(), "user registered");
        Self::session(config, user)
    }

    /// 認証処理 (Django: authenticate())
    /// 存在しないメールアドレスと誤ったパスワードは同じエラーになる。
    pub async fn login(
        db: &DatabaseConnection,
        config: &AppConfig,
        email: Option<String>,
        password: Option<String>,
    ) -> Result<AuthSession, AppError> {
        let (Some(email), Some(password)) = (non_empty(email), password.filter(|p| !p.is_empty())) else {
            return Err(AppError::Validation("Please provide email and password".into()));
        };

        let user = Self::find_active_by_email(db, &email).await?;
        let verified = verify_password_async(password, user.as_ref().map(|u| u.password_hash.clone())).await?;
        let user = match user {
            Some(user) if verified => user,
            _ => {
                tracing::info!("login rejected");
                return Err(AppError::invalid_credentials());
            }
        };

        let mut active: user::ActiveModel = user.into();
        active.last_login = Set(Some(validation::now()));
        let user = active.update(db).await?;

        Self::session(config, user)
    }

    /// プロフィール更新。メールアドレスを変える場合は重複を再確認し、新しいトークンを返す。
    pub async fn update_profile(
        db: &DatabaseConnection,
        config: &AppConfig,
        user: user::Model,
        changes: ProfileChanges,
    ) -> Result<AuthSession, AppError> {
        let name = non_empty(changes.name).unwrap_or_else(|| user.name.clone());
        let email = non_empty(changes.email)
            .map(|e| normalize_email(&e))
            .unwrap_or_else(|| user.email.clone());
        let password = changes.password.filter(|p| !p.is_empty());

        UserFormValidation::new(&name, &email, password.as_deref()).check()?;

        if email != user.email && Self::email_taken(db, &email, Some(user.id)).await? {
            return Err(AppError::duplicate_email());
        }

        let token_version = user.token_version;
        let mut active: user::ActiveModel = user.into();
        active.name = Set(name);
        active.email = Set(email);
        if let Some(password) = password {
            active.password_hash = Set(hash_password_async(password).await?);
            active.token_version = Set(token_version + 1);
        }
        active.updated_at = Set(validation::now());

        let user = active
            .update(db)
            .await
            .map_err(|e| AppError::from_unique_violation(e, AppError::duplicate_email()))?;

        Self::session(config, user)
    }

    /// パスワード変更。トークン世代を進め、以前のトークンをすべて無効にする。
    pub async fn change_password(
        db: &DatabaseConnection,
        config: &AppConfig,
        user: user::Model,
        current_password: Option<String>,
        new_password: Option<String>,
    ) -> Result<AuthSession, AppError> {
        let (Some(current), Some(new_password)) = (current_password, new_password) else {
            return Err(AppError::Validation("Please provide current and new password".into()));
        };

        if !verify_password_async(current, Some(user.password_hash.clone())).await? {
            return Err(AppError::wrong_current_password());
        }
        UserFormValidation::new(&user.name, &user.email, Some(&new_password)).check()?;

        let token_version = user.token_version;
        let mut active: user::ActiveModel = user.into();
        active.password_hash = Set(hash_password_async(new_password).await?);
        active.token_version = Set(token_version + 1);
        active.updated_at = Set(validation::now());
        let user = active.update(db).await?;

        tracing::info!(user_id = user.id, "password changed");
        Self::session(config, user)
    }

    /// プロフィール画像を保存し、URL をユーザーに記録します。
    /// 先に URL を書き込み、ファイル保存に失敗したら元に戻す。
    pub async fn set_profile_image(
        db: &DatabaseConnection,
        storage: &FileStorage,
        user: user::Model,
        file: Option<&mut TempFile<'_>>,
    ) -> Result<String, AppError> {
        let Some(file) = file else {
            return Err(AppError::Validation("No file uploaded".into()));
        };
        let meta = UploadMeta::from_temp_file(file);
        meta.ensure_image()?;

        let stored = storage.allocate(UploadKind::Profile, &meta.extension);
        let previous = user.profile_image_url.clone();

        let mut active: user::ActiveModel = user.into();
        active.profile_image_url = Set(Some(stored.url.clone()));
        active.updated_at = Set(validation::now());
        let user = active.update(db).await?;

        if let Err(e) = storage.persist(file, &stored).await {
            tracing::error!(user_id = user.id, error = %e, "failed to store profile image");
            let mut revert: user::ActiveModel = user.into();
            revert.profile_image_url = Set(previous);
            revert.update(db).await?;
            return Err(AppError::Internal(format!("Failed to store uploaded file: {}", e)));
        }

        if let Some(old) = previous {
            storage.remove_url(&old).await;
        }
        Ok(stored.url)
    }

    /// 管理者向けのユーザー一覧。検索・役割フィルタ・ソート・ページングに対応し、
    /// 各ユーザーの担当タスク件数を付けて返す。
    pub async fn list(db: &DatabaseConnection, query: UserListQuery) -> Result<(Vec<UserWithCounts>, u64), AppError> {
        let mut select = User::find();

        if !query.include_inactive {
            select = select.filter(user::Column::IsActive.eq(true));
        }

        if let Some(role) = non_empty(query.role) {
            let role = Role::parse(&role).ok_or_else(|| AppError::Validation("Role is either: admin or member".into()))?;
            select = select.filter(user::Column::Role.eq(role));
        }

        if let Some(search) = non_empty(query.search) {
            let pattern = format!("%{}%", search.to_lowercase());
            let mut any = Condition::any();
            for column in [user::Column::Name, user::Column::Email, user::Column::Role] {
                any = any.add(Expr::expr(Func::lower(Expr::col((user::Entity, column)))).like(pattern.clone()));
            }
            select = select.filter(any);
        }

        match non_empty(query.sort) {
            Some(sort) => {
                for key in sort.split(',').map(str::trim).filter(|k| !k.is_empty()) {
                    let (field, order) = match key.strip_prefix('-') {
                        Some(field) => (field, Order::Desc),
                        None => (key, Order::Asc),
                    };
                    select = pagination::apply_sorting(select, field, order, SORTABLE_COLUMNS)?;
                }
            }
            None => select = select.order_by_desc(user::Column::CreatedAt),
        }
        select = select.order_by_desc(user::Column::Id);

        let (users, total) = pagination::fetch_page(db, select, query.page).await?;

        let ids: Vec<i32> = users.iter().map(|u| u.id).collect();
        let stats = DashboardService::stats_for_users(db, &ids).await?;
        let rows = users
            .iter()
            .map(|u| UserWithCounts::new(u, stats.get(&u.id).copied().unwrap_or_default()))
            .collect();

        Ok((rows, total))
    }

    /// ユーザー詳細 (タスク統計付き)
    pub async fn detail(db: &DatabaseConnection, id: i32) -> Result<UserDetail, AppError> {
        let user = Self::find_active_by_id(db, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found with id of {}", id)))?;
        let task_stats = DashboardService::stats_for_user(db, user.id).await?;

        Ok(UserDetail { user: (&user).into(), task_stats })
    }

    /// 管理者によるユーザー作成
    pub async fn create(db: &DatabaseConnection, input: NewUser) -> Result<user::Model, AppError> {
        let (Some(name), Some(email), Some(password)) = (input.name, input.email, input.password) else {
            return Err(AppError::Validation("Please provide name, email and password".into()));
        };
        UserFormValidation::new(&name, &email, Some(&password)).check()?;

        let role = match non_empty(input.role) {
            Some(role) => Role::parse(&role).ok_or_else(|| AppError::Validation("Role is either: admin or member".into()))?,
            None => Role::Member,
        };

        let user = Self::insert_user(db, name.trim(), &normalize_email(&email), password, role, None).await?;
        tracing::info!(user_id = user.id, role = role.as_str(), "user created by admin");
        Ok(user)
    }

    /// 役割と有効フラグのみ変更できる。無効化されたユーザーを戻せるよう、検索は全件から行う。
    pub async fn admin_update(db: &DatabaseConnection, id: i32, changes: AdminUserChanges) -> Result<user::Model, AppError> {
        let role = match non_empty(changes.role) {
            Some(role) => Some(Role::parse(&role).ok_or_else(|| AppError::Validation("Role is either: admin or member".into()))?),
            None => None,
        };

        let user = User::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found with id of {}", id)))?;

        let mut active: user::ActiveModel = user.into();
        if let Some(role) = role {
            active.role = Set(role);
        }
        if let Some(is_active) = changes.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(validation::now());

        Ok(active.update(db).await?)
    }

    /// ユーザー削除。自分自身は削除できない。
    /// タスク側の参照は弱参照なので残す。
    pub async fn delete(db: &DatabaseConnection, storage: &FileStorage, actor: &Actor, id: i32) -> Result<(), AppError> {
        let user = User::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found with id of {}", id)))?;

        if user.id == actor.id {
            return Err(AppError::Forbidden("You cannot delete your own account".into()));
        }

        let image = user.profile_image_url.clone();
        user.delete(db).await?;
        if let Some(url) = image {
            storage.remove_url(&url).await;
        }

        tracing::info!(user_id = id, deleted_by = actor.id, "user deleted");
        Ok(())
    }

    /// 担当者として選べる有効な一般ユーザー
    pub async fn for_assignment(db: &DatabaseConnection) -> Result<Vec<user::Model>, AppError> {
        User::find()
            .filter(user::Column::Role.eq(Role::Member))
            .filter(user::Column::IsActive.eq(true))
            .order_by_asc(user::Column::Name)
            .all(db)
            .await
            .map_err(AppError::Database)
    }

    /// 参照されているユーザーの概要をまとめて取得します。
    /// 削除済みのユーザーは表に含まれない。
    pub async fn summaries<I>(db: &DatabaseConnection, ids: I) -> Result<UserDirectory, AppError>
    where
        I: IntoIterator<Item = i32>,
    {
        let ids: HashSet<i32> = ids.into_iter().collect();
        if ids.is_empty() {
            return Ok(UserDirectory::new());
        }

        let users = User::find()
            .filter(user::Column::Id.is_in(ids))
            .all(db)
            .await?;

        Ok(users.iter().map(|u| (u.id, UserSummary::from(u))).collect())
    }

    /// レポート送信先 (有効な管理者全員)
    pub async fn admin_emails(db: &DatabaseConnection) -> Result<Vec<String>, AppError> {
        let admins = User::find()
            .filter(user::Column::Role.eq(Role::Admin))
            .filter(user::Column::IsActive.eq(true))
            .order_by_asc(user::Column::Id)
            .all(db)
            .await?;
        Ok(admins.into_iter().map(|u| u.email).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("  x ".into())), Some("x".to_string()));
        assert_eq!(non_empty(Some("   ".into())), None);
        assert_eq!(non_empty(None), None);
    }
}
