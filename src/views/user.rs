use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::entities::user::{self, Role};

/// API で返すユーザー情報。パスワードハッシュ等は含まない。
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub profile_image_url: Option<String>,
    pub last_login: Option<DateTime<FixedOffset>>,
    pub created_at: DateTime<FixedOffset>,
}

impl From<&user::Model> for PublicUser {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            profile_image_url: user.profile_image_url.clone(),
            last_login: user.last_login,
            created_at: user.created_at,
        }
    }
}

/// タスクやコメントに埋め込む参照先ユーザー。
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct UserSummary {
    pub id: i32,
    pub name: String,
    pub email: String,
}

impl From<&user::Model> for UserSummary {
    fn from(user: &user::Model) -> Self {
        Self { id: user.id, name: user.name.clone(), email: user.email.clone() }
    }
}

/// 担当者ごとのタスク件数
#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub pending: u64,
    pub in_progress: u64,
    pub completed: u64,
    pub total: u64,
}

/// 管理画面のユーザー一覧の1行
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWithCounts {
    #[serde(flatten)]
    pub user: PublicUser,
    pub is_active: bool,
    pub pending_tasks: u64,
    pub in_progress_tasks: u64,
    pub completed_tasks: u64,
}

impl UserWithCounts {
    pub fn new(user: &user::Model, stats: TaskStats) -> Self {
        Self {
            user: PublicUser::from(user),
            is_active: user.is_active,
            pending_tasks: stats.pending,
            in_progress_tasks: stats.in_progress,
            completed_tasks: stats.completed,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: PublicUser,
    pub task_stats: TaskStats,
}

/// 担当者選択用
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignableUser {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub profile_image_url: Option<String>,
}

impl From<&user::Model> for AssignableUser {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            profile_image_url: user.profile_image_url.clone(),
        }
    }
}

/// 管理者による更新結果。有効フラグも見せる。
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserView {
    #[serde(flatten)]
    pub user: PublicUser,
    pub is_active: bool,
}

impl From<&user::Model> for AdminUserView {
    fn from(user: &user::Model) -> Self {
        Self { user: PublicUser::from(user), is_active: user.is_active }
    }
}
