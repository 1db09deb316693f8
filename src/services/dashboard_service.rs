use std::collections::HashMap;

use sea_orm::*;

use crate::entities::task::{TaskPriority, TaskStatus};
use crate::entities::{prelude::*, task};
use crate::errors::AppError;
use crate::services::user_service::UserService;
use crate::views::task::{AdminDashboard, PriorityCounts, StatusCounts, TaskSummaryView, UserDashboard};
use crate::views::user::TaskStats;

const RECENT_TASKS: u64 = 5;

/// ダッシュボード用の集計。読み取り専用で副作用は無い。
pub struct DashboardService;

impl DashboardService {
    /// 状態ごとの件数。保存値は集計前に正規化するので、表記揺れも正しく数えられる。
    async fn status_counts(db: &DatabaseConnection, assignee: Option<i32>) -> Result<StatusCounts, AppError> {
        let mut query = Task::find()
            .select_only()
            .column(task::Column::Status)
            .column_as(task::Column::Id.count(), "count")
            .group_by(task::Column::Status);
        if let Some(user_id) = assignee {
            query = query.filter(task::Column::AssignedTo.eq(user_id));
        }

        let rows = query.into_tuple::<(String, i64)>().all(db).await?;
        let mut counts = StatusCounts::default();
        for (status, count) in rows {
            counts.add(TaskStatus::normalize(&status), count.max(0) as u64);
        }
        Ok(counts)
    }

    async fn priority_counts(db: &DatabaseConnection) -> Result<PriorityCounts, AppError> {
        let rows = Task::find()
            .select_only()
            .column(task::Column::Priority)
            .column_as(task::Column::Id.count(), "count")
            .group_by(task::Column::Priority)
            .into_tuple::<(String, i64)>()
            .all(db)
            .await?;

        let mut counts = PriorityCounts::default();
        for (priority, count) in rows {
            counts.add(TaskPriority::normalize(&priority), count.max(0) as u64);
        }
        Ok(counts)
    }

    async fn recent_tasks(db: &DatabaseConnection, assignee: Option<i32>) -> Result<Vec<TaskSummaryView>, AppError> {
        let mut query = Task::find()
            .order_by_desc(task::Column::CreatedAt)
            .order_by_desc(task::Column::Id)
            .limit(RECENT_TASKS);
        if let Some(user_id) = assignee {
            query = query.filter(task::Column::AssignedTo.eq(user_id));
        }
        let tasks = query.all(db).await?;

        let users = UserService::summaries(
            db,
            tasks.iter().flat_map(|t| t.assigned_to.into_iter().chain([t.created_by])),
        )
        .await?;
        Ok(tasks.iter().map(|t| TaskSummaryView::new(t, &users)).collect())
    }

    /// 管理者ダッシュボード: 全タスクの状態別・優先度別件数と最新5件
    pub async fn admin_dashboard(db: &DatabaseConnection) -> Result<AdminDashboard, AppError> {
        Ok(AdminDashboard {
            status_counts: Self::status_counts(db, None).await?,
            priority_counts: Self::priority_counts(db).await?,
            recent_tasks: Self::recent_tasks(db, None).await?,
        })
    }

    /// 一般ユーザーのダッシュボード: 自分が担当するタスクのみ
    pub async fn user_dashboard(db: &DatabaseConnection, user_id: i32) -> Result<UserDashboard, AppError> {
        let counts = Self::status_counts(db, Some(user_id)).await?;
        Ok(UserDashboard {
            total_tasks: counts.total(),
            completed_tasks: counts.completed,
            pending_tasks: counts.pending,
            in_progress_tasks: counts.in_progress,
            recent_tasks: Self::recent_tasks(db, Some(user_id)).await?,
        })
    }

    pub async fn stats_for_user(db: &DatabaseConnection, user_id: i32) -> Result<TaskStats, AppError> {
        Ok(Self::stats_for_users(db, &[user_id]).await?.remove(&user_id).unwrap_or_default())
    }

    /// 複数ユーザーの担当タスク件数を1回のクエリで集計します。
    pub async fn stats_for_users(db: &DatabaseConnection, user_ids: &[i32]) -> Result<HashMap<i32, TaskStats>, AppError> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = Task::find()
            .select_only()
            .column(task::Column::AssignedTo)
            .column(task::Column::Status)
            .column_as(task::Column::Id.count(), "count")
            .filter(task::Column::AssignedTo.is_in(user_ids.iter().copied()))
            .group_by(task::Column::AssignedTo)
            .group_by(task::Column::Status)
            .into_tuple::<(i32, String, i64)>()
            .all(db)
            .await?;

        let mut stats: HashMap<i32, TaskStats> = HashMap::new();
        for (user_id, status, count) in rows {
            let count = count.max(0) as u64;
            let entry = stats.entry(user_id).or_default();
            match TaskStatus::normalize(&status) {
                TaskStatus::Pending => entry.pending += count,
                TaskStatus::InProgress => entry.in_progress += count,
                TaskStatus::Completed => entry.completed += count,
            }
            entry.total += count;
        }
        Ok(stats)
    }
}
