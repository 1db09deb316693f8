use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::entities::task::{self, TaskPriority, TaskStatus};
use crate::entities::task_comment::CommentAttachment;
use crate::entities::{checklist_item, task_attachment, task_comment};
use crate::views::user::UserSummary;

/// ID からユーザー概要を引く表。見つからない参照は `null` として出力される。
pub type UserDirectory = HashMap<i32, UserSummary>;

fn lookup(directory: &UserDirectory, id: Option<i32>) -> Option<UserSummary> {
    id.and_then(|id| directory.get(&id).cloned())
}

/// 一覧・ダッシュボード用のタスク表現。子コレクションは含めない。
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummaryView {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
    pub priority_label: &'static str,
    pub status: TaskStatus,
    pub status_label: &'static str,
    pub due_date: DateTime<FixedOffset>,
    pub assigned_to: Option<UserSummary>,
    pub created_by: Option<UserSummary>,
    pub progress: i32,
    pub completed_at: Option<DateTime<FixedOffset>>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl TaskSummaryView {
    pub fn new(task: &task::Model, users: &UserDirectory) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
            priority: task.priority,
            priority_label: task.priority.label(),
            status: task.status,
            status_label: task.status.label(),
            due_date: task.due_date,
            assigned_to: lookup(users, task.assigned_to),
            created_by: lookup(users, Some(task.created_by)),
            progress: task.progress,
            completed_at: task.completed_at,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ChecklistItemView {
    pub id: i32,
    pub text: String,
    pub completed: bool,
}

impl From<&checklist_item::Model> for ChecklistItemView {
    fn from(item: &checklist_item::Model) -> Self {
        Self { id: item.id, text: item.text.clone(), completed: item.completed }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentView {
    pub id: i32,
    pub url: String,
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: i64,
    pub uploaded_by: Option<UserSummary>,
    pub created_at: DateTime<FixedOffset>,
}

impl AttachmentView {
    pub fn new(attachment: &task_attachment::Model, users: &UserDirectory) -> Self {
        Self {
            id: attachment.id,
            url: attachment.url.clone(),
            name: attachment.name.clone(),
            mime_type: attachment.mime_type.clone(),
            size: attachment.size,
            uploaded_by: lookup(users, Some(attachment.uploaded_by)),
            created_at: attachment.created_at,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: i32,
    pub user: Option<UserSummary>,
    pub text: String,
    pub attachments: Vec<CommentAttachment>,
    pub created_at: DateTime<FixedOffset>,
}

impl CommentView {
    pub fn new(comment: &task_comment::Model, users: &UserDirectory) -> Self {
        Self {
            id: comment.id,
            user: lookup(users, Some(comment.user_id)),
            text: comment.text.clone(),
            attachments: comment.attachment_list(),
            created_at: comment.created_at,
        }
    }
}

/// タスク詳細。チェックリスト・添付・コメント (新しい順) を含む。
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetailView {
    #[serde(flatten)]
    pub task: TaskSummaryView,
    pub checklist: Vec<ChecklistItemView>,
    pub attachments: Vec<AttachmentView>,
    pub comments: Vec<CommentView>,
}

/// 管理者ダッシュボード
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboard {
    pub status_counts: StatusCounts,
    pub priority_counts: PriorityCounts,
    pub recent_tasks: Vec<TaskSummaryView>,
}

/// 一般ユーザーのダッシュボード
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDashboard {
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub pending_tasks: u64,
    pub in_progress_tasks: u64,
    pub recent_tasks: Vec<TaskSummaryView>,
}

#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: u64,
    #[serde(rename = "in-progress")]
    pub in_progress: u64,
    pub completed: u64,
}

impl StatusCounts {
    pub fn add(&mut self, status: TaskStatus, count: u64) {
        match status {
            TaskStatus::Pending => self.pending += count,
            TaskStatus::InProgress => self.in_progress += count,
            TaskStatus::Completed => self.completed += count,
        }
    }

    pub fn total(&self) -> u64 {
        self.pending + self.in_progress + self.completed
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq, Eq)]
pub struct PriorityCounts {
    pub low: u64,
    pub medium: u64,
    pub high: u64,
}

impl PriorityCounts {
    pub fn add(&mut self, priority: TaskPriority, count: u64) {
        match priority {
            TaskPriority::Low => self.low += count,
            TaskPriority::Medium => self.medium += count,
            TaskPriority::High => self.high += count,
        }
    }
}
