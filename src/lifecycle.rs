//! タスクのライフサイクルと認可ルール。
//!
//! ここにある関数はすべて純粋関数で、DB にも HTTP にも触れません。
//! サービス層とリクエストガードの両方から呼び出されます。

use chrono::{DateTime, FixedOffset};

use crate::entities::task::{self, TaskPriority, TaskStatus};
use crate::entities::user::Role;
use crate::entities::{task_attachment, task_comment};

impl TaskStatus {
    /// クライアント入力を正規の状態に変換します。大文字小文字は区別しない。
    /// 認識できない値は `Pending` に落とします。
    pub fn normalize(input: &str) -> Self {
        match input.to_lowercase().as_str() {
            "pending" | "to do" | "todo" => TaskStatus::Pending,
            "in progress" | "in-progress" | "in_progress" => TaskStatus::InProgress,
            "completed" | "done" => TaskStatus::Completed,
            _ => TaskStatus::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        }
    }

    /// 画面表示用のラベル
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        }
    }
}

impl TaskPriority {
    /// 大文字小文字を区別せずに優先度へ変換します。認識できない値は `Medium`。
    pub fn normalize(input: &str) -> Self {
        match input.to_lowercase().as_str() {
            "low" => TaskPriority::Low,
            "high" => TaskPriority::High,
            _ => TaskPriority::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskPriority::Low => "Low",
            TaskPriority::Medium => "Medium",
            TaskPriority::High => "High",
        }
    }
}

/// リクエストを行っている認証済みユーザー。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Actor {
    pub id: i32,
    pub role: Role,
}

impl Actor {
    pub fn new(id: i32, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// 状態遷移後の完了日時を決定します。
///
/// - `Completed` に入るときは `now`
/// - すでに `Completed` なら既存の値を維持 (欠けていれば `now`)
/// - それ以外の状態では常に `None`
pub fn completion_timestamp(
    previous: TaskStatus,
    previous_completed_at: Option<DateTime<FixedOffset>>,
    next: TaskStatus,
    now: DateTime<FixedOffset>,
) -> Option<DateTime<FixedOffset>> {
    match (previous, next) {
        (TaskStatus::Completed, TaskStatus::Completed) => previous_completed_at.or(Some(now)),
        (_, TaskStatus::Completed) => Some(now),
        _ => None,
    }
}

/// 進捗値を 0〜100 に丸めます。
pub fn clamp_progress(value: i64) -> i32 {
    value.clamp(0, 100) as i32
}

/// チェックリスト入力を整形します。テキストは前後の空白を除去し、空の項目は捨てる。
pub fn clean_checklist<I, S>(items: I) -> Vec<(String, bool)>
where
    I: IntoIterator<Item = (S, bool)>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .filter_map(|(text, completed)| {
            let text = text.as_ref().trim();
            if text.is_empty() {
                None
            } else {
                Some((text.to_string(), completed))
            }
        })
        .collect()
}

// ---- 認可ルール ----

/// 個別タスクの閲覧・更新・コメント・添付追加が許されるか。
/// 管理者、担当者、作成者のみ。
pub fn can_access_task(actor: &Actor, task: &task::Model) -> bool {
    actor.is_admin() || task.assigned_to == Some(actor.id) || task.created_by == actor.id
}

/// タスク削除は管理者のみ。
pub fn can_delete_task(actor: &Actor) -> bool {
    actor.is_admin()
}

/// コメント削除は投稿者か管理者のみ。
pub fn can_delete_comment(actor: &Actor, comment: &task_comment::Model) -> bool {
    actor.is_admin() || comment.user_id == actor.id
}

/// 添付削除はアップロードした本人か管理者のみ。
pub fn can_delete_attachment(actor: &Actor, attachment: &task_attachment::Model) -> bool {
    actor.is_admin() || attachment.uploaded_by == actor.id
}

/// 一覧取得時に適用する担当者フィルタを決めます。
/// 管理者は任意の担当者で絞り込める (`None` なら全件)。一般ユーザーは常に自分だけ。
pub fn list_scope(actor: &Actor, requested_assignee: Option<i32>) -> Option<i32> {
    if actor.is_admin() {
        requested_assignee
    } else {
        Some(actor.id)
    }
}

/// 作成時の担当者。一般ユーザーが指定しなかった場合は本人を担当者にする。
pub fn default_assignee(actor: &Actor, requested: Option<i32>) -> Option<i32> {
    match requested {
        Some(id) => Some(id),
        None if actor.is_admin() => None,
        None => Some(actor.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn ts(secs: i64) -> DateTime<FixedOffset> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap().fixed_offset()
    }

    fn sample_task(assigned_to: Option<i32>, created_by: i32) -> task::Model {
        task::Model {
            id: 1,
            title: "t".into(),
            description: "d".into(),
            priority: TaskPriority::Medium,
            status: TaskStatus::Pending,
            due_date: ts(0),
            assigned_to,
            created_by,
            progress: 0,
            completed_at: None,
            created_at: ts(0),
            updated_at: ts(0),
        }
    }

    #[test]
    fn test_normalize_status_synonyms() {
        for input in ["Pending", "pending", "to do", "todo"] {
            assert_eq!(TaskStatus::normalize(input), TaskStatus::Pending, "{input}");
        }
        for input in ["in progress", "in-progress", "in_progress", "In Progress", "IN_PROGRESS"] {
            assert_eq!(TaskStatus::normalize(input), TaskStatus::InProgress, "{input}");
        }
        for input in ["completed", "done", "Completed", "DONE"] {
            assert_eq!(TaskStatus::normalize(input), TaskStatus::Completed, "{input}");
        }
    }

    #[test]
    fn test_normalize_status_unknown_falls_back_to_pending() {
        for input in ["", "blocked", "in  progress", " done", "完了"] {
            assert_eq!(TaskStatus::normalize(input), TaskStatus::Pending, "{input:?}");
        }
    }

    #[test]
    fn test_normalize_priority() {
        for input in ["low", "Low", "LOW"] {
            assert_eq!(TaskPriority::normalize(input), TaskPriority::Low);
        }
        assert_eq!(TaskPriority::normalize("HIGH"), TaskPriority::High);
        assert_eq!(TaskPriority::normalize("urgent"), TaskPriority::Medium);
        assert_eq!(TaskPriority::normalize(""), TaskPriority::Medium);
    }

    #[test]
    fn test_labels() {
        assert_eq!(TaskStatus::InProgress.label(), "In Progress");
        assert_eq!(TaskStatus::Pending.label(), "Pending");
        assert_eq!(TaskPriority::High.label(), "High");
        assert_eq!(TaskStatus::normalize("In Progress"), TaskStatus::InProgress);
    }

    #[test]
    fn test_completion_timestamp_follows_status() {
        let first = completion_timestamp(TaskStatus::Pending, None, TaskStatus::Completed, ts(10));
        assert_eq!(first, Some(ts(10)));

        let reopened = completion_timestamp(TaskStatus::Completed, first, TaskStatus::Pending, ts(20));
        assert_eq!(reopened, None);

        let again = completion_timestamp(TaskStatus::Pending, reopened, TaskStatus::Completed, ts(30));
        assert!(again.unwrap() > first.unwrap());

        let in_progress = completion_timestamp(TaskStatus::Completed, again, TaskStatus::InProgress, ts(40));
        assert_eq!(in_progress, None);
    }

    #[test]
    fn test_completion_timestamp_kept_while_completed() {
        let kept = completion_timestamp(TaskStatus::Completed, Some(ts(5)), TaskStatus::Completed, ts(50));
        assert_eq!(kept, Some(ts(5)));

        let repaired = completion_timestamp(TaskStatus::Completed, None, TaskStatus::Completed, ts(50));
        assert_eq!(repaired, Some(ts(50)));
    }

    #[test]
    fn test_clamp_progress() {
        assert_eq!(clamp_progress(-5), 0);
        assert_eq!(clamp_progress(42), 42);
        assert_eq!(clamp_progress(250), 100);
    }

    #[test]
    fn test_clean_checklist_drops_empty_items() {
        let cleaned = clean_checklist(vec![("  write tests ", true), ("", false), ("   ", true), ("ship", false)]);
        assert_eq!(
            cleaned,
            vec![("write tests".to_string(), true), ("ship".to_string(), false)]
        );
    }

    #[test]
    fn test_task_access_rules() {
        let admin = Actor::new(1, Role::Admin);
        let bob = Actor::new(2, Role::Member);
        let carol = Actor::new(3, Role::Member);
        let task = sample_task(Some(2), 1);

        assert!(can_access_task(&admin, &task));
        assert!(can_access_task(&bob, &task));
        assert!(!can_access_task(&carol, &task));

        let own = sample_task(None, 3);
        assert!(can_access_task(&carol, &own));

        assert!(can_delete_task(&admin));
        assert!(!can_delete_task(&bob));
    }

    #[test]
    fn test_comment_and_attachment_delete_rules() {
        let admin = Actor::new(1, Role::Admin);
        let bob = Actor::new(2, Role::Member);
        let carol = Actor::new(3, Role::Member);

        let comment = task_comment::Model {
            id: 10,
            task_id: 1,
            user_id: 2,
            text: "hi".into(),
            attachments: serde_json::json!([]),
            created_at: ts(0),
        };
        assert!(can_delete_comment(&bob, &comment));
        assert!(can_delete_comment(&admin, &comment));
        assert!(!can_delete_comment(&carol, &comment));

        let attachment = task_attachment::Model {
            id: 20,
            task_id: 1,
            url: "/uploads/tasks/x.pdf".into(),
            name: "x.pdf".into(),
            mime_type: "application/pdf".into(),
            size: 3,
            uploaded_by: 3,
            created_at: ts(0),
        };
        assert!(can_delete_attachment(&carol, &attachment));
        assert!(can_delete_attachment(&admin, &attachment));
        assert!(!can_delete_attachment(&bob, &attachment));
    }

    #[test]
    fn test_list_scope() {
        let admin = Actor::new(1, Role::Admin);
        let bob = Actor::new(2, Role::Member);

        assert_eq!(list_scope(&admin, None), None);
        assert_eq!(list_scope(&admin, Some(2)), Some(2));
        assert_eq!(list_scope(&bob, None), Some(2));
        assert_eq!(list_scope(&bob, Some(1)), Some(2));
    }

    #[test]
    fn test_default_assignee() {
        let admin = Actor::new(1, Role::Admin);
        let bob = Actor::new(2, Role::Member);

        assert_eq!(default_assignee(&admin, None), None);
        assert_eq!(default_assignee(&bob, None), Some(2));
        assert_eq!(default_assignee(&bob, Some(3)), Some(3));
    }
}
