use rocket::fs::TempFile;
use sea_orm::*;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::entities::task::{TaskPriority, TaskStatus};
use crate::entities::task_comment::CommentAttachment;
use crate::entities::{checklist_item, prelude::*, task, task_attachment, task_comment};
use crate::errors::AppError;
use crate::lifecycle::{self, Actor};
use crate::services::user_service::UserService;
use crate::storage::{FileStorage, StoredFile, UploadKind, UploadMeta};
use crate::validation::{self, parse_due_date, parse_id};
use crate::views::pagination::{self, PageRequest};
use crate::views::task::{AttachmentView, ChecklistItemView, CommentView, TaskDetailView, TaskSummaryView};

const TITLE_MAX_CHARS: usize = 200;

const SORTABLE_COLUMNS: &[(&str, task::Column)] = &[
    ("createdAt", task::Column::CreatedAt),
    ("updatedAt", task::Column::UpdatedAt),
    ("dueDate", task::Column::DueDate),
    ("title", task::Column::Title),
    ("priority", task::Column::Priority),
    ("status", task::Column::Status),
    ("progress", task::Column::Progress),
];

/// キーが存在すれば (null を含めて) `Some` にする。
/// 「指定なし」と「明示的な null (担当者の解除)」を区別するために使う。
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ChecklistInput {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

/// タスク作成の入力
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub due_date: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub assigned_to: Option<Value>,
    pub progress: Option<f64>,
    #[serde(default)]
    pub checklist: Vec<ChecklistInput>,
}

/// タスク更新の入力。`None` の項目は変更しない。
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub due_date: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub assigned_to: Option<Value>,
    pub progress: Option<f64>,
    /// 指定された場合はチェックリストを丸ごと置き換える
    pub checklist: Option<Vec<ChecklistInput>>,
}

/// 一覧の検索条件
#[derive(Debug, Clone)]
pub struct TaskListQuery {
    pub status: Option<String>,
    pub assigned_to: Option<String>,
    pub sort_by: Option<String>,
    pub page: PageRequest,
}

/// 一覧の結果
#[derive(Debug)]
pub struct TaskPage {
    pub tasks: Vec<TaskSummaryView>,
    pub total: u64,
    pub page: PageRequest,
}

/// `assignedTo` の入力を単一の参照に正規化します。
///
/// ID 文字列・数値・要素1つの配列・`{id}` / `{_id}` オブジェクトを受け付ける。
/// `null`、空文字列、空配列は「担当者なし」。
pub fn parse_assignee(value: &Value) -> Result<Option<i32>, AppError> {
    let invalid = || AppError::Validation("Invalid assignedTo value".into());

    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => parse_id(s.trim(), "user").map(Some),
        Value::Number(n) => n
            .as_i64()
            .filter(|id| *id > 0)
            .and_then(|id| i32::try_from(id).ok())
            .map(Some)
            .ok_or_else(invalid),
        Value::Array(items) => match items.as_slice() {
            [] => Ok(None),
            [single] if !single.is_array() => parse_assignee(single),
            _ => Err(invalid()),
        },
        Value::Object(map) => match map.get("id").or_else(|| map.get("_id")) {
            Some(inner) if !inner.is_object() && !inner.is_array() => parse_assignee(inner),
            _ => Err(invalid()),
        },
        Value::Bool(_) => Err(invalid()),
    }
}

/// `field:asc|desc` 形式のソート指定を分解します。順序の省略は昇順。
pub fn parse_sort(sort_by: &str) -> (&str, Order) {
    match sort_by.split_once(':') {
        Some((field, order)) if order.trim().eq_ignore_ascii_case("desc") => (field.trim(), Order::Desc),
        Some((field, _)) => (field.trim(), Order::Asc),
        None => (sort_by.trim(), Order::Asc),
    }
}

fn required(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn check_title(title: &str) -> Result<(), AppError> {
    if title.chars().count() > TITLE_MAX_CHARS {
        return Err(AppError::Validation(format!(
            "Title cannot be more than {} characters",
            TITLE_MAX_CHARS
        )));
    }
    Ok(())
}

fn progress_from(value: f64) -> i32 {
    lifecycle::clamp_progress(value.round() as i64)
}

fn forbidden_task() -> AppError {
    AppError::Forbidden("Not authorized to access this task".into())
}

fn store_failure(e: std::io::Error) -> AppError {
    AppError::Internal(format!("Failed to store uploaded file: {}", e))
}

/// タスクの作成・取得・更新・削除と、コメント・添付の操作。
/// 認可ルールは `lifecycle` の述語で判定し、違反時は変更前にエラーを返す。
pub struct TaskService;

impl TaskService {
    /// IDでタスクを取得。無ければ `NotFound`。
    pub async fn find(db: &DatabaseConnection, id: i32) -> Result<task::Model, AppError> {
        Task::find_by_id(id).one(db).await?.ok_or_else(AppError::task_not_found)
    }

    async fn find_accessible(db: &DatabaseConnection, actor: &Actor, id: i32) -> Result<task::Model, AppError> {
        let task = Self::find(db, id).await?;
        if !lifecycle::can_access_task(actor, &task) {
            return Err(forbidden_task());
        }
        Ok(task)
    }

    /// 担当者IDが有効なユーザーを指しているか確認します。
    async fn resolve_assignee(db: &DatabaseConnection, value: &Value) -> Result<Option<i32>, AppError> {
        match parse_assignee(value)? {
            Some(id) => match UserService::find_active_by_id(db, id).await? {
                Some(user) => Ok(Some(user.id)),
                None => Err(AppError::assignee_not_found()),
            },
            None => Ok(None),
        }
    }

    async fn insert_checklist<C>(conn: &C, task_id: i32, items: Vec<ChecklistInput>) -> Result<(), AppError>
    where
        C: ConnectionTrait,
    {
        let cleaned = lifecycle::clean_checklist(items.into_iter().map(|i| (i.text, i.completed)));
        if cleaned.is_empty() {
            return Ok(());
        }

        let rows = cleaned.into_iter().enumerate().map(|(position, (text, completed))| checklist_item::ActiveModel {
            task_id: Set(task_id),
            text: Set(text),
            completed: Set(completed),
            position: Set(position as i32),
            ..Default::default()
        });
        ChecklistItem::insert_many(rows).exec(conn).await?;
        Ok(())
    }

    /// タスク作成。タイトル・説明・期日は必須。
    pub async fn create(db: &DatabaseConnection, actor: &Actor, input: NewTask) -> Result<TaskDetailView, AppError> {
        let (Some(title), Some(description), Some(due_date)) =
            (required(input.title), required(input.description), required(input.due_date))
        else {
            return Err(AppError::Validation("Title, description and due date are required.".into()));
        };
        check_title(&title)?;
        let due_date = parse_due_date(&due_date)?;

        let assigned_to = match &input.assigned_to {
            Some(value) => Self::resolve_assignee(db, value).await?,
            None => None,
        };
        // 一般ユーザーが担当者なしで作成したタスクは本人の担当になる (一覧から見えなくならないように)
        let assigned_to = lifecycle::default_assignee(actor, assigned_to);

        let status = input.status.as_deref().map(TaskStatus::normalize).unwrap_or(TaskStatus::Pending);
        let priority = input.priority.as_deref().map(TaskPriority::normalize).unwrap_or(TaskPriority::Medium);
        let now = validation::now();

        let txn = db.begin().await?;
        let task = task::ActiveModel {
            title: Set(title),
            description: Set(description),
            priority: Set(priority),
            status: Set(status),
            due_date: Set(due_date),
            assigned_to: Set(assigned_to),
            created_by: Set(actor.id),
            progress: Set(input.progress.map(progress_from).unwrap_or(0)),
            completed_at: Set(lifecycle::completion_timestamp(TaskStatus::Pending, None, status, now)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        Self::insert_checklist(&txn, task.id, input.checklist).await?;
        txn.commit().await?;

        tracing::info!(task_id = task.id, created_by = actor.id, assigned_to = ?task.assigned_to, "task created");
        Self::detail(db, task).await
    }

    /// タスク一覧。一般ユーザーは常に自分が担当するタスクだけに絞られる。
    pub async fn list(db: &DatabaseConnection, actor: &Actor, query: TaskListQuery) -> Result<TaskPage, AppError> {
        let requested = match required(query.assigned_to) {
            Some(raw) if actor.is_admin() => Some(parse_id(&raw, "user")?),
            _ => None,
        };

        let mut select = Task::find();
        if let Some(assignee) = lifecycle::list_scope(actor, requested) {
            select = select.filter(task::Column::AssignedTo.eq(assignee));
        }
        if let Some(status) = required(query.status) {
            select = select.filter(task::Column::Status.eq(TaskStatus::normalize(&status)));
        }

        select = match required(query.sort_by) {
            Some(sort_by) => {
                let (field, order) = parse_sort(&sort_by);
                pagination::apply_sorting(select, field, order, SORTABLE_COLUMNS)?
            }
            None => select.order_by_desc(task::Column::CreatedAt),
        };
        select = select.order_by_desc(task::Column::Id);

        let (tasks, total) = pagination::fetch_page(db, select, query.page).await?;
        let users = UserService::summaries(
            db,
            tasks.iter().flat_map(|t| t.assigned_to.into_iter().chain([t.created_by])),
        )
        .await?;

        Ok(TaskPage {
            tasks: tasks.iter().map(|t| TaskSummaryView::new(t, &users)).collect(),
            total,
            page: query.page,
        })
    }

    /// タスク詳細を取得します。管理者・担当者・作成者のみ。
    pub async fn get(db: &DatabaseConnection, actor: &Actor, id: i32) -> Result<TaskDetailView, AppError> {
        let task = Self::find_accessible(db, actor, id).await?;
        Self::detail(db, task).await
    }

    /// 子コレクションと参照ユーザーを読み込んで詳細表現を組み立てます。
    pub async fn detail(db: &DatabaseConnection, task: task::Model) -> Result<TaskDetailView, AppError> {
        let checklist = task
            .find_related(ChecklistItem)
            .order_by_asc(checklist_item::Column::Position)
            .order_by_asc(checklist_item::Column::Id)
            .all(db)
            .await?;
        let attachments = task
            .find_related(TaskAttachment)
            .order_by_asc(task_attachment::Column::CreatedAt)
            .order_by_asc(task_attachment::Column::Id)
            .all(db)
            .await?;
        let comments = task
            .find_related(TaskComment)
            .order_by_desc(task_comment::Column::CreatedAt)
            .order_by_desc(task_comment::Column::Id)
            .all(db)
            .await?;

        let user_ids = task
            .assigned_to
            .into_iter()
            .chain([task.created_by])
            .chain(attachments.iter().map(|a| a.uploaded_by))
            .chain(comments.iter().map(|c| c.user_id));
        let users = UserService::summaries(db, user_ids).await?;

        Ok(TaskDetailView {
            task: TaskSummaryView::new(&task, &users),
            checklist: checklist.iter().map(ChecklistItemView::from).collect(),
            attachments: attachments.iter().map(|a| AttachmentView::new(a, &users)).collect(),
            comments: comments.iter().map(|c| CommentView::new(c, &users)).collect(),
        })
    }

    /// 項目の更新。状態が変わる場合は完了日時も合わせて更新する。
    pub async fn update(
        db: &DatabaseConnection,
        actor: &Actor,
        id: i32,
        changes: TaskChanges,
    ) -> Result<TaskDetailView, AppError> {
        let task = Self::find_accessible(db, actor, id).await?;

        let title = match changes.title {
            Some(title) => {
                let title = required(Some(title)).ok_or_else(|| AppError::Validation("Title cannot be empty".into()))?;
                check_title(&title)?;
                Some(title)
            }
            None => None,
        };
        let description = match changes.description {
            Some(description) => Some(
                required(Some(description)).ok_or_else(|| AppError::Validation("Description cannot be empty".into()))?,
            ),
            None => None,
        };
        let due_date = match required(changes.due_date) {
            Some(raw) => Some(parse_due_date(&raw)?),
            None => None,
        };
        let assigned_to = match &changes.assigned_to {
            Some(value) => Some(Self::resolve_assignee(db, value).await?),
            None => None,
        };

        let previous_status = task.status;
        let previous_completed_at = task.completed_at;
        let now = validation::now();

        let mut active: task::ActiveModel = task.into();
        if let Some(title) = title {
            active.title = Set(title);
        }
        if let Some(description) = description {
            active.description = Set(description);
        }
        if let Some(priority) = required(changes.priority) {
            active.priority = Set(TaskPriority::normalize(&priority));
        }
        if let Some(status) = required(changes.status) {
            let next = TaskStatus::normalize(&status);
            active.status = Set(next);
            active.completed_at = Set(lifecycle::completion_timestamp(previous_status, previous_completed_at, next, now));
        }
        if let Some(due_date) = due_date {
            active.due_date = Set(due_date);
        }
        if let Some(assigned_to) = assigned_to {
            active.assigned_to = Set(assigned_to);
        }
        if let Some(progress) = changes.progress {
            active.progress = Set(progress_from(progress));
        }
        active.updated_at = Set(now);

        let txn = db.begin().await?;
        let task = active.update(&txn).await?;
        if let Some(items) = changes.checklist {
            ChecklistItem::delete_many()
                .filter(checklist_item::Column::TaskId.eq(task.id))
                .exec(&txn)
                .await?;
            Self::insert_checklist(&txn, task.id, items).await?;
        }
        txn.commit().await?;

        Self::detail(db, task).await
    }

    /// 状態のみの更新
    pub async fn update_status(
        db: &DatabaseConnection,
        actor: &Actor,
        id: i32,
        status: Option<String>,
    ) -> Result<TaskDetailView, AppError> {
        let Some(status) = required(status) else {
            return Err(AppError::Validation("Please provide a status".into()));
        };
        let task = Self::find_accessible(db, actor, id).await?;

        let next = TaskStatus::normalize(&status);
        let now = validation::now();
        let completed_at = lifecycle::completion_timestamp(task.status, task.completed_at, next, now);

        let mut active: task::ActiveModel = task.into();
        active.status = Set(next);
        active.completed_at = Set(completed_at);
        active.updated_at = Set(now);
        let task = active.update(db).await?;

        tracing::info!(task_id = task.id, status = next.as_str(), actor = actor.id, "task status changed");
        Self::detail(db, task).await
    }

    /// タスク削除 (管理者のみ)。子レコードを消してから保存済みファイルも削除する。
    pub async fn delete(db: &DatabaseConnection, storage: &FileStorage, actor: &Actor, id: i32) -> Result<(), AppError> {
        if !lifecycle::can_delete_task(actor) {
            return Err(AppError::Forbidden("Only admins can delete tasks".into()));
        }
        let task = Self::find(db, id).await?;

        let attachments = task.find_related(TaskAttachment).all(db).await?;
        let comments = task.find_related(TaskComment).all(db).await?;
        let mut urls: Vec<String> = attachments.into_iter().map(|a| a.url).collect();
        urls.extend(comments.iter().flat_map(|c| c.attachment_list()).map(|a| a.url));

        let txn = db.begin().await?;
        TaskComment::delete_many()
            .filter(task_comment::Column::TaskId.eq(task.id))
            .exec(&txn)
            .await?;
        TaskAttachment::delete_many()
            .filter(task_attachment::Column::TaskId.eq(task.id))
            .exec(&txn)
            .await?;
        ChecklistItem::delete_many()
            .filter(checklist_item::Column::TaskId.eq(task.id))
            .exec(&txn)
            .await?;
        Task::delete_by_id(task.id).exec(&txn).await?;
        txn.commit().await?;

        storage.remove_all(urls.iter().map(String::as_str)).await;
        tracing::info!(task_id = id, deleted_by = actor.id, "task deleted");
        Ok(())
    }

    /// コメント追加。ファイルが添付されていればコメント行を書いた後に保存し、
    /// 保存に失敗したらコメントごと取り消す。
    pub async fn add_comment(
        db: &DatabaseConnection,
        storage: &FileStorage,
        actor: &Actor,
        task_id: i32,
        text: Option<String>,
        files: &mut [TempFile<'_>],
    ) -> Result<CommentView, AppError> {
        let task = Self::find_accessible(db, actor, task_id).await?;

        let text = text.map(|t| t.trim().to_string()).unwrap_or_default();
        if text.is_empty() && files.is_empty() {
            return Err(AppError::Validation("Comment text is required".into()));
        }

        let metas: Vec<UploadMeta> = files.iter().map(UploadMeta::from_temp_file).collect();
        for meta in &metas {
            meta.ensure_document()?;
        }
        let targets: Vec<StoredFile> = metas
            .iter()
            .map(|m| storage.allocate(UploadKind::Task, &m.extension))
            .collect();
        let descriptors: Vec<CommentAttachment> = metas
            .iter()
            .zip(&targets)
            .map(|(meta, target)| CommentAttachment {
                url: target.url.clone(),
                name: meta.name.clone(),
                mime_type: meta.mime_type.clone(),
                size: meta.size,
            })
            .collect();

        let attachments = serde_json::to_value(&descriptors).map_err(|e| AppError::Internal(e.to_string()))?;
        let comment = task_comment::ActiveModel {
            task_id: Set(task.id),
            user_id: Set(actor.id),
            text: Set(text),
            attachments: Set(attachments),
            created_at: Set(validation::now()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        for (index, (file, target)) in files.iter_mut().zip(&targets).enumerate() {
            if let Err(e) = storage.persist(file, target).await {
                tracing::error!(task_id = task.id, comment_id = comment.id, error = %e, "failed to store comment file");
                let urls: Vec<&str> = targets[..index].iter().map(|t| t.url.as_str()).collect();
                storage.remove_all(urls).await;
                TaskComment::delete_by_id(comment.id).exec(db).await?;
                return Err(store_failure(e));
            }
        }

        let users = UserService::summaries(db, [actor.id]).await?;
        Ok(CommentView::new(&comment, &users))
    }

    /// コメント削除。投稿者か管理者のみ。
    pub async fn delete_comment(
        db: &DatabaseConnection,
        storage: &FileStorage,
        actor: &Actor,
        task_id: i32,
        comment_id: i32,
    ) -> Result<(), AppError> {
        let task = Self::find(db, task_id).await?;
        let comment = TaskComment::find_by_id(comment_id)
            .filter(task_comment::Column::TaskId.eq(task.id))
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".into()))?;

        if !lifecycle::can_delete_comment(actor, &comment) {
            return Err(AppError::Forbidden("Not authorized to delete this comment".into()));
        }

        let files = comment.attachment_list();
        comment.delete(db).await?;
        let urls: Vec<&str> = files.iter().map(|a| a.url.as_str()).collect();
        storage.remove_all(urls).await;
        Ok(())
    }

    /// 添付ファイル追加。メタデータを先に書き、ファイル保存に失敗したら行を削除する。
    pub async fn add_attachment(
        db: &DatabaseConnection,
        storage: &FileStorage,
        actor: &Actor,
        task_id: i32,
        file: Option<&mut TempFile<'_>>,
    ) -> Result<AttachmentView, AppError> {
        let task = Self::find_accessible(db, actor, task_id).await?;
        let Some(file) = file else {
            return Err(AppError::Validation("No file uploaded".into()));
        };
        let meta = UploadMeta::from_temp_file(file);
        meta.ensure_document()?;

        let target = storage.allocate(UploadKind::Task, &meta.extension);
        let attachment = task_attachment::ActiveModel {
            task_id: Set(task.id),
            url: Set(target.url.clone()),
            name: Set(meta.name),
            mime_type: Set(meta.mime_type),
            size: Set(meta.size),
            uploaded_by: Set(actor.id),
            created_at: Set(validation::now()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        if let Err(e) = storage.persist(file, &target).await {
            tracing::error!(task_id = task.id, attachment_id = attachment.id, error = %e, "failed to store attachment");
            TaskAttachment::delete_by_id(attachment.id).exec(db).await?;
            return Err(store_failure(e));
        }

        tracing::info!(task_id = task.id, attachment_id = attachment.id, size = attachment.size, "attachment stored");
        let users = UserService::summaries(db, [actor.id]).await?;
        Ok(AttachmentView::new(&attachment, &users))
    }

    /// 添付ファイル削除。アップロードした本人か管理者のみ。
    pub async fn delete_attachment(
        db: &DatabaseConnection,
        storage: &FileStorage,
        actor: &Actor,
        task_id: i32,
        attachment_id: i32,
    ) -> Result<(), AppError> {
        let task = Self::find(db, task_id).await?;
        let attachment = TaskAttachment::find_by_id(attachment_id)
            .filter(task_attachment::Column::TaskId.eq(task.id))
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Attachment not found".into()))?;

        if !lifecycle::can_delete_attachment(actor, &attachment) {
            return Err(AppError::Forbidden("Not authorized to delete this attachment".into()));
        }

        let url = attachment.url.clone();
        attachment.delete(db).await?;
        storage.remove_url(&url).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_assignee_shapes() {
        assert_eq!(parse_assignee(&json!("7")).unwrap(), Some(7));
        assert_eq!(parse_assignee(&json!(" 7 ")).unwrap(), Some(7));
        assert_eq!(parse_assignee(&json!(7)).unwrap(), Some(7));
        assert_eq!(parse_assignee(&json!(["7"])).unwrap(), Some(7));
        assert_eq!(parse_assignee(&json!([7])).unwrap(), Some(7));
        assert_eq!(parse_assignee(&json!({"id": 7})).unwrap(), Some(7));
        assert_eq!(parse_assignee(&json!({"_id": "7"})).unwrap(), Some(7));
    }

    #[test]
    fn test_parse_assignee_empty_means_unassigned() {
        assert_eq!(parse_assignee(&Value::Null).unwrap(), None);
        assert_eq!(parse_assignee(&json!("")).unwrap(), None);
        assert_eq!(parse_assignee(&json!([])).unwrap(), None);
    }

    #[test]
    fn test_parse_assignee_rejects_other_shapes() {
        for value in [
            json!(true),
            json!(-1),
            json!(1.5),
            json!("abc"),
            json!([1, 2]),
            json!([[1]]),
            json!({"name": "bob"}),
            json!({"id": {"id": 1}}),
        ] {
            assert!(
                matches!(parse_assignee(&value), Err(AppError::Validation(_))),
                "{value}"
            );
        }
    }

    #[test]
    fn test_missing_and_null_assignee_are_distinguished() {
        let missing: TaskChanges = serde_json::from_value(json!({"title": "x"})).unwrap();
        assert!(missing.assigned_to.is_none());

        let cleared: TaskChanges = serde_json::from_value(json!({"assignedTo": null})).unwrap();
        assert_eq!(cleared.assigned_to, Some(Value::Null));
    }

    #[test]
    fn test_parse_sort() {
        assert_eq!(parse_sort("dueDate:desc"), ("dueDate", Order::Desc));
        assert_eq!(parse_sort("title:asc"), ("title", Order::Asc));
        assert_eq!(parse_sort("priority"), ("priority", Order::Asc));
        assert_eq!(parse_sort("status:DESC"), ("status", Order::Desc));
    }

    #[test]
    fn test_progress_rounding_and_clamping() {
        assert_eq!(progress_from(42.4), 42);
        assert_eq!(progress_from(42.6), 43);
        assert_eq!(progress_from(-10.0), 0);
        assert_eq!(progress_from(180.0), 100);
    }

    #[test]
    fn test_title_length_limit() {
        assert!(check_title(&"a".repeat(200)).is_ok());
        assert!(check_title(&"a".repeat(201)).is_err());
    }
}
