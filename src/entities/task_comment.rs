use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// コメントに付く軽量な添付ファイル情報。`attachments` 列に JSON で保存します。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentAttachment {
    pub url: String,
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "task_comment")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub task_id: i32,
    /// 投稿者のユーザーID
    pub user_id: i32,
    #[sea_orm(column_type = "Text")]
    pub text: String,
    pub attachments: Json,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::task::Entity",
        from = "Column::TaskId",
        to = "super::task::Column::Id",
        on_delete = "Cascade"
    )]
    Task,
}

impl Related<super::task::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Task.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// 保存済みの JSON を添付ファイル一覧に戻します。壊れた値は空として扱う。
    pub fn attachment_list(&self) -> Vec<CommentAttachment> {
        serde_json::from_value(self.attachments.clone()).unwrap_or_default()
    }
}
