use sea_orm_migration::prelude::*;

use super::m20250601_000002_create_task_table::Task;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // コメント・添付・チェックリストは行単位で追加する（親ドキュメントの読み書きを伴わない）
        manager
            .create_table(
                Table::create()
                    .table(TaskComment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TaskComment::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TaskComment::TaskId).integer().not_null())
                    .col(ColumnDef::new(TaskComment::UserId).integer().not_null())
                    .col(ColumnDef::new(TaskComment::Text).text().not_null())
                    .col(ColumnDef::new(TaskComment::Attachments).json().not_null())
                    .col(
                        ColumnDef::new(TaskComment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_task_comment_task")
                            .from(TaskComment::Table, TaskComment::TaskId)
                            .to(Task::Table, Task::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TaskAttachment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TaskAttachment::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TaskAttachment::TaskId).integer().not_null())
                    .col(ColumnDef::new(TaskAttachment::Url).string().not_null())
                    .col(ColumnDef::new(TaskAttachment::Name).string().not_null())
                    .col(ColumnDef::new(TaskAttachment::MimeType).string_len(127).not_null())
                    .col(ColumnDef::new(TaskAttachment::Size).big_integer().not_null())
                    .col(ColumnDef::new(TaskAttachment::UploadedBy).integer().not_null())
                    .col(
                        ColumnDef::new(TaskAttachment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_task_attachment_task")
                            .from(TaskAttachment::Table, TaskAttachment::TaskId)
                            .to(Task::Table, Task::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ChecklistItem::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ChecklistItem::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ChecklistItem::TaskId).integer().not_null())
                    .col(ColumnDef::new(ChecklistItem::Text).string().not_null())
                    .col(ColumnDef::new(ChecklistItem::Completed).boolean().not_null().default(false))
                    .col(ColumnDef::new(ChecklistItem::Position).integer().not_null().default(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_checklist_item_task")
                            .from(ChecklistItem::Table, ChecklistItem::TaskId)
                            .to(Task::Table, Task::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ChecklistItem::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TaskAttachment::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TaskComment::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TaskComment {
    Table,
    Id,
    TaskId,
    UserId,
    Text,
    Attachments,
    CreatedAt,
}

#[derive(DeriveIden)]
enum TaskAttachment {
    Table,
    Id,
    TaskId,
    Url,
    Name,
    MimeType,
    Size,
    UploadedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ChecklistItem {
    Table,
    Id,
    TaskId,
    Text,
    Completed,
    Position,
}
