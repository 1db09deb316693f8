use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // assigned_to / created_by は弱参照。ユーザー削除でタスクを消さないため外部キーは張らない。
        manager
            .create_table(
                Table::create()
                    .table(Task::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Task::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Task::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Task::Description).text().not_null())
                    .col(ColumnDef::new(Task::Priority).string_len(16).not_null().default("medium"))
                    .col(ColumnDef::new(Task::Status).string_len(20).not_null().default("pending"))
                    .col(ColumnDef::new(Task::DueDate).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Task::AssignedTo).integer())
                    .col(ColumnDef::new(Task::CreatedBy).integer().not_null())
                    .col(ColumnDef::new(Task::Progress).integer().not_null().default(0))
                    .col(ColumnDef::new(Task::CompletedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Task::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Task::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_task_assigned_to")
                    .table(Task::Table)
                    .col(Task::AssignedTo)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_task_status")
                    .table(Task::Table)
                    .col(Task::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Task::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Task {
    Table,
    Id,
    Title,
    Description,
    Priority,
    Status,
    DueDate,
    AssignedTo,
    CreatedBy,
    Progress,
    CompletedAt,
    CreatedAt,
    UpdatedAt,
}
