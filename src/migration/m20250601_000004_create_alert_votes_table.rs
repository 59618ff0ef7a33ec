use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum AlertVotes {
    Table,
    Id,
    AlertId,
    UserId,
    Vote,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Alerts {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AlertVotes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AlertVotes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AlertVotes::AlertId).integer().not_null())
                    .col(ColumnDef::new(AlertVotes::UserId).integer().not_null())
                    .col(ColumnDef::new(AlertVotes::Vote).boolean().not_null())
                    .col(
                        ColumnDef::new(AlertVotes::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_alert_votes_alert_id")
                            .from(AlertVotes::Table, AlertVotes::AlertId)
                            .to(Alerts::Table, Alerts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_alert_votes_user_id")
                            .from(AlertVotes::Table, AlertVotes::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One vote per (user, alert).
        manager
            .create_index(
                Index::create()
                    .name("idx_alert_votes_unique")
                    .table(AlertVotes::Table)
                    .col(AlertVotes::UserId)
                    .col(AlertVotes::AlertId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_alert_votes_alert")
                    .table(AlertVotes::Table)
                    .col(AlertVotes::AlertId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AlertVotes::Table).to_owned())
            .await
    }
}
