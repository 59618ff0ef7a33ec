use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Alerts {
    Table,
    Id,
    Description,
    Longitude,
    Latitude,
    EffectRadius,
    Country,
    City,
    County,
    ReportedBy,
    SourceUrl,
    PositiveVotes,
    NegativeVotes,
    HazardKind,
    HazardDetailId,
    SoftDeletionTime,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum HazardDetails {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alerts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alerts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Alerts::Description).text().not_null())
                    .col(ColumnDef::new(Alerts::Longitude).double().not_null())
                    .col(ColumnDef::new(Alerts::Latitude).double().not_null())
                    .col(ColumnDef::new(Alerts::EffectRadius).integer().not_null())
                    .col(ColumnDef::new(Alerts::Country).string_len(100))
                    .col(ColumnDef::new(Alerts::City).string_len(100))
                    .col(ColumnDef::new(Alerts::County).string_len(100))
                    .col(ColumnDef::new(Alerts::ReportedBy).integer())
                    .col(ColumnDef::new(Alerts::SourceUrl).string())
                    .col(
                        ColumnDef::new(Alerts::PositiveVotes)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Alerts::NegativeVotes)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Alerts::HazardKind).string_len(20))
                    .col(ColumnDef::new(Alerts::HazardDetailId).integer())
                    .col(
                        ColumnDef::new(Alerts::SoftDeletionTime)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Alerts::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Alerts::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Alerts::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_alerts_reported_by")
                            .from(Alerts::Table, Alerts::ReportedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_alerts_hazard_detail_id")
                            .from(Alerts::Table, Alerts::HazardDetailId)
                            .to(HazardDetails::Table, HazardDetails::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_alerts_created_at")
                    .table(Alerts::Table)
                    .col(Alerts::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // The sweep scans active alerts by expiry.
        manager
            .create_index(
                Index::create()
                    .name("idx_alerts_active_expiry")
                    .table(Alerts::Table)
                    .col(Alerts::IsActive)
                    .col(Alerts::SoftDeletionTime)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_alerts_hazard_kind")
                    .table(Alerts::Table)
                    .col(Alerts::HazardKind)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alerts::Table).to_owned())
            .await
    }
}
