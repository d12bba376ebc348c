//! Create tariffs table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tariffs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tariffs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tariffs::Code).string().not_null())
                    .col(ColumnDef::new(Tariffs::Name).string().not_null())
                    .col(ColumnDef::new(Tariffs::Description).string())
                    .col(
                        ColumnDef::new(Tariffs::ConnectionType)
                            .string()
                            .not_null()
                            .default("residential"),
                    )
                    .col(ColumnDef::new(Tariffs::EffectiveFrom).date().not_null())
                    .col(ColumnDef::new(Tariffs::EffectiveTo).date())
                    .col(
                        ColumnDef::new(Tariffs::FixedCharge)
                            .string()
                            .not_null()
                            .default("0"),
                    )
                    .col(
                        ColumnDef::new(Tariffs::MinimumCharge)
                            .string()
                            .not_null()
                            .default("0"),
                    )
                    .col(
                        ColumnDef::new(Tariffs::TaxPercentage)
                            .string()
                            .not_null()
                            .default("0"),
                    )
                    .col(
                        ColumnDef::new(Tariffs::Currency)
                            .string()
                            .not_null()
                            .default("SAR"),
                    )
                    .col(
                        ColumnDef::new(Tariffs::BillingCycle)
                            .string()
                            .not_null()
                            .default("monthly"),
                    )
                    .col(ColumnDef::new(Tariffs::Supersedes).integer())
                    .col(
                        ColumnDef::new(Tariffs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tariffs_code")
                    .table(Tariffs::Table)
                    .col(Tariffs::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tariffs_connection_type_effective_from")
                    .table(Tariffs::Table)
                    .col(Tariffs::ConnectionType)
                    .col(Tariffs::EffectiveFrom)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tariffs::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Tariffs {
    Table,
    Id,
    Code,
    Name,
    Description,
    ConnectionType,
    EffectiveFrom,
    EffectiveTo,
    FixedCharge,
    MinimumCharge,
    TaxPercentage,
    Currency,
    BillingCycle,
    Supersedes,
    CreatedAt,
}
