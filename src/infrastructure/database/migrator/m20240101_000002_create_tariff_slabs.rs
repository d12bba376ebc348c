//! Create tariff_slabs table

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_tariffs::Tariffs;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TariffSlabs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TariffSlabs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TariffSlabs::TariffId).integer().not_null())
                    .col(ColumnDef::new(TariffSlabs::SlabNumber).integer().not_null())
                    .col(ColumnDef::new(TariffSlabs::FromUnits).string().not_null())
                    .col(ColumnDef::new(TariffSlabs::ToUnits).string())
                    .col(ColumnDef::new(TariffSlabs::RatePerUnit).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tariff_slabs_tariff")
                            .from(TariffSlabs::Table, TariffSlabs::TariffId)
                            .to(Tariffs::Table, Tariffs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tariff_slabs_tariff_slab_number")
                    .table(TariffSlabs::Table)
                    .col(TariffSlabs::TariffId)
                    .col(TariffSlabs::SlabNumber)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TariffSlabs::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum TariffSlabs {
    Table,
    Id,
    TariffId,
    SlabNumber,
    FromUnits,
    ToUnits,
    RatePerUnit,
}
