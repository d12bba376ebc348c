//! Create bill_items table

use sea_orm_migration::prelude::*;

use super::m20240101_000003_create_bills::Bills;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BillItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BillItems::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BillItems::BillId).integer().not_null())
                    .col(ColumnDef::new(BillItems::Position).integer().not_null())
                    .col(ColumnDef::new(BillItems::ItemType).string().not_null())
                    .col(ColumnDef::new(BillItems::Description).string().not_null())
                    .col(ColumnDef::new(BillItems::Units).string())
                    .col(ColumnDef::new(BillItems::Rate).string())
                    .col(ColumnDef::new(BillItems::SlabNumber).integer())
                    .col(ColumnDef::new(BillItems::Amount).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bill_items_bill")
                            .from(BillItems::Table, BillItems::BillId)
                            .to(Bills::Table, Bills::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bill_items_bill_position")
                    .table(BillItems::Table)
                    .col(BillItems::BillId)
                    .col(BillItems::Position)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BillItems::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum BillItems {
    Table,
    Id,
    BillId,
    Position,
    ItemType,
    Description,
    Units,
    Rate,
    SlabNumber,
    Amount,
}
