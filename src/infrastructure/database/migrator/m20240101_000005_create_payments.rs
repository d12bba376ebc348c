//! Create payments table

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
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Payments::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Payments::PaymentNumber).string().not_null())
                    .col(ColumnDef::new(Payments::BillId).integer().not_null())
                    .col(ColumnDef::new(Payments::CustomerId).integer().not_null())
                    .col(ColumnDef::new(Payments::Amount).string().not_null())
                    .col(
                        ColumnDef::new(Payments::Method)
                            .string()
                            .not_null()
                            .default("cash"),
                    )
                    .col(ColumnDef::new(Payments::Reference).string())
                    .col(ColumnDef::new(Payments::Notes).string())
                    .col(
                        ColumnDef::new(Payments::PaidAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Payments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_bill")
                            .from(Payments::Table, Payments::BillId)
                            .to(Bills::Table, Bills::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payments_payment_number")
                    .table(Payments::Table)
                    .col(Payments::PaymentNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payments_bill_id")
                    .table(Payments::Table)
                    .col(Payments::BillId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Payments {
    Table,
    Id,
    PaymentNumber,
    BillId,
    CustomerId,
    Amount,
    Method,
    Reference,
    Notes,
    PaidAt,
    CreatedAt,
}
