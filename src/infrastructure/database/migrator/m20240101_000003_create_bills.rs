//! Create bills table

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_tariffs::Tariffs;

#[derive(DeriveMigrationName)]
pub struct Migration;

fn amount(col: Bills) -> ColumnDef {
    ColumnDef::new(col).string().not_null().default("0").to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Bills::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Bills::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Bills::BillNumber).string().not_null())
                    .col(ColumnDef::new(Bills::CustomerId).integer().not_null())
                    .col(ColumnDef::new(Bills::MeterId).integer().not_null())
                    .col(ColumnDef::new(Bills::TariffId).integer().not_null())
                    .col(ColumnDef::new(Bills::BillingPeriodStart).date().not_null())
                    .col(ColumnDef::new(Bills::BillingPeriodEnd).date().not_null())
                    .col(ColumnDef::new(Bills::IssueDate).date().not_null())
                    .col(ColumnDef::new(Bills::DueDate).date().not_null())
                    .col(amount(Bills::PreviousReading))
                    .col(amount(Bills::CurrentReading))
                    .col(amount(Bills::Consumption))
                    .col(amount(Bills::EnergyCharges))
                    .col(amount(Bills::FixedCharges))
                    .col(amount(Bills::TaxAmount))
                    .col(amount(Bills::Discount))
                    .col(amount(Bills::MinimumChargeAdjustment))
                    .col(amount(Bills::PreviousBalance))
                    .col(amount(Bills::LateFee))
                    .col(amount(Bills::TotalAmount))
                    .col(amount(Bills::PaidAmount))
                    .col(amount(Bills::RemainingAmount))
                    .col(
                        ColumnDef::new(Bills::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Bills::Version)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Bills::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Bills::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bills_tariff")
                            .from(Bills::Table, Bills::TariffId)
                            .to(Tariffs::Table, Tariffs::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bills_bill_number")
                    .table(Bills::Table)
                    .col(Bills::BillNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bills_customer_id")
                    .table(Bills::Table)
                    .col(Bills::CustomerId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bills::Table).to_owned())
            .await
    }
}

#[derive(Iden, Clone, Copy)]
pub enum Bills {
    Table,
    Id,
    BillNumber,
    CustomerId,
    MeterId,
    TariffId,
    BillingPeriodStart,
    BillingPeriodEnd,
    IssueDate,
    DueDate,
    PreviousReading,
    CurrentReading,
    Consumption,
    EnergyCharges,
    FixedCharges,
    TaxAmount,
    Discount,
    MinimumChargeAdjustment,
    PreviousBalance,
    LateFee,
    TotalAmount,
    PaidAmount,
    RemainingAmount,
    Status,
    Version,
    CreatedAt,
    UpdatedAt,
}
