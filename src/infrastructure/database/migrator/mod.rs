//! Database migrations module

pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_tariffs;
mod m20240101_000002_create_tariff_slabs;
mod m20240101_000003_create_bills;
mod m20240101_000004_create_bill_items;
mod m20240101_000005_create_payments;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_tariffs::Migration),
            Box::new(m20240101_000002_create_tariff_slabs::Migration),
            Box::new(m20240101_000003_create_bills::Migration),
            Box::new(m20240101_000004_create_bill_items::Migration),
            Box::new(m20240101_000005_create_payments::Migration),
        ]
    }
}
