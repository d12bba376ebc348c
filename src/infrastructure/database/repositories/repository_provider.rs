//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::bill::BillRepository;
use crate::domain::payment::PaymentRepository;
use crate::domain::repositories::RepositoryProvider;
use crate::domain::tariff::TariffRepository;

use super::bill_repository::SeaOrmBillRepository;
use super::payment_repository::SeaOrmPaymentRepository;
use super::tariff_repository::SeaOrmTariffRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let tariff = repos.tariffs().find_by_code("RES-2024").await?;
/// let bills = repos.bills().list(&BillFilter::default(), 1, 20).await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    tariffs: SeaOrmTariffRepository,
    bills: SeaOrmBillRepository,
    payments: SeaOrmPaymentRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            tariffs: SeaOrmTariffRepository::new(db.clone()),
            bills: SeaOrmBillRepository::new(db.clone()),
            payments: SeaOrmPaymentRepository::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn tariffs(&self) -> &dyn TariffRepository {
        &self.tariffs
    }

    fn bills(&self) -> &dyn BillRepository {
        &self.bills
    }

    fn payments(&self) -> &dyn PaymentRepository {
        &self.payments
    }
}
