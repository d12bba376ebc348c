//! Payment repository interface

use async_trait::async_trait;

use super::model::Payment;
use crate::domain::bill::Bill;
use crate::domain::DomainResult;

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Store `payment` and the updated account of `bill` in one unit of
    /// work. Fails with `Conflict` when the stored bill version no longer
    /// equals `expected_version`; nothing is written in that case.
    async fn record(
        &self,
        bill: &Bill,
        expected_version: i32,
        payment: Payment,
    ) -> DomainResult<(Bill, Payment)>;
    /// Payments of a bill, oldest first.
    async fn find_by_bill(&self, bill_id: i32) -> DomainResult<Vec<Payment>>;
}
