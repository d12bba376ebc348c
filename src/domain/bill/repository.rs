//! Bill repository interface

use async_trait::async_trait;

use super::model::{Bill, BillFilter, BillLineItem};
use crate::domain::DomainResult;

#[async_trait]
pub trait BillRepository: Send + Sync {
    /// Insert an issued bill with its line items; returns it with its id.
    /// A duplicate bill number is a `Conflict`.
    async fn save(&self, bill: Bill) -> DomainResult<Bill>;
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Bill>>;
    async fn find_by_number(&self, bill_number: &str) -> DomainResult<Option<Bill>>;
    /// One page of bills matching `filter`, newest first, plus the total
    /// match count.
    async fn list(
        &self,
        filter: &BillFilter,
        page: u64,
        limit: u64,
    ) -> DomainResult<(Vec<Bill>, u64)>;
    /// Number of bills whose number starts with `{prefix}-{year}-`.
    async fn count_numbered(&self, prefix: &str, year: i32) -> DomainResult<u64>;
    /// Write the account fields of `bill` (amounts, status, totals) and
    /// append `new_items`, provided the stored version still equals
    /// `expected_version`. Returns the bill with its bumped version; a stale
    /// version is a `Conflict`.
    async fn update_account(
        &self,
        bill: &Bill,
        expected_version: i32,
        new_items: &[BillLineItem],
    ) -> DomainResult<Bill>;
}
