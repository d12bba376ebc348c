//! In-memory storage implementation

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use dashmap::DashMap;

use crate::domain::bill::{Bill, BillFilter, BillLineItem, BillRepository};
use crate::domain::payment::{Payment, PaymentRepository};
use crate::domain::tariff::{ConnectionType, Slab, Tariff, TariffRepository};
use crate::domain::{DomainError, DomainResult, RepositoryProvider};

/// In-memory storage for development and testing.
///
/// Implements every repository port, so one instance serves as the whole
/// `RepositoryProvider`.
pub struct InMemoryStorage {
    tariffs: DashMap<i32, Tariff>,
    slabs: DashMap<i32, Vec<Slab>>,
    bills: DashMap<i32, Bill>,
    payments: DashMap<i32, Payment>,
    tariff_counter: AtomicI32,
    bill_counter: AtomicI32,
    payment_counter: AtomicI32,
    /// Serializes tariff and bill inserts so uniqueness and overlap checks hold
    write_lock: Mutex<()>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            tariffs: DashMap::new(),
            slabs: DashMap::new(),
            bills: DashMap::new(),
            payments: DashMap::new(),
            tariff_counter: AtomicI32::new(1),
            bill_counter: AtomicI32::new(1),
            payment_counter: AtomicI32::new(1),
            write_lock: Mutex::new(()),
        }
    }

    fn lock(&self) -> DomainResult<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| DomainError::Storage("in-memory write lock poisoned".into()))
    }

    fn siblings(&self, connection_type: ConnectionType) -> Vec<Tariff> {
        let mut matching: Vec<Tariff> = self
            .tariffs
            .iter()
            .filter(|t| t.connection_type == connection_type)
            .map(|t| t.value().clone())
            .collect();
        matching.sort_by_key(|t| t.effective_from);
        matching
    }

    /// Caller holds `write_lock` and has checked the effective range.
    fn insert_tariff(&self, mut tariff: Tariff, slabs: Vec<Slab>) -> DomainResult<Tariff> {
        if self.tariffs.iter().any(|t| t.code == tariff.code) {
            return Err(DomainError::Conflict(format!(
                "tariff code '{}' already exists",
                tariff.code
            )));
        }
        tariff.id = self.tariff_counter.fetch_add(1, Ordering::SeqCst);
        self.slabs.insert(tariff.id, slabs);
        self.tariffs.insert(tariff.id, tariff.clone());
        Ok(tariff)
    }

    /// Compare-and-swap on the bill's version under the entry lock.
    fn swap_bill(
        &self,
        bill: &Bill,
        expected_version: i32,
        new_items: &[BillLineItem],
    ) -> DomainResult<Bill> {
        let mut stored = self
            .bills
            .get_mut(&bill.id)
            .ok_or_else(|| DomainError::not_found("Bill", "id", bill.id))?;
        if stored.version != expected_version {
            return Err(stale(bill.id, expected_version, stored.version));
        }

        let mut updated = bill.clone();
        updated.charges.line_items = stored.charges.line_items.clone();
        updated.charges.line_items.extend_from_slice(new_items);
        updated.version = expected_version + 1;
        updated.updated_at = Utc::now();
        *stored = updated.clone();
        Ok(updated)
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn stale(bill_id: i32, expected: i32, actual: i32) -> DomainError {
    DomainError::Conflict(format!(
        "bill {bill_id} was modified concurrently (expected version {expected}, found {actual})"
    ))
}

impl RepositoryProvider for InMemoryStorage {
    fn tariffs(&self) -> &dyn TariffRepository {
        self
    }

    fn bills(&self) -> &dyn BillRepository {
        self
    }

    fn payments(&self) -> &dyn PaymentRepository {
        self
    }
}

#[async_trait]
impl TariffRepository for InMemoryStorage {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Tariff>> {
        Ok(self.tariffs.get(&id).map(|t| t.clone()))
    }

    async fn find_by_code(&self, code: &str) -> DomainResult<Option<Tariff>> {
        Ok(self
            .tariffs
            .iter()
            .find(|t| t.code == code)
            .map(|t| t.value().clone()))
    }

    async fn find_all(&self) -> DomainResult<Vec<Tariff>> {
        let mut all: Vec<Tariff> = self.tariffs.iter().map(|t| t.value().clone()).collect();
        all.sort_by_key(|t| t.id);
        Ok(all)
    }

    async fn find_by_connection_type(
        &self,
        connection_type: ConnectionType,
    ) -> DomainResult<Vec<Tariff>> {
        Ok(self.siblings(connection_type))
    }

    async fn find_slabs(&self, tariff_id: i32) -> DomainResult<Vec<Slab>> {
        let mut slabs = self
            .slabs
            .get(&tariff_id)
            .map(|s| s.clone())
            .unwrap_or_default();
        slabs.sort_by_key(|s| s.slab_number);
        Ok(slabs)
    }

    async fn save(&self, tariff: Tariff, slabs: Vec<Slab>) -> DomainResult<Tariff> {
        let _guard = self.lock()?;
        tariff.ensure_no_overlap(&self.siblings(tariff.connection_type))?;
        self.insert_tariff(tariff, slabs)
    }

    async fn supersede(
        &self,
        previous_id: i32,
        closes_on: NaiveDate,
        tariff: Tariff,
        slabs: Vec<Slab>,
    ) -> DomainResult<Tariff> {
        let _guard = self.lock()?;
        let mut previous = self
            .tariffs
            .get(&previous_id)
            .map(|t| t.clone())
            .ok_or_else(|| DomainError::not_found("Tariff", "id", previous_id))?;
        if closes_on <= previous.effective_from || !previous.is_effective_on(closes_on) {
            return Err(DomainError::Conflict(format!(
                "tariff '{}' no longer covers {closes_on}",
                previous.code
            )));
        }
        previous.effective_to = Some(closes_on);

        let siblings = self.siblings(tariff.connection_type);
        tariff.ensure_no_overlap(
            siblings
                .iter()
                .map(|t| if t.id == previous_id { &previous } else { t }),
        )?;

        let saved = self.insert_tariff(tariff, slabs)?;
        self.tariffs.insert(previous_id, previous);
        Ok(saved)
    }
}

#[async_trait]
impl BillRepository for InMemoryStorage {
    async fn save(&self, mut bill: Bill) -> DomainResult<Bill> {
        let _guard = self.lock()?;
        if self.bills.iter().any(|b| b.bill_number == bill.bill_number) {
            return Err(DomainError::Conflict(format!(
                "bill number '{}' already exists",
                bill.bill_number
            )));
        }
        bill.id = self.bill_counter.fetch_add(1, Ordering::SeqCst);
        self.bills.insert(bill.id, bill.clone());
        Ok(bill)
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Bill>> {
        Ok(self.bills.get(&id).map(|b| b.clone()))
    }

    async fn find_by_number(&self, bill_number: &str) -> DomainResult<Option<Bill>> {
        Ok(self
            .bills
            .iter()
            .find(|b| b.bill_number == bill_number)
            .map(|b| b.value().clone()))
    }

    async fn list(
        &self,
        filter: &BillFilter,
        page: u64,
        limit: u64,
    ) -> DomainResult<(Vec<Bill>, u64)> {
        let mut matching: Vec<Bill> = self
            .bills
            .iter()
            .filter(|b| filter.matches(b.value()))
            .map(|b| b.value().clone())
            .collect();
        matching.sort_by(|a, b| b.id.cmp(&a.id));

        let total = matching.len() as u64;
        let offset = page.saturating_sub(1).saturating_mul(limit) as usize;
        let items = matching
            .into_iter()
            .skip(offset)
            .take(limit as usize)
            .collect();
        Ok((items, total))
    }

    async fn count_numbered(&self, prefix: &str, year: i32) -> DomainResult<u64> {
        let stem = format!("{prefix}-{year}-");
        Ok(self
            .bills
            .iter()
            .filter(|b| b.bill_number.starts_with(&stem))
            .count() as u64)
    }

    async fn update_account(
        &self,
        bill: &Bill,
        expected_version: i32,
        new_items: &[BillLineItem],
    ) -> DomainResult<Bill> {
        self.swap_bill(bill, expected_version, new_items)
    }
}

#[async_trait]
impl PaymentRepository for InMemoryStorage {
    async fn record(
        &self,
        bill: &Bill,
        expected_version: i32,
        mut payment: Payment,
    ) -> DomainResult<(Bill, Payment)> {
        let updated = self.swap_bill(bill, expected_version, &[])?;
        payment.id = self.payment_counter.fetch_add(1, Ordering::SeqCst);
        self.payments.insert(payment.id, payment.clone());
        Ok((updated, payment))
    }

    async fn find_by_bill(&self, bill_id: i32) -> DomainResult<Vec<Payment>> {
        let mut payments: Vec<Payment> = self
            .payments
            .iter()
            .filter(|p| p.bill_id == bill_id)
            .map(|p| p.value().clone())
            .collect();
        payments.sort_by_key(|p| p.id);
        Ok(payments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bill::{BillCharges, BillReference, BillStatus};
    use crate::domain::tariff::BillingCycle;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tariff(code: &str) -> Tariff {
        Tariff {
            id: 0,
            code: code.into(),
            name: code.into(),
            description: None,
            connection_type: ConnectionType::Residential,
            effective_from: date(2024, 1, 1),
            effective_to: None,
            fixed_charge: dec!(10),
            minimum_charge: dec!(5),
            tax_percentage: dec!(15),
            currency: "SAR".into(),
            billing_cycle: BillingCycle::Monthly,
            supersedes: None,
            created_at: Utc::now(),
        }
    }

    fn bill(number: &str) -> Bill {
        let charges = BillCharges {
            consumption: dec!(10),
            energy_charges: dec!(1.80),
            fixed_charges: dec!(0),
            tax_amount: dec!(0),
            discount: dec!(0),
            minimum_charge_adjustment: dec!(0),
            previous_balance: dec!(0),
            late_fee: dec!(0),
            total_amount: dec!(1.80),
            line_items: vec![],
        };
        let reference = BillReference {
            customer_id: 1,
            meter_id: 1,
            tariff_id: 1,
            billing_period_start: date(2024, 4, 1),
            billing_period_end: date(2024, 4, 30),
            issue_date: date(2024, 5, 1),
            due_date: date(2024, 5, 15),
            previous_reading: dec!(0),
            current_reading: dec!(10),
        };
        Bill::issue(number.into(), reference, charges)
    }

    #[tokio::test]
    async fn duplicate_tariff_code_conflicts() {
        let store = InMemoryStorage::new();
        let slabs = vec![Slab::open_ended(1, dec!(0), dec!(0.18))];
        let saved = TariffRepository::save(&store, tariff("RES"), slabs.clone())
            .await
            .unwrap();
        assert_eq!(saved.id, 1);

        let mut commercial = tariff("RES");
        commercial.connection_type = ConnectionType::Commercial;
        let err = TariffRepository::save(&store, commercial, slabs)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn overlapping_range_is_rejected_on_save() {
        let store = InMemoryStorage::new();
        let slabs = vec![Slab::open_ended(1, dec!(0), dec!(0.18))];
        TariffRepository::save(&store, tariff("RES-A"), slabs.clone())
            .await
            .unwrap();

        let mut later = tariff("RES-B");
        later.effective_from = date(2024, 9, 1);
        let err = TariffRepository::save(&store, later, slabs).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(store.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn second_revision_of_same_snapshot_conflicts() {
        let store = InMemoryStorage::new();
        let slabs = vec![Slab::open_ended(1, dec!(0), dec!(0.18))];
        let first = TariffRepository::save(&store, tariff("RES-1"), slabs.clone())
            .await
            .unwrap();

        let mut july = tariff("RES-JUL");
        july.effective_from = date(2024, 7, 1);
        store
            .supersede(first.id, date(2024, 7, 1), july, slabs.clone())
            .await
            .unwrap();

        // A revision prepared against the still-open snapshot loses the race.
        let mut september = tariff("RES-SEP");
        september.effective_from = date(2024, 9, 1);
        let err = store
            .supersede(first.id, date(2024, 9, 1), september, slabs)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(store.find_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn supersede_closes_previous_range() {
        let store = InMemoryStorage::new();
        let slabs = vec![Slab::open_ended(1, dec!(0), dec!(0.18))];
        let first = TariffRepository::save(&store, tariff("RES-1"), slabs.clone())
            .await
            .unwrap();

        let mut next = tariff("RES-2");
        next.effective_from = date(2024, 7, 1);
        next.supersedes = Some(first.id);
        let second = store
            .supersede(first.id, date(2024, 7, 1), next, slabs)
            .await
            .unwrap();

        let closed = TariffRepository::find_by_id(&store, first.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(closed.effective_to, Some(date(2024, 7, 1)));
        assert_eq!(second.supersedes, Some(first.id));
    }

    #[tokio::test]
    async fn stale_version_is_rejected() {
        let store = InMemoryStorage::new();
        let saved = BillRepository::save(&store, bill("BILL-2024-000001"))
            .await
            .unwrap();

        let mut paid = saved.clone();
        paid.apply_payment(dec!(1.00)).unwrap();
        let updated = store.update_account(&paid, saved.version, &[]).await.unwrap();
        assert_eq!(updated.version, saved.version + 1);
        assert_eq!(updated.status, BillStatus::PartiallyPaid);

        let err = store
            .update_account(&paid, saved.version, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn list_paginates_newest_first() {
        let store = InMemoryStorage::new();
        for n in 1..=5 {
            BillRepository::save(&store, bill(&format!("BILL-2024-{n:06}")))
                .await
                .unwrap();
        }
        let (page, total) = store.list(&BillFilter::default(), 2, 2).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(page.iter().map(|b| b.id).collect::<Vec<_>>(), vec![3, 2]);
        assert_eq!(store.count_numbered("BILL", 2024).await.unwrap(), 5);
        assert_eq!(store.count_numbered("BILL", 2025).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn recorded_payment_is_listed_for_bill() {
        let store = InMemoryStorage::new();
        let saved = BillRepository::save(&store, bill("BILL-2024-000001"))
            .await
            .unwrap();
        let mut paid = saved.clone();
        paid.apply_payment(dec!(1.80)).unwrap();

        let payment = Payment::from_new(
            crate::domain::NewPayment {
                amount: dec!(1.80),
                method: crate::domain::PaymentMethod::Card,
                reference: None,
                notes: None,
                paid_at: None,
            },
            saved.id,
            1,
        );
        let (bill, payment) = store.record(&paid, saved.version, payment).await.unwrap();
        assert_eq!(bill.status, BillStatus::Paid);
        assert_eq!(store.find_by_bill(saved.id).await.unwrap(), vec![payment]);
    }
}
