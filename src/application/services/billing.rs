//! Billing service: bill issuance, payments and late fees

use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, info};

use super::tariff::TariffService;
use crate::application::events::{
    BillCancelledEvent, BillIssuedEvent, Event, LateFeeAppliedEvent, PaymentRecordedEvent,
    SharedEventBus,
};
use crate::domain::bill::{Bill, BillFilter, BillReference};
use crate::domain::rating::compose;
use crate::domain::tariff::ConnectionType;
use crate::domain::{
    Consumption, DomainError, DomainResult, NewPayment, Payment, RepositoryProvider,
};
use crate::support::{retry_on_conflict, RetryConfig};

/// Billing rules that come from configuration
#[derive(Debug, Clone)]
pub struct BillingSettings {
    pub bill_number_prefix: String,
    /// Days between issue date and due date
    pub due_days: u32,
    /// Flat fee added once to an overdue bill
    pub late_fee: Decimal,
    /// Attempts for payment and late-fee writes that lose a version race
    pub retry_attempts: u32,
}

impl Default for BillingSettings {
    fn default() -> Self {
        Self {
            bill_number_prefix: "BILL".to_string(),
            due_days: 14,
            late_fee: Decimal::from(50),
            retry_attempts: 3,
        }
    }
}

/// A meter's readings for one closed billing period
#[derive(Debug, Clone)]
pub struct BillingCycleEvent {
    pub customer_id: i32,
    pub meter_id: i32,
    pub connection_type: ConnectionType,
    /// Bill against this tariff instead of the one effective at period end
    pub tariff_id: Option<i32>,
    pub billing_period_start: NaiveDate,
    pub billing_period_end: NaiveDate,
    pub previous_reading: Decimal,
    pub current_reading: Decimal,
    /// Register capacity, when the meter wrapped during the period
    pub rollover_at: Option<Decimal>,
    pub previous_balance: Decimal,
    pub discount: Decimal,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

/// Service for billing operations
pub struct BillingService {
    repos: Arc<dyn RepositoryProvider>,
    tariffs: Arc<TariffService>,
    event_bus: SharedEventBus,
    settings: BillingSettings,
}

impl BillingService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        tariffs: Arc<TariffService>,
        event_bus: SharedEventBus,
        settings: BillingSettings,
    ) -> Self {
        Self {
            repos,
            tariffs,
            event_bus,
            settings,
        }
    }

    fn retry_config(&self) -> RetryConfig {
        RetryConfig::with_attempts(self.settings.retry_attempts)
    }

    /// Rate a closed billing period and issue its bill.
    ///
    /// Nothing is stored unless every step succeeds.
    pub async fn issue_bill(&self, cycle: BillingCycleEvent) -> DomainResult<Bill> {
        if cycle.billing_period_end < cycle.billing_period_start {
            return Err(DomainError::Validation(format!(
                "billing period ends ({}) before it starts ({})",
                cycle.billing_period_end, cycle.billing_period_start
            )));
        }

        let mut consumption = Consumption::new(cycle.previous_reading, cycle.current_reading)?;
        if let Some(capacity) = cycle.rollover_at {
            consumption = consumption.with_rollover(capacity)?;
        }

        let tariff = match cycle.tariff_id {
            Some(id) => self.tariffs.get(id).await?,
            None => {
                self.tariffs
                    .effective_for(cycle.connection_type, cycle.billing_period_end)
                    .await?
            }
        };
        let table = self.tariffs.load_slabs(tariff.id).await?;
        let charges = compose(
            &consumption,
            &tariff,
            &table,
            cycle.previous_balance,
            cycle.discount,
        )?;

        let issue_date = cycle.issue_date.unwrap_or_else(|| Utc::now().date_naive());
        let due_date = cycle
            .due_date
            .unwrap_or(issue_date + Duration::days(i64::from(self.settings.due_days)));
        if due_date < issue_date {
            return Err(DomainError::Validation(format!(
                "due date {due_date} is before issue date {issue_date}"
            )));
        }

        let reference = BillReference {
            customer_id: cycle.customer_id,
            meter_id: cycle.meter_id,
            tariff_id: tariff.id,
            billing_period_start: cycle.billing_period_start,
            billing_period_end: cycle.billing_period_end,
            issue_date,
            due_date,
            previous_reading: cycle.previous_reading,
            current_reading: cycle.current_reading,
        };

        // Two concurrent issuances can pick the same number; the loser retries.
        let bill = retry_on_conflict(
            self.retry_config(),
            || {
                let reference = reference.clone();
                let charges = charges.clone();
                async move {
                    let number = self.next_bill_number(issue_date.year()).await?;
                    self.repos
                        .bills()
                        .save(Bill::issue(number, reference, charges))
                        .await
                }
            },
            "issue_bill",
        )
        .await?;

        metrics::counter!("bills_issued_total", "connection_type" => tariff.connection_type.as_str())
            .increment(1);
        metrics::histogram!("bill_total_amount")
            .record(bill.total_amount().to_f64().unwrap_or_default());

        info!(
            bill_id = bill.id,
            bill_number = %bill.bill_number,
            customer_id = bill.reference.customer_id,
            tariff = %tariff.code,
            units = %bill.charges.consumption,
            total = %tariff.format_amount(bill.total_amount()),
            "Bill issued"
        );
        self.event_bus.publish(Event::BillIssued(BillIssuedEvent {
            bill_id: bill.id,
            bill_number: bill.bill_number.clone(),
            customer_id: bill.reference.customer_id,
            total_amount: bill.total_amount(),
            due_date: bill.reference.due_date,
        }));

        Ok(bill)
    }

    async fn next_bill_number(&self, year: i32) -> DomainResult<String> {
        let prefix = &self.settings.bill_number_prefix;
        let issued = self.repos.bills().count_numbered(prefix, year).await?;
        Ok(format!("{prefix}-{year}-{:06}", issued + 1))
    }

    /// Record a payment against a bill.
    pub async fn record_payment(
        &self,
        bill_id: i32,
        new: NewPayment,
    ) -> DomainResult<(Bill, Payment)> {
        let (bill, payment) = retry_on_conflict(
            self.retry_config(),
            || self.try_record_payment(bill_id, new.clone()),
            "record_payment",
        )
        .await?;

        metrics::counter!("payments_recorded_total", "method" => payment.method.as_str())
            .increment(1);
        info!(
            bill_id,
            payment_number = %payment.payment_number,
            amount = %payment.amount,
            remaining = %bill.remaining_amount,
            status = %bill.status,
            "Payment recorded"
        );
        self.event_bus.publish(Event::PaymentRecorded(PaymentRecordedEvent {
            payment_id: payment.id,
            payment_number: payment.payment_number.clone(),
            bill_id,
            customer_id: payment.customer_id,
            amount: payment.amount,
            remaining_amount: bill.remaining_amount,
            bill_status: bill.status.to_string(),
        }));

        Ok((bill, payment))
    }

    async fn try_record_payment(
        &self,
        bill_id: i32,
        new: NewPayment,
    ) -> DomainResult<(Bill, Payment)> {
        let mut bill = self.get_bill(bill_id).await?;
        let expected_version = bill.version;
        bill.apply_payment(new.amount)?;

        let payment = Payment::from_new(new, bill.id, bill.reference.customer_id);
        self.repos
            .payments()
            .record(&bill, expected_version, payment)
            .await
    }

    /// Add the configured late fee to a bill that is overdue on `as_of`.
    /// Calling it again for the same bill changes nothing.
    pub async fn apply_late_fee(&self, bill_id: i32, as_of: NaiveDate) -> DomainResult<Bill> {
        let (bill, applied) = retry_on_conflict(
            self.retry_config(),
            || self.try_apply_late_fee(bill_id, as_of),
            "apply_late_fee",
        )
        .await?;

        if !applied {
            debug!(bill_id, %as_of, "No late fee applied");
            return Ok(bill);
        }

        info!(
            bill_id,
            bill_number = %bill.bill_number,
            late_fee = %bill.charges.late_fee,
            total = %bill.total_amount(),
            "Late fee applied"
        );
        self.event_bus.publish(Event::LateFeeApplied(LateFeeAppliedEvent {
            bill_id,
            bill_number: bill.bill_number.clone(),
            customer_id: bill.reference.customer_id,
            late_fee: bill.charges.late_fee,
            total_amount: bill.total_amount(),
        }));

        Ok(bill)
    }

    async fn try_apply_late_fee(&self, bill_id: i32, as_of: NaiveDate) -> DomainResult<(Bill, bool)> {
        let mut bill = self.get_bill(bill_id).await?;
        let expected_version = bill.version;

        match bill.apply_late_fee(self.settings.late_fee, as_of) {
            Some(item) => {
                let updated = self
                    .repos
                    .bills()
                    .update_account(&bill, expected_version, &[item])
                    .await?;
                Ok((updated, true))
            }
            None => Ok((bill, false)),
        }
    }

    /// Void an unpaid bill. Cancelling a cancelled bill changes nothing.
    pub async fn cancel_bill(&self, bill_id: i32) -> DomainResult<Bill> {
        let (bill, cancelled) = retry_on_conflict(
            self.retry_config(),
            || self.try_cancel_bill(bill_id),
            "cancel_bill",
        )
        .await?;

        if !cancelled {
            debug!(bill_id, "Bill already cancelled");
            return Ok(bill);
        }

        metrics::counter!("bills_cancelled_total").increment(1);
        info!(
            bill_id,
            bill_number = %bill.bill_number,
            customer_id = bill.reference.customer_id,
            "Bill cancelled"
        );
        self.event_bus.publish(Event::BillCancelled(BillCancelledEvent {
            bill_id,
            bill_number: bill.bill_number.clone(),
            customer_id: bill.reference.customer_id,
            cancelled_amount: bill.total_amount(),
        }));

        Ok(bill)
    }

    async fn try_cancel_bill(&self, bill_id: i32) -> DomainResult<(Bill, bool)> {
        let mut bill = self.get_bill(bill_id).await?;
        let expected_version = bill.version;

        if !bill.cancel()? {
            return Ok((bill, false));
        }
        let updated = self
            .repos
            .bills()
            .update_account(&bill, expected_version, &[])
            .await?;
        Ok((updated, true))
    }

    pub async fn get_bill(&self, id: i32) -> DomainResult<Bill> {
        self.repos
            .bills()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Bill", "id", id))
    }

    pub async fn list_bills(
        &self,
        filter: &BillFilter,
        page: u64,
        limit: u64,
    ) -> DomainResult<(Vec<Bill>, u64)> {
        self.repos
            .bills()
            .list(filter, page.max(1), limit.clamp(1, 100))
            .await
    }

    pub async fn list_payments(&self, bill_id: i32) -> DomainResult<Vec<Payment>> {
        self.get_bill(bill_id).await?;
        self.repos.payments().find_by_bill(bill_id).await
    }
}

// ── Tests ──────────────────────────────────────────────────────
