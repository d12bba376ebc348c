//! Bill and payment DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::application::BillingCycleEvent;
use crate::domain::{Bill, BillCharges, BillLineItem, DomainResult, Payment};

use crate::interfaces::http::common::{default_limit, default_page};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LineItemDto {
    /// energy_charge, fixed_charge, tax, discount, late_fee, ...
    pub item_type: String,
    pub description: String,
    #[schema(value_type = Option<String>)]
    pub units: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub rate: Option<Decimal>,
    pub slab_number: Option<u32>,
    /// Signed: discounts and credits are negative
    #[schema(value_type = String)]
    pub amount: Decimal,
}

impl From<BillLineItem> for LineItemDto {
    fn from(i: BillLineItem) -> Self {
        Self {
            item_type: i.item_type.to_string(),
            description: i.description,
            units: i.units,
            rate: i.rate,
            slab_number: i.slab_number,
            amount: i.amount,
        }
    }
}

/// Itemised charges of a bill or preview
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChargesResponse {
    #[schema(value_type = String)]
    pub consumption: Decimal,
    #[schema(value_type = String)]
    pub energy_charges: Decimal,
    #[schema(value_type = String)]
    pub fixed_charges: Decimal,
    #[schema(value_type = String)]
    pub tax_amount: Decimal,
    #[schema(value_type = String)]
    pub discount: Decimal,
    #[schema(value_type = String)]
    pub minimum_charge_adjustment: Decimal,
    #[schema(value_type = String)]
    pub previous_balance: Decimal,
    #[schema(value_type = String)]
    pub late_fee: Decimal,
    #[schema(value_type = String)]
    pub total_amount: Decimal,
    pub line_items: Vec<LineItemDto>,
}

impl From<BillCharges> for ChargesResponse {
    fn from(c: BillCharges) -> Self {
        Self {
            consumption: c.consumption,
            energy_charges: c.energy_charges,
            fixed_charges: c.fixed_charges,
            tax_amount: c.tax_amount,
            discount: c.discount,
            minimum_charge_adjustment: c.minimum_charge_adjustment,
            previous_balance: c.previous_balance,
            late_fee: c.late_fee,
            total_amount: c.total_amount,
            line_items: c.line_items.into_iter().map(LineItemDto::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BillResponse {
    pub id: i32,
    pub bill_number: String,
    pub customer_id: i32,
    pub meter_id: i32,
    pub tariff_id: i32,
    pub billing_period_start: NaiveDate,
    pub billing_period_end: NaiveDate,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    #[schema(value_type = String)]
    pub previous_reading: Decimal,
    #[schema(value_type = String)]
    pub current_reading: Decimal,
    pub charges: ChargesResponse,
    #[schema(value_type = String)]
    pub paid_amount: Decimal,
    #[schema(value_type = String)]
    pub remaining_amount: Decimal,
    /// pending, partially_paid, paid, overdue or cancelled
    pub status: String,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Bill> for BillResponse {
    fn from(b: Bill) -> Self {
        let r = b.reference;
        Self {
            id: b.id,
            bill_number: b.bill_number,
            customer_id: r.customer_id,
            meter_id: r.meter_id,
            tariff_id: r.tariff_id,
            billing_period_start: r.billing_period_start,
            billing_period_end: r.billing_period_end,
            issue_date: r.issue_date,
            due_date: r.due_date,
            previous_reading: r.previous_reading,
            current_reading: r.current_reading,
            charges: b.charges.into(),
            paid_amount: b.paid_amount,
            remaining_amount: b.remaining_amount,
            status: b.status.to_string(),
            version: b.version,
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}

/// A closed billing period to rate and bill
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct IssueBillRequest {
    #[validate(range(min = 1, message = "customer_id must be positive"))]
    pub customer_id: i32,
    #[validate(range(min = 1, message = "meter_id must be positive"))]
    pub meter_id: i32,
    /// Used to find the effective tariff when `tariff_id` is omitted
    pub connection_type: String,
    pub tariff_id: Option<i32>,
    pub billing_period_start: NaiveDate,
    pub billing_period_end: NaiveDate,
    #[schema(value_type = String, example = "1200")]
    pub previous_reading: Decimal,
    #[schema(value_type = String, example = "1450")]
    pub current_reading: Decimal,
    #[schema(value_type = Option<String>)]
    pub rollover_at: Option<Decimal>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub previous_balance: Decimal,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub discount: Decimal,
    /// Defaults to today
    pub issue_date: Option<NaiveDate>,
    /// Defaults to issue date + configured due days
    pub due_date: Option<NaiveDate>,
}

impl IssueBillRequest {
    pub fn into_cycle(self) -> DomainResult<BillingCycleEvent> {
        Ok(BillingCycleEvent {
            customer_id: self.customer_id,
            meter_id: self.meter_id,
            connection_type: self.connection_type.parse()?,
            tariff_id: self.tariff_id,
            billing_period_start: self.billing_period_start,
            billing_period_end: self.billing_period_end,
            previous_reading: self.previous_reading,
            current_reading: self.current_reading,
            rollover_at: self.rollover_at,
            previous_balance: self.previous_balance,
            discount: self.discount,
            issue_date: self.issue_date,
            due_date: self.due_date,
        })
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct BillListQuery {
    pub customer_id: Option<i32>,
    pub meter_id: Option<i32>,
    /// pending, partially_paid, paid, overdue or cancelled
    pub status: Option<String>,
    #[serde(default = "default_page")]
    pub page: u64,
    /// 1-100, default 50
    #[serde(default = "default_limit")]
    pub limit: u64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RecordPaymentRequest {
    #[schema(value_type = String, example = "40.00")]
    pub amount: Decimal,
    /// cash, card, bank_transfer, mobile_payment, online or check
    pub method: String,
    #[validate(length(max = 100))]
    pub reference: Option<String>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
    /// Defaults to now
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentResponse {
    pub id: i32,
    pub payment_number: String,
    pub bill_id: i32,
    pub customer_id: i32,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub method: String,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub paid_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<Payment> for PaymentResponse {
    fn from(p: Payment) -> Self {
        Self {
            id: p.id,
            payment_number: p.payment_number,
            bill_id: p.bill_id,
            customer_id: p.customer_id,
            amount: p.amount,
            method: p.method.to_string(),
            reference: p.reference,
            notes: p.notes,
            paid_at: p.paid_at,
            created_at: p.created_at,
        }
    }
}

/// The stored payment and the bill as it stands afterwards
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentReceipt {
    pub payment: PaymentResponse,
    pub bill: BillResponse,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct LateFeeQuery {
    /// Date the bill is assessed on; defaults to today
    pub as_of: Option<NaiveDate>,
}
