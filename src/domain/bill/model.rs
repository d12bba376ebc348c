//! Bill domain entity

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::domain::{DomainError, DomainResult};

/// Kind of charge or adjustment on a bill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineItemType {
    /// Energy charged inside one slab
    EnergyCharge,
    FixedCharge,
    Tax,
    /// Negative amount
    Discount,
    LateFee,
    /// Lifts the subtotal up to the tariff's minimum charge
    MinimumChargeAdjustment,
    /// Balance carried from earlier bills (negative for a credit)
    PreviousBalance,
    Other,
}

impl LineItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EnergyCharge => "energy_charge",
            Self::FixedCharge => "fixed_charge",
            Self::Tax => "tax",
            Self::Discount => "discount",
            Self::LateFee => "late_fee",
            Self::MinimumChargeAdjustment => "minimum_charge_adjustment",
            Self::PreviousBalance => "previous_balance",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for LineItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LineItemType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "energy_charge" => Self::EnergyCharge,
            "fixed_charge" => Self::FixedCharge,
            "tax" => Self::Tax,
            "discount" => Self::Discount,
            "late_fee" => Self::LateFee,
            "minimum_charge_adjustment" => Self::MinimumChargeAdjustment,
            "previous_balance" => Self::PreviousBalance,
            "other" => Self::Other,
            other => {
                return Err(DomainError::Validation(format!(
                    "unknown line item type '{other}'"
                )))
            }
        })
    }
}

/// One charge or adjustment appearing on a bill
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillLineItem {
    pub item_type: LineItemType,
    pub description: String,
    /// Only energy items carry units, rate and slab number
    pub units: Option<Decimal>,
    pub rate: Option<Decimal>,
    pub slab_number: Option<u32>,
    /// Signed, money precision
    pub amount: Decimal,
}

impl BillLineItem {
    pub fn charge(item_type: LineItemType, description: impl Into<String>, amount: Decimal) -> Self {
        Self {
            item_type,
            description: description.into(),
            units: None,
            rate: None,
            slab_number: None,
            amount,
        }
    }
}

/// Computed charges of a bill.
///
/// `total_amount` equals the sum of the line item amounts, and equals
/// `energy + fixed + tax − discount + minimum_charge_adjustment +
/// previous_balance + late_fee`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillCharges {
    pub consumption: Decimal,
    pub energy_charges: Decimal,
    pub fixed_charges: Decimal,
    pub tax_amount: Decimal,
    pub discount: Decimal,
    pub minimum_charge_adjustment: Decimal,
    pub previous_balance: Decimal,
    pub late_fee: Decimal,
    pub total_amount: Decimal,
    pub line_items: Vec<BillLineItem>,
}

impl BillCharges {
    pub fn line_items_total(&self) -> Decimal {
        self.line_items.iter().map(|i| i.amount).sum()
    }

    pub fn has_late_fee(&self) -> bool {
        self.line_items
            .iter()
            .any(|i| i.item_type == LineItemType::LateFee)
    }
}

/// Lifecycle status of a bill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BillStatus {
    Pending,
    PartiallyPaid,
    Paid,
    Overdue,
    Cancelled,
}

impl Default for BillStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl BillStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::PartiallyPaid => "partially_paid",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether the bill still accepts payments
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::PartiallyPaid | Self::Overdue)
    }
}

impl std::fmt::Display for BillStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "partially_paid" => Ok(Self::PartiallyPaid),
            "paid" => Ok(Self::Paid),
            "overdue" => Ok(Self::Overdue),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(DomainError::Validation(format!("unknown bill status '{other}'"))),
        }
    }
}

/// Who and what a bill is for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillReference {
    pub customer_id: i32,
    pub meter_id: i32,
    pub tariff_id: i32,
    pub billing_period_start: NaiveDate,
    pub billing_period_end: NaiveDate,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub previous_reading: Decimal,
    pub current_reading: Decimal,
}

/// An issued bill
#[derive(Debug, Clone, PartialEq)]
pub struct Bill {
    pub id: i32,
    pub bill_number: String,
    pub reference: BillReference,
    pub charges: BillCharges,
    pub paid_amount: Decimal,
    pub remaining_amount: Decimal,
    pub status: BillStatus,
    /// Bumped by the repository on every account update
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bill {
    /// A freshly issued bill owes its whole total. Nothing is owed when a
    /// credit balance covers the total, so such a bill is issued paid.
    pub fn issue(bill_number: String, reference: BillReference, charges: BillCharges) -> Self {
        let now = Utc::now();
        let status = if charges.total_amount <= Decimal::ZERO {
            BillStatus::Paid
        } else {
            BillStatus::Pending
        };
        Self {
            id: 0,
            bill_number,
            reference,
            remaining_amount: charges.total_amount,
            paid_amount: Decimal::ZERO,
            charges,
            status,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn total_amount(&self) -> Decimal {
        self.charges.total_amount
    }

    pub fn is_overdue(&self, as_of: NaiveDate) -> bool {
        self.status.is_open()
            && self.remaining_amount > Decimal::ZERO
            && as_of > self.reference.due_date
    }

    /// Reduce the outstanding amount by `amount`.
    pub fn apply_payment(&mut self, amount: Decimal) -> DomainResult<()> {
        if amount <= Decimal::ZERO {
            return Err(DomainError::Validation(
                "payment amount must be positive".into(),
            ));
        }
        if !self.status.is_open() {
            return Err(DomainError::Validation(format!(
                "bill {} is {} and does not accept payments",
                self.bill_number, self.status
            )));
        }
        if amount > self.remaining_amount {
            return Err(DomainError::Validation(format!(
                "payment {amount} exceeds remaining amount {}",
                self.remaining_amount
            )));
        }

        self.paid_amount += amount;
        self.remaining_amount -= amount;
        self.status = if self.remaining_amount.is_zero() {
            BillStatus::Paid
        } else {
            BillStatus::PartiallyPaid
        };
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Void an open bill that has not been paid against. Returns `false`
    /// when the bill was already cancelled.
    pub fn cancel(&mut self) -> DomainResult<bool> {
        if self.status == BillStatus::Cancelled {
            return Ok(false);
        }
        if !self.status.is_open() || !self.paid_amount.is_zero() {
            return Err(DomainError::Validation(format!(
                "bill {} is {} with {} paid and cannot be cancelled",
                self.bill_number, self.status, self.paid_amount
            )));
        }
        self.remaining_amount = Decimal::ZERO;
        self.status = BillStatus::Cancelled;
        self.updated_at = Utc::now();
        Ok(true)
    }

    /// Add a late fee to an overdue bill. Returns the new line item, or
    /// `None` when the bill is not overdue or already carries a late fee.
    pub fn apply_late_fee(&mut self, fee: Decimal, as_of: NaiveDate) -> Option<BillLineItem> {
        if fee <= Decimal::ZERO || !self.is_overdue(as_of) || self.charges.has_late_fee() {
            return None;
        }

        let item = BillLineItem::charge(
            LineItemType::LateFee,
            format!("Late payment fee (due {})", self.reference.due_date),
            fee,
        );
        self.charges.line_items.push(item.clone());
        self.charges.late_fee += fee;
        self.charges.total_amount += fee;
        self.remaining_amount += fee;
        self.status = BillStatus::Overdue;
        self.updated_at = Utc::now();
        Some(item)
    }
}

/// Query filter for bill listings
#[derive(Debug, Clone, Default)]
pub struct BillFilter {
    pub customer_id: Option<i32>,
    pub meter_id: Option<i32>,
    pub status: Option<BillStatus>,
}

impl BillFilter {
    pub fn matches(&self, bill: &Bill) -> bool {
        self.customer_id.map_or(true, |c| bill.reference.customer_id == c)
            && self.meter_id.map_or(true, |m| bill.reference.meter_id == m)
            && self.status.map_or(true, |s| bill.status == s)
    }
}

// ── Tests ──────────────────────────────────────────────────────
