//! Notification events
//!
//! Facts published after a billing operation has been persisted.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Event types for notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    BillIssued(BillIssuedEvent),
    PaymentRecorded(PaymentRecordedEvent),
    LateFeeApplied(LateFeeAppliedEvent),
    BillCancelled(BillCancelledEvent),
    TariffDefined(TariffDefinedEvent),
    TariffRevised(TariffRevisedEvent),
}

impl Event {
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::BillIssued(_) => "bill_issued",
            Event::PaymentRecorded(_) => "payment_recorded",
            Event::LateFeeApplied(_) => "late_fee_applied",
            Event::BillCancelled(_) => "bill_cancelled",
            Event::TariffDefined(_) => "tariff_defined",
            Event::TariffRevised(_) => "tariff_revised",
        }
    }

    /// Customer the event concerns, if any
    pub fn customer_id(&self) -> Option<i32> {
        match self {
            Event::BillIssued(e) => Some(e.customer_id),
            Event::PaymentRecorded(e) => Some(e.customer_id),
            Event::LateFeeApplied(e) => Some(e.customer_id),
            Event::BillCancelled(e) => Some(e.customer_id),
            Event::TariffDefined(_) | Event::TariffRevised(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillIssuedEvent {
    pub bill_id: i32,
    pub bill_number: String,
    pub customer_id: i32,
    pub total_amount: Decimal,
    pub due_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecordedEvent {
    pub payment_id: i32,
    pub payment_number: String,
    pub bill_id: i32,
    pub customer_id: i32,
    pub amount: Decimal,
    pub remaining_amount: Decimal,
    pub bill_status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LateFeeAppliedEvent {
    pub bill_id: i32,
    pub bill_number: String,
    pub customer_id: i32,
    pub late_fee: Decimal,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillCancelledEvent {
    pub bill_id: i32,
    pub bill_number: String,
    pub customer_id: i32,
    /// Total that no longer has to be paid
    pub cancelled_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TariffDefinedEvent {
    pub tariff_id: i32,
    pub code: String,
    pub connection_type: String,
    pub effective_from: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TariffRevisedEvent {
    pub tariff_id: i32,
    pub supersedes: i32,
    pub code: String,
    pub effective_from: NaiveDate,
}

/// Event envelope with id and publication time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: Event,
}

impl EventMessage {
    pub fn new(event: Event) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn serializes_with_type_tag() {
        let msg = EventMessage::new(Event::BillIssued(BillIssuedEvent {
            bill_id: 1,
            bill_number: "BILL-2024-000001".into(),
            customer_id: 7,
            total_amount: dec!(83.95),
            due_date: NaiveDate::from_ymd_opt(2024, 5, 15).unwrap(),
        }));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "BillIssued");
        assert_eq!(json["data"]["total_amount"], "83.95");
        assert_eq!(msg.event.customer_id(), Some(7));
    }
}
