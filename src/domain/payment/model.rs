//! Payment domain entity

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
    MobilePayment,
    Online,
    Check,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
            Self::BankTransfer => "bank_transfer",
            Self::MobilePayment => "mobile_payment",
            Self::Online => "online",
            Self::Check => "check",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash),
            "card" => Ok(Self::Card),
            "bank_transfer" => Ok(Self::BankTransfer),
            "mobile_payment" => Ok(Self::MobilePayment),
            "online" => Ok(Self::Online),
            "check" => Ok(Self::Check),
            other => Err(DomainError::Validation(format!(
                "unknown payment method '{other}'"
            ))),
        }
    }
}

/// A payment received against one bill
#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    pub id: i32,
    pub payment_number: String,
    pub bill_id: i32,
    pub customer_id: i32,
    pub amount: Decimal,
    pub method: PaymentMethod,
    /// Bank or gateway reference, if any
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub paid_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Payment as submitted by a cashier or gateway
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Payment {
    /// Payment numbers look like `PAY-3F2A9C1B7D04`.
    pub fn generate_number() -> String {
        let id = Uuid::new_v4().simple().to_string().to_uppercase();
        format!("PAY-{}", &id[..12])
    }

    pub fn from_new(new: NewPayment, bill_id: i32, customer_id: i32) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            payment_number: Self::generate_number(),
            bill_id,
            customer_id,
            amount: new.amount,
            method: new.method,
            reference: new.reference,
            notes: new.notes,
            paid_at: new.paid_at.unwrap_or(now),
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn payment_number_format() {
        let n = Payment::generate_number();
        assert!(n.starts_with("PAY-"));
        assert_eq!(n.len(), 16);
        assert_ne!(n, Payment::generate_number());
    }

    #[test]
    fn from_new_defaults_paid_at() {
        let p = Payment::from_new(
            NewPayment {
                amount: dec!(20),
                method: PaymentMethod::Cash,
                reference: None,
                notes: None,
                paid_at: None,
            },
            4,
            9,
        );
        assert_eq!(p.bill_id, 4);
        assert_eq!(p.customer_id, 9);
        assert_eq!(p.paid_at, p.created_at);
    }

    #[test]
    fn method_parsing() {
        assert_eq!(
            "bank_transfer".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::BankTransfer
        );
        assert!("barter".parse::<PaymentMethod>().is_err());
    }
}
