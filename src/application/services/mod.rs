//! Application services

mod billing;
mod tariff;

pub use billing::{BillingCycleEvent, BillingService, BillingSettings};
pub use tariff::TariffService;
