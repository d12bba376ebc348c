pub mod bill;
pub mod consumption;
pub mod events;
pub mod payment;
pub mod rating;
pub mod repositories;
pub mod tariff;

// Re-export commonly used types
pub use bill::{Bill, BillCharges, BillLineItem, BillStatus, LineItemType};
pub use consumption::Consumption;
pub use payment::{NewPayment, Payment, PaymentMethod};
pub use repositories::{DomainResult, RepositoryProvider};
pub use tariff::{ConnectionType, Slab, SlabTable, Tariff};

// Re-export DomainError from support for convenience
pub use crate::support::errors::DomainError;
