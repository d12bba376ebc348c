//! Bill aggregate
//!
//! Issued bills, their charges and line items, and the repository port.

pub mod model;
pub mod repository;

pub use model::{
    Bill, BillCharges, BillFilter, BillLineItem, BillReference, BillStatus, LineItemType,
};
pub use repository::BillRepository;
