//! Database entities module

pub mod bill;
pub mod bill_item;
pub mod payment;
pub mod tariff;
pub mod tariff_slab;

pub use bill::Entity as Bill;
pub use bill_item::Entity as BillItem;
pub use payment::Entity as Payment;
pub use tariff::Entity as Tariff;
pub use tariff_slab::Entity as TariffSlab;
