//! Tariff aggregate
//!
//! Tariff snapshots, their slab tables, and the repository port.

pub mod model;
pub mod repository;
pub mod slab;

pub use model::{BillingCycle, ConnectionType, NewTariff, Tariff, TariffRevision};
pub use repository::TariffRepository;
pub use slab::{validate as validate_slabs, Slab, SlabTable};
