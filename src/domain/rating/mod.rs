//! Tiered rating and bill composition
//!
//! Pure and synchronous: slab tables in, charges out.

pub mod composer;
pub mod money;
pub mod resolver;

pub use composer::compose;
pub use money::{
    percentage_of, round_money, round_rate, MAX_AMOUNT, MAX_RATE, MAX_UNITS, MONEY_SCALE, RATE_SCALE,
};
pub use resolver::{rate, EnergyCharge, SlabCharge};
