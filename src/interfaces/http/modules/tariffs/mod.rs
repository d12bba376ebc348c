//! Tariff snapshots: definition, revision, effective lookup and previews

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
