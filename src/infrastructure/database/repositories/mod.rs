//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories + unified RepositoryProvider.

mod mapping;

pub mod bill_repository;
pub mod payment_repository;
pub mod repository_provider;
pub mod tariff_repository;

pub use repository_provider::SeaOrmRepositoryProvider;
