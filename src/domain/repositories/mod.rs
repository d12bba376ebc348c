//! Repository traits for the domain layer
//!
//! Contains:
//! - `RepositoryProvider`: unified access to all per-aggregate repositories
//! - `DomainResult`: standard result type for domain operations

use super::bill::BillRepository;
use super::payment::PaymentRepository;
use super::tariff::TariffRepository;
use crate::support::errors::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Provides access to all domain repositories.
///
/// Consumers request only the repository they need:
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let tariff = repos.tariffs().find_by_code("RES-2024").await?;
///     let bill = repos.bills().find_by_id(42).await?;
/// }
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn tariffs(&self) -> &dyn TariffRepository;
    fn bills(&self) -> &dyn BillRepository;
    fn payments(&self) -> &dyn PaymentRepository;
}
