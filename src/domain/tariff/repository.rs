//! Tariff repository interface

use async_trait::async_trait;
use chrono::NaiveDate;

use super::model::{ConnectionType, Tariff};
use super::slab::Slab;
use crate::domain::DomainResult;

#[async_trait]
pub trait TariffRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Tariff>>;
    async fn find_by_code(&self, code: &str) -> DomainResult<Option<Tariff>>;
    async fn find_all(&self) -> DomainResult<Vec<Tariff>>;
    async fn find_by_connection_type(
        &self,
        connection_type: ConnectionType,
    ) -> DomainResult<Vec<Tariff>>;
    /// Slabs of a tariff ordered by slab number; empty if none are stored.
    async fn find_slabs(&self, tariff_id: i32) -> DomainResult<Vec<Slab>>;
    /// Insert a snapshot and its slabs; returns the snapshot with its id.
    async fn save(&self, tariff: Tariff, slabs: Vec<Slab>) -> DomainResult<Tariff>;
    /// Atomically close `previous_id` at `closes_on` and insert its successor.
    async fn supersede(
        &self,
        previous_id: i32,
        closes_on: NaiveDate,
        tariff: Tariff,
        slabs: Vec<Slab>,
    ) -> DomainResult<Tariff>;
}
