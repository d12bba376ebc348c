//! Tariff service: definition, versioning and lookup of tariff snapshots

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::application::events::{Event, SharedEventBus, TariffDefinedEvent, TariffRevisedEvent};
use crate::domain::rating::compose;
use crate::domain::tariff::{ConnectionType, NewTariff, SlabTable, Tariff, TariffRevision};
use crate::domain::{BillCharges, Consumption, DomainError, DomainResult, RepositoryProvider};

/// Service for tariff operations
pub struct TariffService {
    repos: Arc<dyn RepositoryProvider>,
    event_bus: SharedEventBus,
}

impl TariffService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, event_bus: SharedEventBus) -> Self {
        Self { repos, event_bus }
    }

    /// Validate and store a new tariff with its slabs.
    pub async fn define(&self, new: NewTariff) -> DomainResult<Tariff> {
        let (tariff, slabs) = new.into_parts(None);
        tariff.validate()?;
        let table = SlabTable::new(slabs)?;

        // Code uniqueness and range overlap are checked by the repository
        // in the same critical section as the insert.
        let saved = self
            .repos
            .tariffs()
            .save(tariff, table.into_slabs())
            .await?;

        info!(
            tariff_id = saved.id,
            code = %saved.code,
            connection_type = %saved.connection_type,
            effective_from = %saved.effective_from,
            "Tariff defined"
        );
        self.event_bus.publish(Event::TariffDefined(TariffDefinedEvent {
            tariff_id: saved.id,
            code: saved.code.clone(),
            connection_type: saved.connection_type.to_string(),
            effective_from: saved.effective_from,
        }));

        Ok(saved)
    }

    pub async fn get(&self, id: i32) -> DomainResult<Tariff> {
        self.repos
            .tariffs()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Tariff", "id", id))
    }

    pub async fn list(&self) -> DomainResult<Vec<Tariff>> {
        self.repos.tariffs().find_all().await
    }

    /// Load and validate the slab table of a stored tariff.
    pub async fn load_slabs(&self, tariff_id: i32) -> DomainResult<SlabTable> {
        self.get(tariff_id).await?;
        let slabs = self.repos.tariffs().find_slabs(tariff_id).await?;
        if slabs.is_empty() {
            return Err(DomainError::not_found("TariffSlab", "tariff_id", tariff_id));
        }
        SlabTable::new(slabs).map_err(|e| {
            warn!(tariff_id, error = %e, "Stored slab table is invalid");
            e
        })
    }

    /// The single snapshot of `connection_type` effective on `date`.
    pub async fn effective_for(
        &self,
        connection_type: ConnectionType,
        date: NaiveDate,
    ) -> DomainResult<Tariff> {
        let mut effective: Vec<Tariff> = self
            .repos
            .tariffs()
            .find_by_connection_type(connection_type)
            .await?
            .into_iter()
            .filter(|t| t.is_effective_on(date))
            .collect();

        match effective.len() {
            0 => Err(DomainError::not_found(
                "Tariff",
                "effective_on",
                format!("{connection_type}@{date}"),
            )),
            1 => Ok(effective.remove(0)),
            n => {
                let codes: Vec<&str> = effective.iter().map(|t| t.code.as_str()).collect();
                Err(DomainError::Conflict(format!(
                    "{n} {connection_type} tariffs are effective on {date}: {}",
                    codes.join(", ")
                )))
            }
        }
    }

    /// Replace a tariff from `revision.effective_from` on with a new snapshot.
    /// The current snapshot keeps its rates and has its range closed.
    pub async fn revise(&self, id: i32, revision: TariffRevision) -> DomainResult<Tariff> {
        let current = self.get(id).await?;
        let starts = revision
            .effective_from
            .unwrap_or_else(|| Utc::now().date_naive());

        if starts <= current.effective_from || !current.is_effective_on(starts) {
            return Err(DomainError::Validation(format!(
                "revision must start inside the current range of '{}' and after {}",
                current.code, current.effective_from
            )));
        }

        let code = revision.code.trim().to_string();

        let slabs = match revision.slabs {
            Some(slabs) => slabs,
            None => self.load_slabs(id).await?.into_slabs(),
        };
        let table = SlabTable::new(slabs)?;

        let next = Tariff {
            id: 0,
            code,
            name: revision.name.unwrap_or_else(|| current.name.clone()),
            description: revision.description.or_else(|| current.description.clone()),
            connection_type: current.connection_type,
            effective_from: starts,
            effective_to: current.effective_to,
            fixed_charge: revision.fixed_charge.unwrap_or(current.fixed_charge),
            minimum_charge: revision.minimum_charge.unwrap_or(current.minimum_charge),
            tax_percentage: revision.tax_percentage.unwrap_or(current.tax_percentage),
            currency: current.currency.clone(),
            billing_cycle: current.billing_cycle,
            supersedes: Some(current.id),
            created_at: Utc::now(),
        };
        next.validate()?;

        let saved = self
            .repos
            .tariffs()
            .supersede(current.id, starts, next, table.into_slabs())
            .await?;

        info!(
            tariff_id = saved.id,
            supersedes = current.id,
            code = %saved.code,
            effective_from = %starts,
            "Tariff revised"
        );
        self.event_bus.publish(Event::TariffRevised(TariffRevisedEvent {
            tariff_id: saved.id,
            supersedes: current.id,
            code: saved.code.clone(),
            effective_from: starts,
        }));

        Ok(saved)
    }

    /// Compose charges for a hypothetical consumption without issuing a bill.
    pub async fn preview(
        &self,
        tariff_id: i32,
        consumption: &Consumption,
        discount: Decimal,
        previous_balance: Decimal,
    ) -> DomainResult<BillCharges> {
        let tariff = self.get(tariff_id).await?;
        let table = self.load_slabs(tariff_id).await?;
        compose(consumption, &tariff, &table, previous_balance, discount)
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::create_event_bus;
    use crate::domain::tariff::{BillingCycle, Slab, TariffRepository};
    use crate::infrastructure::storage::InMemoryStorage;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn service() -> TariffService {
        TariffService::new(Arc::new(InMemoryStorage::new()), create_event_bus())
    }

    fn residential(code: &str, from: NaiveDate) -> NewTariff {
        NewTariff {
            code: code.into(),
            name: "Residential".into(),
            description: None,
            connection_type: ConnectionType::Residential,
            effective_from: from,
            effective_to: None,
            fixed_charge: dec!(10.00),
            minimum_charge: dec!(5.00),
            tax_percentage: dec!(15),
            currency: "SAR".into(),
            billing_cycle: BillingCycle::Monthly,
            slabs: vec![
                Slab::bounded(1, dec!(0), dec!(100), dec!(0.18)),
                Slab::bounded(2, dec!(100), dec!(300), dec!(0.30)),
                Slab::open_ended(3, dec!(300), dec!(0.45)),
            ],
        }
    }

    #[tokio::test]
    async fn define_and_load_slabs() {
        let svc = service();
        let tariff = svc.define(residential("RES-2024", date(2024, 1, 1))).await.unwrap();
        let table = svc.load_slabs(tariff.id).await.unwrap();
        assert_eq!(table.len(), 3);
        assert!(table.is_open_ended());
    }

    #[tokio::test]
    async fn define_rejects_invalid_slabs() {
        let svc = service();
        let mut new = residential("RES-2024", date(2024, 1, 1));
        new.slabs[1].from_units = dec!(120);
        let err = svc.define(new).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidTariff(_)));
        assert!(svc.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn define_rejects_overlapping_range() {
        let svc = service();
        svc.define(residential("RES-A", date(2024, 1, 1))).await.unwrap();
        let err = svc
            .define(residential("RES-B", date(2024, 6, 1)))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn other_connection_types_do_not_overlap() {
        let svc = service();
        svc.define(residential("RES-A", date(2024, 1, 1))).await.unwrap();
        let mut commercial = residential("COM-A", date(2024, 1, 1));
        commercial.connection_type = ConnectionType::Commercial;
        assert!(svc.define(commercial).await.is_ok());
    }

    #[tokio::test]
    async fn missing_tariff_is_not_found() {
        let svc = service();
        assert!(matches!(
            svc.load_slabs(99).await,
            Err(DomainError::NotFound { entity: "Tariff", .. })
        ));
    }

    #[tokio::test]
    async fn stored_tariff_without_slabs_is_not_found() {
        let store = Arc::new(InMemoryStorage::new());
        let (tariff, _) = residential("RES-2024", date(2024, 1, 1)).into_parts(None);
        let saved = TariffRepository::save(store.as_ref(), tariff, vec![])
            .await
            .unwrap();

        let svc = TariffService::new(store, create_event_bus());
        assert!(matches!(
            svc.load_slabs(saved.id).await,
            Err(DomainError::NotFound { entity: "TariffSlab", .. })
        ));
    }

    #[tokio::test]
    async fn stored_gapped_slabs_are_invalid() {
        let store = Arc::new(InMemoryStorage::new());
        let (tariff, _) = residential("RES-2024", date(2024, 1, 1)).into_parts(None);
        let gapped = vec![
            Slab::bounded(1, dec!(0), dec!(100), dec!(0.18)),
            Slab::open_ended(2, dec!(150), dec!(0.30)),
        ];
        let saved = TariffRepository::save(store.as_ref(), tariff, gapped)
            .await
            .unwrap();

        let svc = TariffService::new(store, create_event_bus());
        assert!(matches!(
            svc.load_slabs(saved.id).await,
            Err(DomainError::InvalidTariff(_))
        ));
    }

    #[tokio::test]
    async fn duplicate_code_conflicts() {
        let svc = service();
        let original = svc.define(residential("RES-2024", date(2024, 1, 1))).await.unwrap();

        let mut commercial = residential("RES-2024", date(2024, 1, 1));
        commercial.connection_type = ConnectionType::Commercial;
        assert!(matches!(
            svc.define(commercial).await,
            Err(DomainError::Conflict(_))
        ));

        let err = svc
            .revise(
                original.id,
                TariffRevision {
                    code: "RES-2024".into(),
                    effective_from: Some(date(2024, 7, 1)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(
            svc.get(original.id).await.unwrap().effective_to,
            None,
            "failed revision must leave the current range open"
        );
    }

    #[tokio::test]
    async fn revision_splits_effective_range() {
        let svc = service();
        let original = svc.define(residential("RES-2024", date(2024, 1, 1))).await.unwrap();

        let revised = svc
            .revise(
                original.id,
                TariffRevision {
                    code: "RES-2024-07".into(),
                    effective_from: Some(date(2024, 7, 1)),
                    fixed_charge: Some(dec!(12.00)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(revised.supersedes, Some(original.id));
        assert_eq!(revised.fixed_charge, dec!(12.00));
        assert_eq!(svc.load_slabs(revised.id).await.unwrap().len(), 3);

        let june = svc
            .effective_for(ConnectionType::Residential, date(2024, 6, 30))
            .await
            .unwrap();
        assert_eq!(june.id, original.id);
        assert_eq!(june.effective_to, Some(date(2024, 7, 1)));
        assert_eq!(june.fixed_charge, dec!(10.00));

        let july = svc
            .effective_for(ConnectionType::Residential, date(2024, 7, 1))
            .await
            .unwrap();
        assert_eq!(july.id, revised.id);
    }

    #[tokio::test]
    async fn revision_must_start_after_current_snapshot() {
        let svc = service();
        let original = svc.define(residential("RES-2024", date(2024, 1, 1))).await.unwrap();
        let err = svc
            .revise(
                original.id,
                TariffRevision {
                    code: "RES-OLD".into(),
                    effective_from: Some(date(2024, 1, 1)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn no_effective_tariff_is_not_found() {
        let svc = service();
        svc.define(residential("RES-2024", date(2024, 1, 1))).await.unwrap();
        assert!(matches!(
            svc.effective_for(ConnectionType::Residential, date(2023, 12, 31))
                .await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn preview_composes_without_issuing() {
        let svc = service();
        let tariff = svc.define(residential("RES-2024", date(2024, 1, 1))).await.unwrap();
        let consumption = Consumption::new(dec!(750), dec!(1000)).unwrap();
        let charges = svc
            .preview(tariff.id, &consumption, dec!(0), dec!(0))
            .await
            .unwrap();
        assert_eq!(charges.total_amount, dec!(83.95));
    }

    #[tokio::test]
    async fn define_publishes_event() {
        let bus = create_event_bus();
        let mut sub = bus.subscribe();
        let svc = TariffService::new(Arc::new(InMemoryStorage::new()), bus);
        svc.define(residential("RES-2024", date(2024, 1, 1))).await.unwrap();
        let msg = sub.recv().await.unwrap();
        assert_eq!(msg.event.event_type(), "tariff_defined");
    }
}
