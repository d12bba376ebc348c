//! SeaORM implementation of TariffRepository

use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::info;

use super::mapping::{db_err, decimal, opt_decimal, parse_enum};
use crate::domain::tariff::{ConnectionType, Slab, Tariff, TariffRepository};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::{tariff, tariff_slab};

// ── Conversion helpers ──────────────────────────────────────────

fn entity_to_domain(t: tariff::Model) -> DomainResult<Tariff> {
    Ok(Tariff {
        id: t.id,
        connection_type: parse_enum(&t.connection_type, "tariffs.connection_type")?,
        billing_cycle: parse_enum(&t.billing_cycle, "tariffs.billing_cycle")?,
        fixed_charge: decimal(&t.fixed_charge, "tariffs.fixed_charge")?,
        minimum_charge: decimal(&t.minimum_charge, "tariffs.minimum_charge")?,
        tax_percentage: decimal(&t.tax_percentage, "tariffs.tax_percentage")?,
        code: t.code,
        name: t.name,
        description: t.description,
        effective_from: t.effective_from,
        effective_to: t.effective_to,
        currency: t.currency,
        supersedes: t.supersedes,
        created_at: t.created_at,
    })
}

fn slab_to_domain(s: tariff_slab::Model) -> DomainResult<Slab> {
    Ok(Slab {
        slab_number: u32::try_from(s.slab_number).map_err(|_| {
            DomainError::Storage(format!("negative slab number {}", s.slab_number))
        })?,
        from_units: decimal(&s.from_units, "tariff_slabs.from_units")?,
        to_units: opt_decimal(s.to_units.as_deref(), "tariff_slabs.to_units")?,
        rate_per_unit: decimal(&s.rate_per_unit, "tariff_slabs.rate_per_unit")?,
    })
}

fn to_active(t: &Tariff) -> tariff::ActiveModel {
    tariff::ActiveModel {
        code: Set(t.code.clone()),
        name: Set(t.name.clone()),
        description: Set(t.description.clone()),
        connection_type: Set(t.connection_type.to_string()),
        effective_from: Set(t.effective_from),
        effective_to: Set(t.effective_to),
        fixed_charge: Set(t.fixed_charge.to_string()),
        minimum_charge: Set(t.minimum_charge.to_string()),
        tax_percentage: Set(t.tax_percentage.to_string()),
        currency: Set(t.currency.clone()),
        billing_cycle: Set(t.billing_cycle.to_string()),
        supersedes: Set(t.supersedes),
        created_at: Set(t.created_at),
        ..Default::default()
    }
}

/// Insert a snapshot and its slabs on `conn` (a connection or transaction).
async fn insert_snapshot<C: ConnectionTrait>(
    conn: &C,
    t: &Tariff,
    slabs: &[Slab],
) -> DomainResult<Tariff> {
    let saved = to_active(t).insert(conn).await.map_err(db_err)?;

    for slab in slabs {
        tariff_slab::ActiveModel {
            tariff_id: Set(saved.id),
            slab_number: Set(slab.slab_number as i32),
            from_units: Set(slab.from_units.to_string()),
            to_units: Set(slab.to_units.map(|u| u.to_string())),
            rate_per_unit: Set(slab.rate_per_unit.to_string()),
            ..Default::default()
        }
        .insert(conn)
        .await
        .map_err(db_err)?;
    }

    entity_to_domain(saved)
}

async fn find_siblings<C: ConnectionTrait>(
    conn: &C,
    connection_type: ConnectionType,
) -> DomainResult<Vec<Tariff>> {
    tariff::Entity::find()
        .filter(tariff::Column::ConnectionType.eq(connection_type.as_str()))
        .order_by_asc(tariff::Column::EffectiveFrom)
        .all(conn)
        .await
        .map_err(db_err)?
        .into_iter()
        .map(entity_to_domain)
        .collect()
}

// ── SeaOrmTariffRepository ──────────────────────────────────────

pub struct SeaOrmTariffRepository {
    db: DatabaseConnection,
}

impl SeaOrmTariffRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TariffRepository for SeaOrmTariffRepository {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Tariff>> {
        tariff::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(entity_to_domain)
            .transpose()
    }

    async fn find_by_code(&self, code: &str) -> DomainResult<Option<Tariff>> {
        tariff::Entity::find()
            .filter(tariff::Column::Code.eq(code))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(entity_to_domain)
            .transpose()
    }

    async fn find_all(&self) -> DomainResult<Vec<Tariff>> {
        tariff::Entity::find()
            .order_by_asc(tariff::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(entity_to_domain)
            .collect()
    }

    async fn find_by_connection_type(
        &self,
        connection_type: ConnectionType,
    ) -> DomainResult<Vec<Tariff>> {
        find_siblings(&self.db, connection_type).await
    }

    async fn find_slabs(&self, tariff_id: i32) -> DomainResult<Vec<Slab>> {
        tariff_slab::Entity::find()
            .filter(tariff_slab::Column::TariffId.eq(tariff_id))
            .order_by_asc(tariff_slab::Column::SlabNumber)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(slab_to_domain)
            .collect()
    }

    async fn save(&self, t: Tariff, slabs: Vec<Slab>) -> DomainResult<Tariff> {
        let txn = self.db.begin().await.map_err(db_err)?;
        t.ensure_no_overlap(&find_siblings(&txn, t.connection_type).await?)?;
        let saved = insert_snapshot(&txn, &t, &slabs).await?;
        txn.commit().await.map_err(db_err)?;

        info!(tariff_id = saved.id, code = %saved.code, slabs = slabs.len(), "Tariff saved");
        Ok(saved)
    }

    async fn supersede(
        &self,
        previous_id: i32,
        closes_on: NaiveDate,
        t: Tariff,
        slabs: Vec<Slab>,
    ) -> DomainResult<Tariff> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let mut previous = tariff::Entity::find_by_id(previous_id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .map(entity_to_domain)
            .transpose()?
            .ok_or_else(|| DomainError::not_found("Tariff", "id", previous_id))?;
        if closes_on <= previous.effective_from || !previous.is_effective_on(closes_on) {
            return Err(DomainError::Conflict(format!(
                "tariff '{}' no longer covers {closes_on}",
                previous.code
            )));
        }
        let observed_end = previous.effective_to;
        previous.effective_to = Some(closes_on);

        let siblings = find_siblings(&txn, t.connection_type).await?;
        t.ensure_no_overlap(
            siblings
                .iter()
                .map(|s| if s.id == previous_id { &previous } else { s }),
        )?;

        // Close the range only if nobody closed it since it was read.
        let still_open = match observed_end {
            Some(end) => tariff::Column::EffectiveTo.eq(end),
            None => tariff::Column::EffectiveTo.is_null(),
        };
        let closed = tariff::Entity::update_many()
            .col_expr(tariff::Column::EffectiveTo, Expr::value(closes_on))
            .filter(tariff::Column::Id.eq(previous_id))
            .filter(still_open)
            .exec(&txn)
            .await
            .map_err(db_err)?;
        if closed.rows_affected == 0 {
            return Err(DomainError::Conflict(format!(
                "tariff '{}' was revised concurrently",
                previous.code
            )));
        }

        let saved = insert_snapshot(&txn, &t, &slabs).await?;
        txn.commit().await.map_err(db_err)?;

        info!(
            tariff_id = saved.id,
            supersedes = previous_id,
            closes_on = %closes_on,
            "Tariff superseded"
        );
        Ok(saved)
    }
}
