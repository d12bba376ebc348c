//! Tariff DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::domain::tariff::{Slab, SlabTable, Tariff, TariffRevision};

/// One consumption band of a tariff
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SlabDto {
    pub slab_number: u32,
    #[schema(value_type = String, example = "0")]
    pub from_units: Decimal,
    /// Band edge: units above `from_units` up to this value are rated here,
    /// and the next slab's `from_units` equals it. `null` for the open-ended
    /// last band
    #[schema(value_type = Option<String>, example = "100")]
    pub to_units: Option<Decimal>,
    #[schema(value_type = String, example = "0.18")]
    pub rate_per_unit: Decimal,
}

impl From<&Slab> for SlabDto {
    fn from(s: &Slab) -> Self {
        Self {
            slab_number: s.slab_number,
            from_units: s.from_units,
            to_units: s.to_units,
            rate_per_unit: s.rate_per_unit,
        }
    }
}

impl From<SlabDto> for Slab {
    fn from(s: SlabDto) -> Self {
        Slab {
            slab_number: s.slab_number,
            from_units: s.from_units,
            to_units: s.to_units,
            rate_per_unit: s.rate_per_unit,
        }
    }
}

/// Tariff snapshot with its slab table
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TariffResponse {
    pub id: i32,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub connection_type: String,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
    #[schema(value_type = String)]
    pub fixed_charge: Decimal,
    #[schema(value_type = String)]
    pub minimum_charge: Decimal,
    #[schema(value_type = String)]
    pub tax_percentage: Decimal,
    pub currency: String,
    pub billing_cycle: String,
    /// Id of the snapshot this one replaced
    pub supersedes: Option<i32>,
    pub slabs: Vec<SlabDto>,
    pub created_at: DateTime<Utc>,
}

impl TariffResponse {
    pub fn new(t: Tariff, table: &SlabTable) -> Self {
        Self {
            id: t.id,
            code: t.code,
            name: t.name,
            description: t.description,
            connection_type: t.connection_type.to_string(),
            effective_from: t.effective_from,
            effective_to: t.effective_to,
            fixed_charge: t.fixed_charge,
            minimum_charge: t.minimum_charge,
            tax_percentage: t.tax_percentage,
            currency: t.currency,
            billing_cycle: t.billing_cycle.to_string(),
            supersedes: t.supersedes,
            slabs: table.slabs().iter().map(SlabDto::from).collect(),
            created_at: t.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTariffRequest {
    #[validate(length(min = 1, max = 50, message = "tariff code is required"))]
    pub code: String,
    #[validate(length(min = 1, max = 100, message = "tariff name is required"))]
    pub name: String,
    pub description: Option<String>,
    /// residential, commercial, industrial or agricultural
    pub connection_type: String,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
    #[schema(value_type = String, example = "5.00")]
    pub fixed_charge: Decimal,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub minimum_charge: Decimal,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "15")]
    pub tax_percentage: Decimal,
    /// Defaults to the configured billing currency
    #[validate(length(equal = 3, message = "currency must be a 3-letter code"))]
    pub currency: Option<String>,
    /// monthly (default), bimonthly or quarterly
    pub billing_cycle: Option<String>,
    #[validate(length(min = 1, message = "at least one slab is required"))]
    pub slabs: Vec<SlabDto>,
}

/// New rates taking effect on `effective_from`; omitted fields carry over.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReviseTariffRequest {
    /// Code of the new snapshot (codes are unique across snapshots)
    #[validate(length(min = 1, max = 50, message = "revision code is required"))]
    pub code: String,
    /// Defaults to today
    pub effective_from: Option<NaiveDate>,
    pub name: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>)]
    pub fixed_charge: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub minimum_charge: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub tax_percentage: Option<Decimal>,
    pub slabs: Option<Vec<SlabDto>>,
}

impl From<ReviseTariffRequest> for TariffRevision {
    fn from(r: ReviseTariffRequest) -> Self {
        TariffRevision {
            code: r.code,
            effective_from: r.effective_from,
            name: r.name,
            description: r.description,
            fixed_charge: r.fixed_charge,
            minimum_charge: r.minimum_charge,
            tax_percentage: r.tax_percentage,
            slabs: r.slabs.map(|slabs| slabs.into_iter().map(Slab::from).collect()),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct EffectiveTariffQuery {
    pub connection_type: String,
    /// Defaults to today
    pub date: Option<NaiveDate>,
}

/// Hypothetical readings to price against a tariff
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PreviewRequest {
    #[schema(value_type = String, example = "1200")]
    pub previous_reading: Decimal,
    #[schema(value_type = String, example = "1450")]
    pub current_reading: Decimal,
    /// Register capacity when the meter wrapped around
    #[schema(value_type = Option<String>)]
    pub rollover_at: Option<Decimal>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub discount: Decimal,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub previous_balance: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn slab_edges_chain_into_next_band() {
        let table = SlabTable::new(vec![
            Slab::bounded(1, dec!(0), dec!(100), dec!(0.18)),
            Slab::bounded(2, dec!(100), dec!(300), dec!(0.30)),
            Slab::open_ended(3, dec!(300), dec!(0.45)),
        ])
        .unwrap();
        let dtos: Vec<SlabDto> = table.slabs().iter().map(SlabDto::from).collect();

        for pair in dtos.windows(2) {
            assert_eq!(pair[0].to_units, Some(pair[1].from_units));
        }
        assert_eq!(dtos[2].to_units, None);

        let json = serde_json::to_value(&dtos[0]).unwrap();
        assert_eq!(json["to_units"], "100");
    }
}
