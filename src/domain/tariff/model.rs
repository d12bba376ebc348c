//! Tariff domain entity

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use super::slab::Slab;
use crate::domain::rating::money::{MAX_AMOUNT, MONEY_SCALE};
use crate::domain::{DomainError, DomainResult};

/// Category of service connection a tariff applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionType {
    Residential,
    Commercial,
    Industrial,
    Agricultural,
}

impl Default for ConnectionType {
    fn default() -> Self {
        Self::Residential
    }
}

impl ConnectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Residential => "residential",
            Self::Commercial => "commercial",
            Self::Industrial => "industrial",
            Self::Agricultural => "agricultural",
        }
    }
}

impl std::fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "residential" => Ok(Self::Residential),
            "commercial" => Ok(Self::Commercial),
            "industrial" => Ok(Self::Industrial),
            "agricultural" => Ok(Self::Agricultural),
            other => Err(DomainError::Validation(format!(
                "unknown connection type '{other}'"
            ))),
        }
    }
}

/// How often bills are raised under a tariff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingCycle {
    Monthly,
    Bimonthly,
    Quarterly,
}

impl Default for BillingCycle {
    fn default() -> Self {
        Self::Monthly
    }
}

impl BillingCycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Bimonthly => "bimonthly",
            Self::Quarterly => "quarterly",
        }
    }
}

impl std::fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingCycle {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "monthly" => Ok(Self::Monthly),
            "bimonthly" => Ok(Self::Bimonthly),
            "quarterly" => Ok(Self::Quarterly),
            other => Err(DomainError::Validation(format!(
                "unknown billing cycle '{other}'"
            ))),
        }
    }
}

/// An immutable tariff snapshot.
///
/// Rates never change in place: a rate change creates a new snapshot that
/// `supersedes` this one, and this one's `effective_to` is closed.
#[derive(Debug, Clone, PartialEq)]
pub struct Tariff {
    pub id: i32,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub connection_type: ConnectionType,
    /// First day the tariff applies (inclusive)
    pub effective_from: NaiveDate,
    /// First day the tariff no longer applies (exclusive), `None` = open
    pub effective_to: Option<NaiveDate>,
    /// Fixed charge per billing period
    pub fixed_charge: Decimal,
    /// Floor for energy + fixed + tax − discount
    pub minimum_charge: Decimal,
    /// Tax rate in percent, applied to energy + fixed charge
    pub tax_percentage: Decimal,
    /// Currency code (ISO 4217)
    pub currency: String,
    pub billing_cycle: BillingCycle,
    /// Snapshot this one replaced
    pub supersedes: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl Tariff {
    /// Half-open check: `effective_from <= date < effective_to`.
    pub fn is_effective_on(&self, date: NaiveDate) -> bool {
        if date < self.effective_from {
            return false;
        }
        match self.effective_to {
            Some(to) => date < to,
            None => true,
        }
    }

    /// Whether this snapshot's range intersects `[from, to)`.
    pub fn overlaps(&self, from: NaiveDate, to: Option<NaiveDate>) -> bool {
        let starts_before_other_ends = to.map_or(true, |to| self.effective_from < to);
        let other_starts_before_self_ends = self.effective_to.map_or(true, |end| from < end);
        starts_before_other_ends && other_starts_before_self_ends
    }

    /// `Conflict` when another snapshot of the same connection type claims
    /// part of this one's range.
    pub fn ensure_no_overlap<'a>(
        &self,
        others: impl IntoIterator<Item = &'a Tariff>,
    ) -> DomainResult<()> {
        let clash = others.into_iter().find(|t| {
            t.id != self.id
                && t.connection_type == self.connection_type
                && t.overlaps(self.effective_from, self.effective_to)
        });
        match clash {
            Some(t) => Err(DomainError::Conflict(format!(
                "effective range overlaps tariff '{}' ({} from {})",
                t.code, t.connection_type, t.effective_from
            ))),
            None => Ok(()),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.code.trim().is_empty() {
            return Err(DomainError::InvalidTariff("code is required".into()));
        }
        if let Some(to) = self.effective_to {
            if to <= self.effective_from {
                return Err(DomainError::InvalidTariff(format!(
                    "effective_to {to} must be after effective_from {}",
                    self.effective_from
                )));
            }
        }
        for (field, value) in [
            ("fixed_charge", self.fixed_charge),
            ("minimum_charge", self.minimum_charge),
        ] {
            if value < Decimal::ZERO {
                return Err(DomainError::InvalidTariff(format!("{field} is negative")));
            }
            if value > MAX_AMOUNT {
                return Err(DomainError::InvalidTariff(format!(
                    "{field} {value} exceeds {MAX_AMOUNT}"
                )));
            }
            if value.normalize().scale() > MONEY_SCALE {
                return Err(DomainError::InvalidTariff(format!(
                    "{field} {value} has more than {MONEY_SCALE} decimal places"
                )));
            }
        }
        if self.tax_percentage < Decimal::ZERO || self.tax_percentage > Decimal::ONE_HUNDRED {
            return Err(DomainError::InvalidTariff(format!(
                "tax_percentage {} must be between 0 and 100",
                self.tax_percentage
            )));
        }
        Ok(())
    }

    /// Format an amount as human-readable string
    pub fn format_amount(&self, amount: Decimal) -> String {
        format!("{:.2} {}", amount, self.currency)
    }
}

/// Definition of a new tariff and its slabs.
#[derive(Debug, Clone)]
pub struct NewTariff {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub connection_type: ConnectionType,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
    pub fixed_charge: Decimal,
    pub minimum_charge: Decimal,
    pub tax_percentage: Decimal,
    pub currency: String,
    pub billing_cycle: BillingCycle,
    pub slabs: Vec<Slab>,
}

impl NewTariff {
    /// Snapshot with a placeholder id; the repository assigns the real one.
    pub fn into_parts(self, supersedes: Option<i32>) -> (Tariff, Vec<Slab>) {
        let tariff = Tariff {
            id: 0,
            code: self.code.trim().to_string(),
            name: self.name,
            description: self.description,
            connection_type: self.connection_type,
            effective_from: self.effective_from,
            effective_to: self.effective_to,
            fixed_charge: self.fixed_charge,
            minimum_charge: self.minimum_charge,
            tax_percentage: self.tax_percentage,
            currency: self.currency,
            billing_cycle: self.billing_cycle,
            supersedes,
            created_at: Utc::now(),
        };
        (tariff, self.slabs)
    }
}

/// Changes applied when a tariff is revised. Fields left `None` carry over
/// from the superseded snapshot.
#[derive(Debug, Clone, Default)]
pub struct TariffRevision {
    pub code: String,
    pub effective_from: Option<NaiveDate>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub fixed_charge: Option<Decimal>,
    pub minimum_charge: Option<Decimal>,
    pub tax_percentage: Option<Decimal>,
    pub slabs: Option<Vec<Slab>>,
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_tariff() -> Tariff {
        Tariff {
            id: 1,
            code: "RES-2024".into(),
            name: "Residential 2024".into(),
            description: None,
            connection_type: ConnectionType::Residential,
            effective_from: date(2024, 1, 1),
            effective_to: Some(date(2025, 1, 1)),
            fixed_charge: dec!(10.00),
            minimum_charge: dec!(5.00),
            tax_percentage: dec!(15),
            currency: "SAR".into(),
            billing_cycle: BillingCycle::Monthly,
            supersedes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn effective_range_is_half_open() {
        let t = sample_tariff();
        assert!(!t.is_effective_on(date(2023, 12, 31)));
        assert!(t.is_effective_on(date(2024, 1, 1)));
        assert!(t.is_effective_on(date(2024, 12, 31)));
        assert!(!t.is_effective_on(date(2025, 1, 1)));
    }

    #[test]
    fn open_range_never_ends() {
        let mut t = sample_tariff();
        t.effective_to = None;
        assert!(t.is_effective_on(date(2099, 1, 1)));
    }

    #[test]
    fn overlap_detection() {
        let t = sample_tariff();
        assert!(t.overlaps(date(2024, 6, 1), None));
        assert!(t.overlaps(date(2023, 1, 1), Some(date(2024, 1, 2))));
        assert!(!t.overlaps(date(2025, 1, 1), None));
        assert!(!t.overlaps(date(2023, 1, 1), Some(date(2024, 1, 1))));
    }

    #[test]
    fn validate_accepts_sample() {
        assert!(sample_tariff().validate().is_ok());
    }

    #[test]
    fn validate_rejects_inverted_range() {
        let mut t = sample_tariff();
        t.effective_to = Some(date(2023, 1, 1));
        assert!(matches!(t.validate(), Err(DomainError::InvalidTariff(_))));
    }

    #[test]
    fn validate_rejects_empty_range() {
        let mut t = sample_tariff();
        t.effective_to = Some(t.effective_from);
        assert!(matches!(t.validate(), Err(DomainError::InvalidTariff(_))));
        assert!(!t.is_effective_on(t.effective_from));

        t.effective_to = t.effective_from.succ_opt();
        assert!(t.validate().is_ok());
        assert!(t.is_effective_on(t.effective_from));
    }

    #[test]
    fn validate_rejects_tax_above_hundred() {
        let mut t = sample_tariff();
        t.tax_percentage = dec!(101);
        assert!(t.validate().is_err());
    }

    #[test]
    fn validate_rejects_negative_fixed_charge() {
        let mut t = sample_tariff();
        t.fixed_charge = dec!(-1);
        assert!(t.validate().is_err());
    }

    #[test]
    fn format_amount_helper() {
        let t = sample_tariff();
        assert_eq!(t.format_amount(dec!(83.95)), "83.95 SAR");
        assert_eq!(t.format_amount(dec!(0)), "0.00 SAR");
    }

    #[test]
    fn connection_type_round_trips_through_str() {
        for ct in [
            ConnectionType::Residential,
            ConnectionType::Commercial,
            ConnectionType::Industrial,
            ConnectionType::Agricultural,
        ] {
            assert_eq!(ct.to_string().parse::<ConnectionType>().unwrap(), ct);
        }
        assert!("domestic".parse::<ConnectionType>().is_err());
    }

    #[test]
    fn billing_cycle_parses_case_insensitively() {
        assert_eq!("Quarterly".parse::<BillingCycle>().unwrap(), BillingCycle::Quarterly);
        assert!("weekly".parse::<BillingCycle>().is_err());
    }

    #[test]
    fn validate_rejects_oversized_minimum_charge() {
        let mut t = sample_tariff();
        t.minimum_charge = Decimal::MAX;
        assert!(matches!(t.validate(), Err(DomainError::InvalidTariff(_))));
    }

    #[test]
    fn overlap_check_ignores_self_and_other_connection_types() {
        let t = sample_tariff();

        let mut commercial = sample_tariff();
        commercial.id = 2;
        commercial.connection_type = ConnectionType::Commercial;
        assert!(t.ensure_no_overlap([&t, &commercial]).is_ok());

        let mut sibling = sample_tariff();
        sibling.id = 3;
        sibling.code = "RES-2024B".into();
        sibling.effective_from = date(2024, 6, 1);
        assert!(matches!(
            t.ensure_no_overlap([&sibling]),
            Err(DomainError::Conflict(_))
        ));
    }
}
