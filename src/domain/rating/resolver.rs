//! Progressive (tiered) energy rating

use rust_decimal::Decimal;

use super::money::{checked, round_money, round_rate};
use crate::domain::tariff::SlabTable;
use crate::domain::{DomainError, DomainResult};

/// Units billed inside one slab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlabCharge {
    pub slab_number: u32,
    pub units: Decimal,
    pub rate: Decimal,
    /// `units × rate` at rate precision (not yet rounded to money)
    pub amount: Decimal,
}

/// Energy charge for one consumption quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnergyCharge {
    /// Sum of the slab amounts, rounded once to money precision
    pub amount: Decimal,
    /// Slabs with non-zero units, in slab order
    pub breakdown: Vec<SlabCharge>,
}

impl EnergyCharge {
    pub fn zero() -> Self {
        Self {
            amount: Decimal::ZERO,
            breakdown: Vec::new(),
        }
    }

    /// Total units allocated across the breakdown.
    pub fn units(&self) -> Decimal {
        self.breakdown.iter().map(|c| c.units).sum()
    }
}

/// Charge `consumption` against `table`, each slab at its own rate for the
/// portion of consumption falling inside it.
///
/// Fails with [`DomainError::TariffCoverage`] when the table has no open-ended
/// slab and consumption runs past its last bound, and with
/// [`DomainError::InvalidConsumption`] for negative quantities.
pub fn rate(consumption: Decimal, table: &SlabTable) -> DomainResult<EnergyCharge> {
    if consumption < Decimal::ZERO {
        return Err(DomainError::InvalidConsumption { units: consumption });
    }

    if let Some(covered_to) = table.covered_units() {
        if consumption > covered_to {
            return Err(DomainError::TariffCoverage {
                consumption,
                covered_to,
            });
        }
    }

    let mut total = Decimal::ZERO;
    let mut breakdown = Vec::new();

    for slab in table.slabs() {
        if consumption <= slab.from_units {
            break;
        }

        let units = slab.units_within(consumption);
        if units.is_zero() {
            continue;
        }

        let amount = units.checked_mul(slab.rate_per_unit).ok_or_else(|| {
            DomainError::InvalidTariff(format!(
                "slab {}: {units} units at {} overflows",
                slab.slab_number, slab.rate_per_unit
            ))
        })?;
        let amount = round_rate(amount);
        total = checked(total.checked_add(amount), "energy charge")?;
        breakdown.push(SlabCharge {
            slab_number: slab.slab_number,
            units,
            rate: slab.rate_per_unit,
            amount,
        });
    }

    Ok(EnergyCharge {
        amount: round_money(total),
        breakdown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tariff::Slab;
    use rust_decimal_macros::dec;

    fn residential() -> SlabTable {
        SlabTable::new(vec![
            Slab::bounded(1, dec!(0), dec!(100), dec!(0.18)),
            Slab::bounded(2, dec!(100), dec!(300), dec!(0.30)),
            Slab::open_ended(3, dec!(300), dec!(0.45)),
        ])
        .unwrap()
    }

    fn bounded_to_500() -> SlabTable {
        SlabTable::new(vec![
            Slab::bounded(1, dec!(0), dec!(200), dec!(0.10)),
            Slab::bounded(2, dec!(200), dec!(500), dec!(0.20)),
        ])
        .unwrap()
    }

    #[test]
    fn crosses_one_boundary() {
        let charge = rate(dec!(250), &residential()).unwrap();
        assert_eq!(charge.amount, dec!(63.00));
        assert_eq!(charge.breakdown.len(), 2);
        assert_eq!(charge.breakdown[0].units, dec!(100));
        assert_eq!(charge.breakdown[0].amount, dec!(18.00));
        assert_eq!(charge.breakdown[1].units, dec!(150));
        assert_eq!(charge.breakdown[1].amount, dec!(45.00));
    }

    #[test]
    fn zero_consumption_is_free_and_empty() {
        let charge = rate(dec!(0), &residential()).unwrap();
        assert_eq!(charge.amount, dec!(0));
        assert!(charge.breakdown.is_empty());
    }

    #[test]
    fn open_ended_slab_absorbs_remainder() {
        let charge = rate(dec!(1000), &residential()).unwrap();
        // 100×0.18 + 200×0.30 + 700×0.45
        assert_eq!(charge.amount, dec!(393.00));
        assert_eq!(charge.breakdown.last().unwrap().units, dec!(700));
    }

    #[test]
    fn exact_boundary_stays_in_lower_slab() {
        let charge = rate(dec!(100), &residential()).unwrap();
        assert_eq!(charge.breakdown.len(), 1);
        assert_eq!(charge.amount, dec!(18.00));
    }

    #[test]
    fn beyond_bounded_coverage_fails() {
        let err = rate(dec!(600), &bounded_to_500()).unwrap_err();
        assert_eq!(
            err,
            DomainError::TariffCoverage {
                consumption: dec!(600),
                covered_to: dec!(500),
            }
        );
    }

    #[test]
    fn bounded_table_accepts_consumption_at_its_limit() {
        let charge = rate(dec!(500), &bounded_to_500()).unwrap();
        assert_eq!(charge.amount, dec!(80.00));
    }

    #[test]
    fn negative_consumption_fails() {
        let err = rate(dec!(-50), &residential()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidConsumption { .. }));
    }

    #[test]
    fn rounds_once_at_the_end() {
        let table = SlabTable::new(vec![
            Slab::bounded(1, dec!(0), dec!(1), dec!(0.0025)),
            Slab::open_ended(2, dec!(1), dec!(0.0025)),
        ])
        .unwrap();
        // per slab 0.0025 each would round to 0.00 individually; together 0.005 → 0.01
        let charge = rate(dec!(2), &table).unwrap();
        assert_eq!(charge.amount, dec!(0.01));
    }

    #[test]
    fn breakdown_units_sum_to_consumption() {
        let table = residential();
        for c in [dec!(0.5), dec!(99.99), dec!(100), dec!(100.01), dec!(299.5), dec!(300), dec!(12345.67)] {
            let charge = rate(c, &table).unwrap();
            assert_eq!(charge.units(), c, "consumption {c}");
        }
    }

    #[test]
    fn energy_charge_is_monotonic() {
        let table = residential();
        let mut previous = Decimal::ZERO;
        let mut c = Decimal::ZERO;
        while c <= dec!(600) {
            let amount = rate(c, &table).unwrap().amount;
            assert!(amount >= previous, "charge decreased at {c}");
            previous = amount;
            c += dec!(7.25);
        }
    }

    #[test]
    fn overflowing_charge_is_an_error() {
        let steep = SlabTable::new(vec![Slab::open_ended(1, dec!(0), dec!(1000000))]).unwrap();
        assert!(matches!(
            rate(Decimal::MAX, &steep),
            Err(DomainError::InvalidTariff(_))
        ));
    }
}
