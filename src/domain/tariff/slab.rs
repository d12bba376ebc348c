//! Consumption bands of a tariff snapshot

use rust_decimal::Decimal;

use crate::domain::rating::money::{MAX_RATE, MAX_UNITS, RATE_SCALE};
use crate::domain::{DomainError, DomainResult};

/// One consumption band with its own per-unit rate.
///
/// `to_units = None` marks the open-ended band that absorbs any remainder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slab {
    pub slab_number: u32,
    pub from_units: Decimal,
    pub to_units: Option<Decimal>,
    pub rate_per_unit: Decimal,
}

impl Slab {
    pub fn bounded(slab_number: u32, from: Decimal, to: Decimal, rate: Decimal) -> Self {
        Self {
            slab_number,
            from_units: from,
            to_units: Some(to),
            rate_per_unit: rate,
        }
    }

    pub fn open_ended(slab_number: u32, from: Decimal, rate: Decimal) -> Self {
        Self {
            slab_number,
            from_units: from,
            to_units: None,
            rate_per_unit: rate,
        }
    }

    pub fn is_open_ended(&self) -> bool {
        self.to_units.is_none()
    }

    /// Width of the band, `None` when open-ended.
    pub fn width(&self) -> Option<Decimal> {
        self.to_units.map(|to| to - self.from_units)
    }

    /// Portion of `consumption` falling inside this band, clamped to `[0, width]`.
    pub fn units_within(&self, consumption: Decimal) -> Decimal {
        let upper = match self.to_units {
            Some(to) => consumption.min(to),
            None => consumption,
        };
        (upper - self.from_units).max(Decimal::ZERO)
    }
}

/// Validated, ordered slabs of one tariff snapshot.
///
/// Construction sorts by `slab_number` and runs [`validate`], so every
/// `SlabTable` in the program is contiguous, starts at zero and has at most
/// one open-ended band in last position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlabTable {
    slabs: Vec<Slab>,
}

impl SlabTable {
    pub fn new(mut slabs: Vec<Slab>) -> DomainResult<Self> {
        slabs.sort_by_key(|s| s.slab_number);
        validate(&slabs)?;
        Ok(Self { slabs })
    }

    pub fn slabs(&self) -> &[Slab] {
        &self.slabs
    }

    pub fn into_slabs(self) -> Vec<Slab> {
        self.slabs
    }

    pub fn is_open_ended(&self) -> bool {
        self.slabs.last().is_some_and(Slab::is_open_ended)
    }

    /// Upper bound of the last band, `None` if the table is open-ended.
    pub fn covered_units(&self) -> Option<Decimal> {
        self.slabs.last().and_then(|s| s.to_units)
    }

    pub fn len(&self) -> usize {
        self.slabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slabs.is_empty()
    }
}

/// Pure structural check of a slab set. Input order does not matter.
pub fn validate(slabs: &[Slab]) -> DomainResult<()> {
    if slabs.is_empty() {
        return Err(invalid("tariff has no slabs"));
    }

    let mut ordered: Vec<&Slab> = slabs.iter().collect();
    ordered.sort_by_key(|s| s.slab_number);

    for pair in ordered.windows(2) {
        if pair[0].slab_number == pair[1].slab_number {
            return Err(invalid(format!(
                "slab number {} appears more than once",
                pair[0].slab_number
            )));
        }
    }

    for slab in &ordered {
        let n = slab.slab_number;
        if n == 0 {
            return Err(invalid("slab numbers start at 1"));
        }
        if slab.from_units < Decimal::ZERO {
            return Err(invalid(format!("slab {n}: from_units is negative")));
        }
        if slab.rate_per_unit < Decimal::ZERO {
            return Err(invalid(format!("slab {n}: rate_per_unit is negative")));
        }
        if slab.rate_per_unit > MAX_RATE {
            return Err(invalid(format!(
                "slab {n}: rate_per_unit {} exceeds {MAX_RATE}",
                slab.rate_per_unit
            )));
        }
        if slab.from_units > MAX_UNITS || slab.to_units.is_some_and(|to| to > MAX_UNITS) {
            return Err(invalid(format!("slab {n}: bounds exceed {MAX_UNITS} units")));
        }
        if slab.rate_per_unit.normalize().scale() > RATE_SCALE {
            return Err(invalid(format!(
                "slab {n}: rate_per_unit {} has more than {RATE_SCALE} decimal places",
                slab.rate_per_unit
            )));
        }
        if let Some(to) = slab.to_units {
            if to <= slab.from_units {
                return Err(invalid(format!(
                    "slab {n}: to_units {to} must be greater than from_units {}",
                    slab.from_units
                )));
            }
        }
    }

    let first = ordered[0];
    if !first.from_units.is_zero() {
        return Err(invalid(format!(
            "slab {} must start at 0, starts at {}",
            first.slab_number, first.from_units
        )));
    }

    for pair in ordered.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        let Some(prev_to) = prev.to_units else {
            return Err(invalid(format!(
                "open-ended slab {} must be the last slab",
                prev.slab_number
            )));
        };
        if next.from_units != prev_to {
            let kind = if next.from_units > prev_to { "gap" } else { "overlap" };
            return Err(invalid(format!(
                "{kind} between slab {} (ends {prev_to}) and slab {} (starts {})",
                prev.slab_number, next.slab_number, next.from_units
            )));
        }
    }

    Ok(())
}

fn invalid(msg: impl Into<String>) -> DomainError {
    DomainError::InvalidTariff(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn residential() -> Vec<Slab> {
        vec![
            Slab::bounded(1, dec!(0), dec!(100), dec!(0.18)),
            Slab::bounded(2, dec!(100), dec!(300), dec!(0.30)),
            Slab::open_ended(3, dec!(300), dec!(0.45)),
        ]
    }

    #[test]
    fn accepts_contiguous_slabs() {
        let table = SlabTable::new(residential()).unwrap();
        assert_eq!(table.len(), 3);
        assert!(table.is_open_ended());
        assert_eq!(table.covered_units(), None);
    }

    #[test]
    fn sorts_by_slab_number() {
        let mut slabs = residential();
        slabs.reverse();
        let table = SlabTable::new(slabs).unwrap();
        let numbers: Vec<u32> = table.slabs().iter().map(|s| s.slab_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn bounded_table_reports_coverage() {
        let table = SlabTable::new(vec![
            Slab::bounded(1, dec!(0), dec!(200), dec!(0.10)),
            Slab::bounded(2, dec!(200), dec!(500), dec!(0.20)),
        ])
        .unwrap();
        assert!(!table.is_open_ended());
        assert_eq!(table.covered_units(), Some(dec!(500)));
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(validate(&[]), Err(DomainError::InvalidTariff(_))));
    }

    #[test]
    fn rejects_gap() {
        let slabs = vec![
            Slab::bounded(1, dec!(0), dec!(100), dec!(0.18)),
            Slab::open_ended(2, dec!(101), dec!(0.30)),
        ];
        let err = validate(&slabs).unwrap_err();
        assert!(err.to_string().contains("gap"));
    }

    #[test]
    fn rejects_overlap() {
        let slabs = vec![
            Slab::bounded(1, dec!(0), dec!(100), dec!(0.18)),
            Slab::open_ended(2, dec!(90), dec!(0.30)),
        ];
        let err = validate(&slabs).unwrap_err();
        assert!(err.to_string().contains("overlap"));
    }

    #[test]
    fn rejects_open_ended_slab_not_last() {
        let slabs = vec![
            Slab::open_ended(1, dec!(0), dec!(0.18)),
            Slab::bounded(2, dec!(100), dec!(300), dec!(0.30)),
        ];
        assert!(matches!(validate(&slabs), Err(DomainError::InvalidTariff(_))));
    }

    #[test]
    fn rejects_two_open_ended_slabs() {
        let slabs = vec![
            Slab::bounded(1, dec!(0), dec!(100), dec!(0.18)),
            Slab::open_ended(2, dec!(100), dec!(0.30)),
            Slab::open_ended(3, dec!(100), dec!(0.45)),
        ];
        assert!(matches!(validate(&slabs), Err(DomainError::InvalidTariff(_))));
    }

    #[test]
    fn rejects_duplicate_slab_number() {
        let slabs = vec![
            Slab::bounded(1, dec!(0), dec!(100), dec!(0.18)),
            Slab::open_ended(1, dec!(100), dec!(0.30)),
        ];
        let err = validate(&slabs).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn rejects_first_slab_not_at_zero() {
        let slabs = vec![Slab::open_ended(1, dec!(10), dec!(0.18))];
        assert!(matches!(validate(&slabs), Err(DomainError::InvalidTariff(_))));
    }

    #[test]
    fn rejects_zero_width() {
        let slabs = vec![
            Slab::bounded(1, dec!(0), dec!(0), dec!(0.18)),
            Slab::open_ended(2, dec!(0), dec!(0.30)),
        ];
        assert!(matches!(validate(&slabs), Err(DomainError::InvalidTariff(_))));
    }

    #[test]
    fn rejects_negative_rate() {
        let slabs = vec![Slab::open_ended(1, dec!(0), dec!(-0.10))];
        assert!(matches!(validate(&slabs), Err(DomainError::InvalidTariff(_))));
    }

    #[test]
    fn rejects_rate_with_five_decimals() {
        let slabs = vec![Slab::open_ended(1, dec!(0), dec!(0.12345))];
        assert!(matches!(validate(&slabs), Err(DomainError::InvalidTariff(_))));
    }

    #[test]
    fn rejects_rate_above_limit() {
        let slabs = vec![Slab::open_ended(1, dec!(0), Decimal::MAX)];
        assert!(matches!(validate(&slabs), Err(DomainError::InvalidTariff(_))));
        assert!(validate(&[Slab::open_ended(1, dec!(0), MAX_RATE)]).is_ok());
    }

    #[test]
    fn rejects_bounds_above_limit() {
        let slabs = vec![
            Slab::bounded(1, dec!(0), Decimal::MAX, dec!(0.18)),
            Slab::open_ended(2, Decimal::MAX, dec!(0.30)),
        ];
        assert!(matches!(validate(&slabs), Err(DomainError::InvalidTariff(_))));
    }

    #[test]
    fn trailing_zeros_do_not_count_as_precision() {
        let slabs = vec![Slab::open_ended(1, dec!(0), dec!(0.180000))];
        assert!(validate(&slabs).is_ok());
    }

    #[test]
    fn units_within_clamps_to_band() {
        let slab = Slab::bounded(2, dec!(100), dec!(300), dec!(0.30));
        assert_eq!(slab.units_within(dec!(50)), dec!(0));
        assert_eq!(slab.units_within(dec!(250)), dec!(150));
        assert_eq!(slab.units_within(dec!(1000)), dec!(200));
    }
}
