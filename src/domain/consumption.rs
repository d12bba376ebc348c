//! Metered consumption for one billing period

use rust_decimal::Decimal;

use crate::domain::rating::money::{checked, ensure_within, MAX_UNITS};
use crate::domain::{DomainError, DomainResult};

/// Two register readings and, when the register wrapped, its capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Consumption {
    pub previous_reading: Decimal,
    pub current_reading: Decimal,
    /// Register capacity at which the meter wrapped back to zero
    pub rollover_at: Option<Decimal>,
}

impl Consumption {
    pub fn new(previous_reading: Decimal, current_reading: Decimal) -> DomainResult<Self> {
        if previous_reading < Decimal::ZERO || current_reading < Decimal::ZERO {
            return Err(DomainError::Validation(
                "meter readings must be non-negative".into(),
            ));
        }
        ensure_within(previous_reading, MAX_UNITS, "previous reading")?;
        ensure_within(current_reading, MAX_UNITS, "current reading")?;
        Ok(Self {
            previous_reading,
            current_reading,
            rollover_at: None,
        })
    }

    /// Record an explicit register rollover: the meter counted up to
    /// `capacity`, wrapped to zero, then reached `current_reading`.
    ///
    /// Only valid when the current reading is below the previous one.
    pub fn with_rollover(mut self, capacity: Decimal) -> DomainResult<Self> {
        if self.current_reading >= self.previous_reading {
            return Err(DomainError::Validation(format!(
                "no rollover between readings {} and {}",
                self.previous_reading, self.current_reading
            )));
        }
        if capacity <= self.previous_reading {
            return Err(DomainError::Validation(format!(
                "rollover capacity {capacity} must exceed both readings"
            )));
        }
        ensure_within(capacity, MAX_UNITS, "rollover capacity")?;
        self.rollover_at = Some(capacity);
        Ok(self)
    }

    /// Units consumed. Negative when the current reading is below the
    /// previous one and no rollover was recorded.
    pub fn units(&self) -> DomainResult<Decimal> {
        let delta = match self.rollover_at {
            Some(capacity) => capacity
                .checked_sub(self.previous_reading)
                .and_then(|d| d.checked_add(self.current_reading)),
            None => self.current_reading.checked_sub(self.previous_reading),
        };
        checked(delta, "consumption")
    }
}
