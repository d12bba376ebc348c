//! Shared conversion helpers for the SeaORM repositories

use std::str::FromStr;

use rust_decimal::Decimal;
use sea_orm::{DbErr, SqlErr};

use crate::domain::DomainError;

/// Unique-key violations surface as `Conflict`, everything else as `Storage`.
pub(super) fn db_err(e: DbErr) -> DomainError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => DomainError::Conflict(detail),
        _ => DomainError::Storage(format!("Database error: {e}")),
    }
}

/// Decimal columns are stored as text to keep exact scale in SQLite.
pub(super) fn decimal(value: &str, column: &str) -> Result<Decimal, DomainError> {
    Decimal::from_str(value)
        .map_err(|e| DomainError::Storage(format!("column {column} holds '{value}': {e}")))
}

pub(super) fn opt_decimal(value: Option<&str>, column: &str) -> Result<Option<Decimal>, DomainError> {
    value.map(|v| decimal(v, column)).transpose()
}

/// Stored enum text that no longer parses is a storage fault, not user input.
pub(super) fn parse_enum<T>(value: &str, column: &str) -> Result<T, DomainError>
where
    T: FromStr<Err = DomainError>,
{
    value
        .parse()
        .map_err(|_| DomainError::Storage(format!("column {column} holds unknown value '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BillStatus;
    use rust_decimal_macros::dec;

    #[test]
    fn decimal_keeps_scale() {
        assert_eq!(decimal("0.1800", "rate").unwrap().to_string(), "0.1800");
        assert_eq!(decimal("83.95", "total").unwrap(), dec!(83.95));
        assert!(matches!(decimal("n/a", "total"), Err(DomainError::Storage(_))));
    }

    #[test]
    fn unknown_enum_is_storage_error() {
        assert_eq!(
            parse_enum::<BillStatus>("paid", "status").unwrap(),
            BillStatus::Paid
        );
        assert!(matches!(
            parse_enum::<BillStatus>("settled", "status"),
            Err(DomainError::Storage(_))
        ));
    }

    #[test]
    fn plain_db_error_is_storage() {
        let err = db_err(DbErr::Custom("boom".into()));
        assert!(matches!(err, DomainError::Storage(_)));
    }
}
