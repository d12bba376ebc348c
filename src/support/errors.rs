use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    /// Malformed tariff or slab configuration. Never auto-corrected.
    #[error("Invalid tariff: {0}")]
    InvalidTariff(String),

    /// Consumption exceeds the bounded slabs of a tariff that has no open-ended slab.
    #[error("Consumption {consumption} exceeds tariff coverage (slabs end at {covered_to})")]
    TariffCoverage {
        consumption: Decimal,
        covered_to: Decimal,
    },

    /// Negative consumption, e.g. a register rollover or transposed reading.
    #[error("Invalid consumption {units}: a corrected reading or rollover adjustment is required")]
    InvalidConsumption { units: Decimal },

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    /// Whether this error is likely transient (e.g. DB connection lost, stale
    /// row version) and the operation may succeed if retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, DomainError::Storage(_) | DomainError::Conflict(_))
    }

    pub fn not_found(entity: &'static str, field: &'static str, value: impl ToString) -> Self {
        DomainError::NotFound {
            entity,
            field,
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metrics recorder error: {0}")]
    Metrics(String),
}

impl From<InfraError> for DomainError {
    fn from(e: InfraError) -> Self {
        DomainError::Storage(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Infra(#[from] InfraError),

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}

impl From<sea_orm::DbErr> for AppError {
    fn from(e: sea_orm::DbErr) -> Self {
        AppError::Infra(InfraError::Database(e))
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Infra(InfraError::Io(e))
    }
}
