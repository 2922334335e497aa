//! The module contains the errors the engine can throw.
//!
//! Scope, period and concurrency errors are recoverable and meant for
//! user-facing messaging. [`AllocationMismatch`] is not: it means a
//! supposedly successful reallocation left the ledger out of balance and
//! should be alerted on as a defect.
//!
//! [`AllocationMismatch`]: EngineError::AllocationMismatch
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The expense scope resolved to zero eligible units.
    #[error("scope resolves to no units: {0}")]
    EmptyScope(String),
    /// The expense belongs to a closed accounting period.
    #[error("period {0} is closed")]
    PeriodClosed(String),
    /// Optimistic version check failed; the caller must retry from a fresh read.
    #[error("expense was modified concurrently: {0}")]
    ConcurrentModification(String),
    /// Persisted allocations do not sum to the expense amount.
    #[error("allocation sum mismatch: expected {expected_minor} minor units, got {actual_minor}")]
    AllocationMismatch {
        expected_minor: i64,
        actual_minor: i64,
    },
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid scope: {0}")]
    InvalidScope(String),
    #[error("Currency mismatch: {0}")]
    CurrencyMismatch(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// `true` for errors the caller can act on (fix input and retry).
    ///
    /// `AllocationMismatch` and `Database` are operator-facing defects.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::AllocationMismatch { .. } | Self::Database(_)
        )
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::EmptyScope(a), Self::EmptyScope(b)) => a == b,
            (Self::PeriodClosed(a), Self::PeriodClosed(b)) => a == b,
            (Self::ConcurrentModification(a), Self::ConcurrentModification(b)) => a == b,
            (
                Self::AllocationMismatch {
                    expected_minor: ae,
                    actual_minor: aa,
                },
                Self::AllocationMismatch {
                    expected_minor: be,
                    actual_minor: ba,
                },
            ) => ae == be && aa == ba,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidScope(a), Self::InvalidScope(b)) => a == b,
            (Self::CurrencyMismatch(a), Self::CurrencyMismatch(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
