//! Shared-expense allocation engine.
//!
//! Takes one recorded expense, splits its amount across the units in scope
//! (equally or by floor area), persists the split as individually queryable
//! allocation rows, and keeps `sum(allocations) == expense.amount` exact in
//! minor units across every edit. All writes run inside one database
//! transaction; readers observe either the fully-old or fully-new set.

pub use allocations::Allocation;
pub use commands::{CreateExpenseCmd, UpdateExpenseCmd};
pub use currency::Currency;
pub use distribution::{Distribution, DistributionKind, UnitShare, distribute};
pub use error::EngineError;
pub use expenses::{Expense, ExpenseCategory, ExpenseStatus};
pub use money::MoneyCents;
pub use ops::{AllocationBreakdownRow, AuditFinding, Engine, EngineBuilder, ExpenseListFilter,
    ReallocationOutcome};
pub use period::PeriodKey;
pub use scope::{ExpenseScope, resolve_scope};
pub use units::UnitRef;

pub mod allocations;
pub mod buildings;
mod commands;
mod currency;
mod distribution;
mod error;
pub mod expenses;
mod money;
mod ops;
mod period;
mod scope;
pub mod units;

pub type ResultEngine<T> = Result<T, EngineError>;
