//! Reallocation cycle and validation guard.
//!
//! The coordinator's write half: resolve scope, compute the distribution,
//! atomically replace the allocation set. The validation guard re-reads the
//! persisted rows afterwards; a failed check after a committed replace is a
//! strategy bug, not a recoverable user error.

use sea_orm::Statement;
use uuid::Uuid;

use sea_orm::{ConnectionTrait, DatabaseTransaction};

use crate::{
    Allocation, EngineError, Expense, MoneyCents, ResultEngine, distribute, scope::resolve_scope,
};

use super::Engine;

/// Persisted-sum tolerance of the validation guard: 0.01 currency units.
///
/// Freshly written sets are exact in minor units; the tolerance only
/// matters for auditing data that out-of-band edits may have perturbed.
const MISMATCH_TOLERANCE_MINOR: i64 = 1;

/// Result of a successful (re)allocation cycle.
#[derive(Clone, Debug)]
pub struct ReallocationOutcome {
    pub expense: Expense,
    /// `false` when an update touched only title/category/status and the
    /// existing allocation set was kept as-is.
    pub reallocated: bool,
    /// Number of units the amount was split across.
    pub unit_count: usize,
    /// The area-weighted strategy fell back to an equal split for lack of
    /// area data. Non-fatal notice, surfaced to the caller.
    pub degraded_to_equal: bool,
}

/// One expense whose persisted allocations drifted from its amount.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditFinding {
    pub expense_id: Uuid,
    pub expected: MoneyCents,
    pub actual: MoneyCents,
    pub delta: MoneyCents,
}

impl Engine {
    /// Runs resolve → distribute → replace for `expense` inside the open
    /// transaction. Returns `(unit_count, degraded_to_equal)`.
    pub(super) async fn reallocate_in_tx(
        &self,
        db_tx: &DatabaseTransaction,
        expense: &Expense,
    ) -> ResultEngine<(usize, bool)> {
        let units = resolve_scope(db_tx, &expense.scope).await?;
        let distribution = distribute(expense.amount, expense.distribution, &units)?;

        if distribution.degraded_to_equal {
            tracing::warn!(
                expense_id = %expense.id,
                "area-weighted distribution degraded to equal: no unit has a usable floor area"
            );
        }

        let rows: Vec<Allocation> = distribution
            .shares
            .iter()
            .map(|share| Allocation::new(expense.id, share.unit_id, share.amount, expense.currency))
            .collect();
        self.replace_allocations(db_tx, expense.id, &rows).await?;

        Ok((rows.len(), distribution.degraded_to_equal))
    }

    /// Validation guard: sums the persisted allocations of `expense_id` and
    /// compares them to `expected` within the fixed tolerance.
    ///
    /// Runs against the live connection, after the write transaction has
    /// committed; a failure here is an [`EngineError::AllocationMismatch`]
    /// defect to alert on.
    pub async fn check_allocations(
        &self,
        expense_id: Uuid,
        expected: MoneyCents,
    ) -> ResultEngine<()> {
        let actual = self.allocation_sum(expense_id).await?;
        let delta = actual - expected;
        if delta.cents().abs() > MISMATCH_TOLERANCE_MINOR {
            return Err(EngineError::AllocationMismatch {
                expected_minor: expected.cents(),
                actual_minor: actual.cents(),
            });
        }
        Ok(())
    }

    /// Auditing sweep over every expense: reports each one whose persisted
    /// allocation sum drifted beyond the tolerance. Intended for a periodic
    /// out-of-band check; a healthy ledger returns an empty list.
    pub async fn audit_allocations(&self) -> ResultEngine<Vec<AuditFinding>> {
        let backend = self.database.get_database_backend();
        let stmt = Statement::from_string(
            backend,
            "SELECT e.id AS expense_id, e.amount_minor AS expected, \
             COALESCE(SUM(a.amount_minor), 0) AS actual \
             FROM expenses e \
             LEFT JOIN expense_allocations a ON a.expense_id = e.id \
             GROUP BY e.id, e.amount_minor"
                .to_string(),
        );

        let mut findings = Vec::new();
        for row in self.database.query_all(stmt).await? {
            let raw_id: String = row.try_get("", "expense_id")?;
            let expected: i64 = row.try_get("", "expected")?;
            let actual: i64 = row.try_get("", "actual")?;

            let delta = actual - expected;
            if delta.abs() > MISMATCH_TOLERANCE_MINOR {
                let expense_id = Uuid::parse_str(&raw_id)
                    .map_err(|_| EngineError::KeyNotFound("expense not exists".to_string()))?;
                tracing::error!(
                    %expense_id,
                    expected,
                    actual,
                    "allocation sum drifted from expense amount"
                );
                findings.push(AuditFinding {
                    expense_id,
                    expected: MoneyCents::new(expected),
                    actual: MoneyCents::new(actual),
                    delta: MoneyCents::new(delta),
                });
            }
        }
        Ok(findings)
    }

    async fn allocation_sum(&self, expense_id: Uuid) -> ResultEngine<MoneyCents> {
        let backend = self.database.get_database_backend();
        let stmt = Statement::from_sql_and_values(
            backend,
            "SELECT COALESCE(SUM(amount_minor), 0) AS sum \
             FROM expense_allocations WHERE expense_id = ?",
            vec![expense_id.to_string().into()],
        );
        let row = self.database.query_one(stmt).await?;
        let sum: i64 = row.and_then(|r| r.try_get("", "sum").ok()).unwrap_or(0);
        Ok(MoneyCents::new(sum))
    }
}
