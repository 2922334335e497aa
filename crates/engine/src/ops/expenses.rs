//! Expense CRUD entry points.
//!
//! Every write runs the full coordinator cycle in one database transaction
//! (closed-period gate, optimistic version check, resolve → distribute →
//! replace) and runs the validation guard after commit. Pure field edits
//! (title, category, status) skip the allocation cycle entirely.

use chrono::{DateTime, Utc};
use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    CreateExpenseCmd, EngineError, Expense, ExpenseStatus, PeriodKey, ResultEngine,
    UpdateExpenseCmd, expenses, scope::require_scope_in_site,
};

use super::{Engine, ReallocationOutcome, normalize_required_title, with_tx};

/// Filters for listing expenses.
#[derive(Clone, Debug, Default)]
pub struct ExpenseListFilter {
    pub site_id: Option<String>,
    pub building_id: Option<Uuid>,
    pub period: Option<PeriodKey>,
    pub status: Option<ExpenseStatus>,
}

impl Engine {
    /// Creates an expense and its initial allocation set.
    ///
    /// `open_from` is the earliest accounting period still open for edits;
    /// expenses in earlier periods are rejected with `PeriodClosed` before
    /// any row is written.
    pub async fn create_expense(
        &self,
        cmd: CreateExpenseCmd,
        open_from: PeriodKey,
        now: DateTime<Utc>,
    ) -> ResultEngine<ReallocationOutcome> {
        if cmd.period.is_closed(open_from) {
            return Err(EngineError::PeriodClosed(cmd.period.to_string()));
        }
        let title = normalize_required_title(&cmd.title)?;
        let expense = Expense::new(
            title,
            cmd.category,
            cmd.amount,
            cmd.scope,
            cmd.distribution,
            cmd.period,
            now,
        )?;

        let (unit_count, degraded_to_equal) = with_tx!(self, |db_tx| {
            require_scope_in_site(&db_tx, &expense.scope).await?;
            expenses::ActiveModel::from(&expense).insert(&db_tx).await?;
            self.reallocate_in_tx(&db_tx, &expense).await
        })?;

        // Post-condition check against the committed rows; a failure here is
        // a strategy defect, not a user error.
        self.check_allocations(expense.id, expense.amount).await?;

        tracing::info!(
            expense_id = %expense.id,
            amount = %expense.amount,
            units = unit_count,
            "expense created and allocated"
        );
        Ok(ReallocationOutcome {
            expense,
            reallocated: true,
            unit_count,
            degraded_to_equal,
        })
    }

    /// Applies a patch to an expense.
    ///
    /// Reallocates only when `amount`, `scope` or `distribution` changed; a
    /// pure title/category/status edit leaves the allocation rows untouched.
    /// The stored version must match `cmd.expected_version`, otherwise
    /// `ConcurrentModification` is returned and the caller retries from a
    /// fresh read.
    pub async fn update_expense(
        &self,
        cmd: UpdateExpenseCmd,
        open_from: PeriodKey,
        now: DateTime<Utc>,
    ) -> ResultEngine<ReallocationOutcome> {
        let (updated, reallocated, unit_count, degraded_to_equal) = with_tx!(self, |db_tx| {
            let model = expenses::Entity::find_by_id(cmd.expense_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("expense not exists".to_string()))?;
            let existing = Expense::try_from(model)?;

            if existing.version != cmd.expected_version {
                return Err(EngineError::ConcurrentModification(format!(
                    "expected version {}, found {}",
                    cmd.expected_version, existing.version
                )));
            }
            if existing.period.is_closed(open_from) {
                return Err(EngineError::PeriodClosed(existing.period.to_string()));
            }

            let mut updated = existing.clone();
            if let Some(title) = &cmd.title {
                updated.title = normalize_required_title(title)?;
            }
            if let Some(category) = cmd.category {
                updated.category = category;
            }
            if let Some(amount) = cmd.amount {
                if amount.is_negative() {
                    return Err(EngineError::InvalidAmount(
                        "amount must not be negative".to_string(),
                    ));
                }
                updated.amount = amount;
            }
            if let Some(scope) = cmd.scope.clone() {
                updated.scope = scope;
            }
            if let Some(distribution) = cmd.distribution {
                updated.distribution = distribution;
            }
            if let Some(status) = cmd.status {
                updated.status = status;
            }

            let needs_reallocation = updated.amount != existing.amount
                || updated.scope != existing.scope
                || updated.distribution != existing.distribution;

            updated.version = existing.version + 1;
            updated.updated_at = now;

            let (unit_count, degraded_to_equal) = if needs_reallocation {
                require_scope_in_site(&db_tx, &updated.scope).await?;
                self.reallocate_in_tx(&db_tx, &updated).await?
            } else {
                (0, false)
            };

            expenses::ActiveModel::from(&updated).update(&db_tx).await?;

            Ok::<_, EngineError>((updated, needs_reallocation, unit_count, degraded_to_equal))
        })?;

        if reallocated {
            self.check_allocations(updated.id, updated.amount).await?;
            tracing::info!(
                expense_id = %updated.id,
                amount = %updated.amount,
                units = unit_count,
                "expense updated and reallocated"
            );
        }

        Ok(ReallocationOutcome {
            expense: updated,
            reallocated,
            unit_count,
            degraded_to_equal,
        })
    }

    /// Deletes an expense and cascades to its allocation rows, atomically.
    pub async fn delete_expense(
        &self,
        expense_id: Uuid,
        open_from: PeriodKey,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = expenses::Entity::find_by_id(expense_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("expense not exists".to_string()))?;
            let expense = Expense::try_from(model)?;

            if expense.period.is_closed(open_from) {
                return Err(EngineError::PeriodClosed(expense.period.to_string()));
            }

            self.delete_allocations(&db_tx, expense_id).await?;
            expenses::Entity::delete_by_id(expense_id.to_string())
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    /// Returns a single expense.
    pub async fn expense(&self, expense_id: Uuid) -> ResultEngine<Expense> {
        let model = expenses::Entity::find_by_id(expense_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("expense not exists".to_string()))?;
        Expense::try_from(model)
    }

    /// Lists expenses for the back-office roster, newest first.
    pub async fn list_expenses(&self, filter: &ExpenseListFilter) -> ResultEngine<Vec<Expense>> {
        let mut query = expenses::Entity::find();
        if let Some(site_id) = &filter.site_id {
            query = query.filter(expenses::Column::SiteId.eq(site_id.clone()));
        }
        if let Some(building_id) = filter.building_id {
            query = query.filter(expenses::Column::BuildingId.eq(building_id.to_string()));
        }
        if let Some(period) = filter.period {
            query = query.filter(expenses::Column::Period.eq(period.to_string()));
        }
        if let Some(status) = filter.status {
            query = query.filter(expenses::Column::Status.eq(status.as_str()));
        }

        let models = query
            .order_by_desc(expenses::Column::CreatedAt)
            .order_by_asc(expenses::Column::Id)
            .all(&self.database)
            .await?;
        models.into_iter().map(Expense::try_from).collect()
    }
}
