//! Command structs for engine operations.
//!
//! These types group parameters for write operations (create/update),
//! keeping call sites readable and avoiding long argument lists.

use uuid::Uuid;

use crate::{
    DistributionKind, ExpenseCategory, ExpenseScope, ExpenseStatus, MoneyCents, PeriodKey,
};

/// Create an expense and its initial allocation set.
#[derive(Clone, Debug)]
pub struct CreateExpenseCmd {
    pub title: String,
    pub category: ExpenseCategory,
    pub amount: MoneyCents,
    pub scope: ExpenseScope,
    pub distribution: DistributionKind,
    pub period: PeriodKey,
}

impl CreateExpenseCmd {
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        amount: MoneyCents,
        scope: ExpenseScope,
        period: PeriodKey,
    ) -> Self {
        Self {
            title: title.into(),
            category: ExpenseCategory::General,
            amount,
            scope,
            distribution: DistributionKind::Equal,
            period,
        }
    }

    #[must_use]
    pub fn category(mut self, category: ExpenseCategory) -> Self {
        self.category = category;
        self
    }

    #[must_use]
    pub fn distribution(mut self, distribution: DistributionKind) -> Self {
        self.distribution = distribution;
        self
    }
}

/// Patch an existing expense.
///
/// `expected_version` backs the optimistic concurrency check: the update is
/// rejected with `ConcurrentModification` when the stored version differs.
/// Only `amount`, `scope` and `distribution` changes trigger reallocation;
/// title/category/status edits leave the allocation set untouched.
#[derive(Clone, Debug, Default)]
pub struct UpdateExpenseCmd {
    pub expense_id: Uuid,
    pub expected_version: i64,
    pub title: Option<String>,
    pub category: Option<ExpenseCategory>,
    pub amount: Option<MoneyCents>,
    pub scope: Option<ExpenseScope>,
    pub distribution: Option<DistributionKind>,
    pub status: Option<ExpenseStatus>,
}

impl UpdateExpenseCmd {
    #[must_use]
    pub fn new(expense_id: Uuid, expected_version: i64) -> Self {
        Self {
            expense_id,
            expected_version,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn category(mut self, category: ExpenseCategory) -> Self {
        self.category = Some(category);
        self
    }

    #[must_use]
    pub fn amount(mut self, amount: MoneyCents) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn scope(mut self, scope: ExpenseScope) -> Self {
        self.scope = Some(scope);
        self
    }

    #[must_use]
    pub fn distribution(mut self, distribution: DistributionKind) -> Self {
        self.distribution = Some(distribution);
        self
    }

    #[must_use]
    pub fn status(mut self, status: ExpenseStatus) -> Self {
        self.status = Some(status);
        self
    }
}
