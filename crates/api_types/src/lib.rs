use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Try,
}

pub mod expense {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ExpenseCategory {
        Maintenance,
        Utilities,
        Personnel,
        General,
        Other,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ExpenseStatus {
        Pending,
        Paid,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum DistributionType {
        Equal,
        AreaWeighted,
    }

    /// Declared scope of an expense.
    ///
    /// `building_id` present means the expense applies to that building
    /// only; absent means the whole site.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ScopeView {
        pub site_id: String,
        pub building_id: Option<Uuid>,
    }

    /// Request body for creating an expense.
    ///
    /// `amount` is a decimal string with at most 2 fraction digits, e.g.
    /// `"3500.00"`.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub title: String,
        pub category: ExpenseCategory,
        pub amount: String,
        pub site_id: String,
        pub building_id: Option<Uuid>,
        pub distribution: DistributionType,
        /// Accounting period, `"YYYY-MM"`.
        pub period: String,
    }

    /// Request body for patching an expense.
    ///
    /// `version` must be the version from the client's last read; the server
    /// answers 409 when it no longer matches.
    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseUpdate {
        pub version: i64,
        pub title: Option<String>,
        pub category: Option<ExpenseCategory>,
        pub amount: Option<String>,
        pub site_id: Option<String>,
        pub building_id: Option<Uuid>,
        pub distribution: Option<DistributionType>,
        pub status: Option<ExpenseStatus>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ExpenseView {
        pub id: Uuid,
        pub title: String,
        pub category: ExpenseCategory,
        /// Decimal string with exactly 2 fraction digits.
        pub amount: String,
        pub currency: Currency,
        pub scope: ScopeView,
        pub distribution: DistributionType,
        pub status: ExpenseStatus,
        pub period: String,
        pub version: i64,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    /// Response for create/update: the stored expense plus allocation
    /// notices.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ExpenseWriteResponse {
        pub expense: ExpenseView,
        /// Number of units the amount was allocated across (0 when the edit
        /// did not touch the allocation set).
        pub allocated_units: usize,
        /// The area-weighted split fell back to an equal one for lack of
        /// floor-area data. A notice, not an error.
        pub degraded_to_equal: bool,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ExpenseListResponse {
        pub expenses: Vec<ExpenseView>,
    }
}

pub mod allocation {
    use super::*;

    /// One row of the allocation breakdown shown under an expense.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct AllocationView {
        pub unit_id: Uuid,
        pub unit_number: String,
        pub building_name: String,
        /// Decimal string with exactly 2 fraction digits.
        pub amount: String,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct AllocationListResponse {
        pub expense_id: Uuid,
        pub allocations: Vec<AllocationView>,
        /// Sum of all rows, equal to the expense amount.
        pub total: String,
    }
}

pub mod audit {
    use super::*;

    /// One expense whose persisted allocations no longer sum to its amount.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct AuditFindingView {
        pub expense_id: Uuid,
        pub expected: String,
        pub actual: String,
        pub delta: String,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct AuditReport {
        pub findings: Vec<AuditFindingView>,
        /// `true` when every expense balances.
        pub clean: bool,
    }
}
