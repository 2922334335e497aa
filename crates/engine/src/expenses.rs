//! Expense records.
//!
//! An `Expense` is a single recorded cost (e.g. "elevator maintenance,
//! 3500.00 TRY") with a scope, a distribution strategy and a period. The
//! per-unit split lives in [`allocations`](crate::allocations); editing the
//! amount, scope or distribution regenerates that split in full.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Currency, DistributionKind, EngineError, ExpenseScope, MoneyCents, PeriodKey, ResultEngine,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    Maintenance,
    Utilities,
    Personnel,
    General,
    Other,
}

impl ExpenseCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Maintenance => "maintenance",
            Self::Utilities => "utilities",
            Self::Personnel => "personnel",
            Self::General => "general",
            Self::Other => "other",
        }
    }
}

impl TryFrom<&str> for ExpenseCategory {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "maintenance" => Ok(Self::Maintenance),
            "utilities" => Ok(Self::Utilities),
            "personnel" => Ok(Self::Personnel),
            "general" => Ok(Self::General),
            "other" => Ok(Self::Other),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid expense category: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseStatus {
    Pending,
    Paid,
}

impl ExpenseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
        }
    }
}

impl TryFrom<&str> for ExpenseStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid expense status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Expense {
    pub id: Uuid,
    pub title: String,
    pub category: ExpenseCategory,
    pub amount: MoneyCents,
    pub currency: Currency,
    pub scope: ExpenseScope,
    pub distribution: DistributionKind,
    pub status: ExpenseStatus,
    pub period: PeriodKey,
    /// Optimistic-lock counter; bumped on every successful update.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        title: String,
        category: ExpenseCategory,
        amount: MoneyCents,
        scope: ExpenseScope,
        distribution: DistributionKind,
        period: PeriodKey,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if amount.is_negative() {
            return Err(EngineError::InvalidAmount(
                "amount must not be negative".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            title,
            category,
            amount,
            currency: Currency::default(),
            scope,
            distribution,
            status: ExpenseStatus::Pending,
            period,
            version: 1,
            created_at,
            updated_at: created_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    pub category: String,
    pub amount_minor: i64,
    pub currency: String,
    pub site_id: String,
    pub building_id: Option<String>,
    pub distribution: String,
    pub status: String,
    pub period: String,
    pub version: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::allocations::Entity")]
    Allocations,
}

impl Related<super::allocations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Allocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Expense> for ActiveModel {
    fn from(expense: &Expense) -> Self {
        Self {
            id: ActiveValue::Set(expense.id.to_string()),
            title: ActiveValue::Set(expense.title.clone()),
            category: ActiveValue::Set(expense.category.as_str().to_string()),
            amount_minor: ActiveValue::Set(expense.amount.cents()),
            currency: ActiveValue::Set(expense.currency.code().to_string()),
            site_id: ActiveValue::Set(expense.scope.site_id().to_string()),
            building_id: ActiveValue::Set(expense.scope.building_id().map(|id| id.to_string())),
            distribution: ActiveValue::Set(expense.distribution.as_str().to_string()),
            status: ActiveValue::Set(expense.status.as_str().to_string()),
            period: ActiveValue::Set(expense.period.to_string()),
            version: ActiveValue::Set(expense.version),
            created_at: ActiveValue::Set(expense.created_at),
            updated_at: ActiveValue::Set(expense.updated_at),
        }
    }
}

impl TryFrom<Model> for Expense {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let scope = match model.building_id {
            Some(raw) => ExpenseScope::Building {
                site_id: model.site_id,
                building_id: Uuid::parse_str(&raw)
                    .map_err(|_| EngineError::KeyNotFound("building not exists".to_string()))?,
            },
            None => ExpenseScope::Site {
                site_id: model.site_id,
            },
        };

        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("expense not exists".to_string()))?,
            title: model.title,
            category: ExpenseCategory::try_from(model.category.as_str())?,
            amount: MoneyCents::new(model.amount_minor),
            currency: Currency::try_from(model.currency.as_str()).unwrap_or_default(),
            scope,
            distribution: DistributionKind::try_from(model.distribution.as_str())?,
            status: ExpenseStatus::try_from(model.status.as_str())?,
            period: model.period.parse()?,
            version: model.version,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
