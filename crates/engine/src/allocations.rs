//! Expense allocations.
//!
//! An [`Allocation`] is one unit's persisted share of one expense. Rows are
//! immutable snapshots: the coordinator only ever replaces the full set for
//! an expense, never patches individual rows. Exactly one row exists per
//! `(expense_id, unit_id)` pair while the set is current.

use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{Currency, EngineError, MoneyCents};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Allocation {
    pub id: Uuid,
    pub expense_id: Uuid,
    pub unit_id: Uuid,
    pub amount: MoneyCents,
    pub currency: Currency,
}

impl Allocation {
    pub fn new(expense_id: Uuid, unit_id: Uuid, amount: MoneyCents, currency: Currency) -> Self {
        Self {
            id: Uuid::new_v4(),
            expense_id,
            unit_id,
            amount,
            currency,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expense_allocations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub expense_id: String,
    pub unit_id: String,
    pub amount_minor: i64,
    pub currency: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::expenses::Entity",
        from = "Column::ExpenseId",
        to = "super::expenses::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Expenses,
    #[sea_orm(
        belongs_to = "super::units::Entity",
        from = "Column::UnitId",
        to = "super::units::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Units,
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl Related<super::units::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Units.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Allocation> for ActiveModel {
    fn from(allocation: &Allocation) -> Self {
        Self {
            id: ActiveValue::Set(allocation.id.to_string()),
            expense_id: ActiveValue::Set(allocation.expense_id.to_string()),
            unit_id: ActiveValue::Set(allocation.unit_id.to_string()),
            amount_minor: ActiveValue::Set(allocation.amount.cents()),
            currency: ActiveValue::Set(allocation.currency.code().to_string()),
        }
    }
}

impl TryFrom<Model> for Allocation {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("allocation not exists".to_string()))?,
            expense_id: Uuid::parse_str(&model.expense_id)
                .map_err(|_| EngineError::KeyNotFound("expense not exists".to_string()))?,
            unit_id: Uuid::parse_str(&model.unit_id)
                .map_err(|_| EngineError::KeyNotFound("unit not exists".to_string()))?,
            amount: MoneyCents::new(model.amount_minor),
            currency: Currency::try_from(model.currency.as_str()).unwrap_or_default(),
        })
    }
}
