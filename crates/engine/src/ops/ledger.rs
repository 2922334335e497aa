//! Allocation ledger.
//!
//! Owns the persisted allocation rows for an expense. The only write path
//! is full-set replacement inside an open database transaction, so readers
//! never observe a partially rewritten set.

use std::collections::HashMap;

use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{Allocation, EngineError, MoneyCents, ResultEngine, allocations, buildings, units};

use super::Engine;

/// One row of the allocation breakdown shown on an expense detail view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllocationBreakdownRow {
    pub unit_id: Uuid,
    pub unit_number: String,
    pub building_name: String,
    pub amount: MoneyCents,
}

impl Engine {
    /// Replaces the full allocation set of `expense_id` with `new_allocations`.
    ///
    /// Runs inside the caller's transaction: either every old row is gone
    /// and every new row inserted, or (on rollback) the previous set stays
    /// intact.
    pub(super) async fn replace_allocations(
        &self,
        db_tx: &DatabaseTransaction,
        expense_id: Uuid,
        new_allocations: &[Allocation],
    ) -> ResultEngine<()> {
        allocations::Entity::delete_many()
            .filter(allocations::Column::ExpenseId.eq(expense_id.to_string()))
            .exec(db_tx)
            .await?;

        for allocation in new_allocations {
            allocations::ActiveModel::from(allocation).insert(db_tx).await?;
        }
        Ok(())
    }

    /// Deletes every allocation row of `expense_id` inside the caller's
    /// transaction. Used on expense deletion.
    pub(super) async fn delete_allocations(
        &self,
        db_tx: &DatabaseTransaction,
        expense_id: Uuid,
    ) -> ResultEngine<()> {
        allocations::Entity::delete_many()
            .filter(allocations::Column::ExpenseId.eq(expense_id.to_string()))
            .exec(db_tx)
            .await?;
        Ok(())
    }

    /// Returns the raw allocation rows of an expense, in scope order
    /// (building id, unit number, unit id).
    pub async fn allocations(&self, expense_id: Uuid) -> ResultEngine<Vec<Allocation>> {
        let rows = self.allocation_rows_with_units(expense_id).await?;
        rows.into_iter()
            .map(|(model, _)| Allocation::try_from(model))
            .collect()
    }

    /// Returns the allocation breakdown of an expense joined with unit and
    /// building labels, for detail views.
    pub async fn allocation_breakdown(
        &self,
        expense_id: Uuid,
    ) -> ResultEngine<Vec<AllocationBreakdownRow>> {
        let rows = self.allocation_rows_with_units(expense_id).await?;

        let building_ids: Vec<String> = rows
            .iter()
            .filter_map(|(_, unit)| unit.as_ref().map(|u| u.building_id.clone()))
            .collect();
        let building_names: HashMap<String, String> = buildings::Entity::find()
            .filter(buildings::Column::Id.is_in(building_ids))
            .all(&self.database)
            .await?
            .into_iter()
            .map(|b| (b.id, b.name))
            .collect();

        let mut breakdown = Vec::with_capacity(rows.len());
        for (model, unit) in rows {
            let unit = unit.ok_or_else(|| {
                EngineError::KeyNotFound("unit not exists".to_string())
            })?;
            let building_name = building_names
                .get(&unit.building_id)
                .cloned()
                .unwrap_or_default();
            breakdown.push(AllocationBreakdownRow {
                unit_id: Uuid::parse_str(&model.unit_id)
                    .map_err(|_| EngineError::KeyNotFound("unit not exists".to_string()))?,
                unit_number: unit.number,
                building_name,
                amount: MoneyCents::new(model.amount_minor),
            });
        }
        Ok(breakdown)
    }

    /// Allocation rows joined with their units, sorted in scope order so
    /// detail views read the same way the resolver allocated.
    async fn allocation_rows_with_units(
        &self,
        expense_id: Uuid,
    ) -> ResultEngine<Vec<(allocations::Model, Option<units::Model>)>> {
        let mut rows: Vec<(allocations::Model, Option<units::Model>)> = allocations::Entity::find()
            .filter(allocations::Column::ExpenseId.eq(expense_id.to_string()))
            .find_also_related(units::Entity)
            .all(&self.database)
            .await?;

        rows.sort_by(|(a_model, a_unit), (b_model, b_unit)| {
            let a_key = a_unit
                .as_ref()
                .map(|u| (u.building_id.clone(), u.number.clone()));
            let b_key = b_unit
                .as_ref()
                .map(|u| (u.building_id.clone(), u.number.clone()));
            a_key
                .cmp(&b_key)
                .then_with(|| a_model.unit_id.cmp(&b_model.unit_id))
        });
        Ok(rows)
    }
}
