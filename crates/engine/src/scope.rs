//! Expense scope and its resolution against the unit directory.
//!
//! A scope is either an entire site or one building within it. Resolution
//! returns the eligible units in a stable order (building id, unit number,
//! unit id) so that remainder distribution is deterministic and reproducible.

use sea_orm::{ConnectionTrait, JoinType, QueryFilter, QueryOrder, QuerySelect, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, UnitRef, buildings, units};

/// The set of units an expense applies to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum ExpenseScope {
    /// Every active unit of every active building of the site.
    Site { site_id: String },
    /// Every active unit of one building. The building must belong to the
    /// declared site.
    Building { site_id: String, building_id: Uuid },
}

impl ExpenseScope {
    #[must_use]
    pub fn site_id(&self) -> &str {
        match self {
            Self::Site { site_id } | Self::Building { site_id, .. } => site_id,
        }
    }

    #[must_use]
    pub fn building_id(&self) -> Option<Uuid> {
        match self {
            Self::Site { .. } => None,
            Self::Building { building_id, .. } => Some(*building_id),
        }
    }
}

/// Resolves a scope to its ordered list of eligible units.
///
/// Soft-deleted units and units of soft-deleted buildings are excluded. An
/// empty result is an [`EngineError::EmptyScope`]: a non-zero expense must
/// never be silently allocated to zero units.
pub async fn resolve_scope<C>(db: &C, scope: &ExpenseScope) -> ResultEngine<Vec<UnitRef>>
where
    C: ConnectionTrait,
{
    let mut query = units::Entity::find()
        .filter(units::Column::Active.eq(true))
        .join(JoinType::InnerJoin, units::Relation::Buildings.def())
        .filter(buildings::Column::Active.eq(true))
        .filter(buildings::Column::SiteId.eq(scope.site_id().to_string()));

    if let Some(building_id) = scope.building_id() {
        query = query.filter(units::Column::BuildingId.eq(building_id.to_string()));
    }

    let models = query
        .order_by_asc(units::Column::BuildingId)
        .order_by_asc(units::Column::Number)
        .order_by_asc(units::Column::Id)
        .all(db)
        .await?;

    if models.is_empty() {
        return Err(EngineError::EmptyScope(match scope.building_id() {
            Some(building_id) => format!("building {building_id}"),
            None => format!("site {}", scope.site_id()),
        }));
    }

    models.into_iter().map(UnitRef::try_from).collect()
}

/// Confirms that a building-scoped expense points at a building of its own
/// site. Site-wide scopes pass trivially.
pub(crate) async fn require_scope_in_site<C>(db: &C, scope: &ExpenseScope) -> ResultEngine<()>
where
    C: ConnectionTrait,
{
    let Some(building_id) = scope.building_id() else {
        return Ok(());
    };

    let building = buildings::Entity::find_by_id(building_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound("building not exists".to_string()))?;

    if building.site_id != scope.site_id() {
        return Err(EngineError::InvalidScope(format!(
            "building {building_id} does not belong to site {}",
            scope.site_id()
        )));
    }
    Ok(())
}
