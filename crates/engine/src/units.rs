//! Residential unit directory entity.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

use crate::EngineError;

/// A unit as seen by the allocation engine.
///
/// This is the slice of directory data a distribution needs: identity,
/// building membership (for the breakdown view and stable ordering) and the
/// floor area backing the `AreaWeighted` strategy. `floor_area_m2` is
/// nullable; a missing or zero area means the unit gets a zero weight.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitRef {
    pub id: Uuid,
    pub building_id: Uuid,
    pub number: String,
    pub floor_area_m2: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "units")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub building_id: String,
    /// Door label ("1", "2A", ...). Part of the stable scope ordering.
    pub number: String,
    pub floor_area_m2: Option<f64>,
    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::buildings::Entity",
        from = "Column::BuildingId",
        to = "super::buildings::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Buildings,
    #[sea_orm(has_many = "super::allocations::Entity")]
    Allocations,
}

impl Related<super::buildings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Buildings.def()
    }
}

impl Related<super::allocations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Allocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for UnitRef {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("unit not exists".to_string()))?,
            building_id: Uuid::parse_str(&model.building_id)
                .map_err(|_| EngineError::KeyNotFound("building not exists".to_string()))?,
            number: model.number,
            floor_area_m2: model.floor_area_m2,
        })
    }
}
