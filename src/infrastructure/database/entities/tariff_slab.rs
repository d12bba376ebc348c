//! Tariff slab entity

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tariff_slabs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub tariff_id: i32,

    pub slab_number: i32,

    pub from_units: String,

    /// NULL for the open-ended slab
    #[sea_orm(nullable)]
    pub to_units: Option<String>,

    pub rate_per_unit: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tariff::Entity",
        from = "Column::TariffId",
        to = "super::tariff::Column::Id"
    )]
    Tariff,
}

impl Related<super::tariff::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tariff.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
