//! Tariff snapshot entity

use sea_orm::entity::prelude::*;

/// One immutable tariff snapshot. Amounts are stored as decimal text.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tariffs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Unique tariff code (e.g., "RES-2024")
    #[sea_orm(unique)]
    pub code: String,

    pub name: String,

    #[sea_orm(nullable)]
    pub description: Option<String>,

    /// residential | commercial | industrial | agricultural
    pub connection_type: String,

    pub effective_from: Date,

    /// Exclusive end of the effective range
    #[sea_orm(nullable)]
    pub effective_to: Option<Date>,

    pub fixed_charge: String,

    pub minimum_charge: String,

    pub tax_percentage: String,

    /// Currency code (ISO 4217, e.g., "SAR")
    pub currency: String,

    /// monthly | bimonthly | quarterly
    pub billing_cycle: String,

    /// Snapshot this one replaced
    #[sea_orm(nullable)]
    pub supersedes: Option<i32>,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::tariff_slab::Entity")]
    TariffSlab,
}

impl Related<super::tariff_slab::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TariffSlab.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
