//! Bill line item entity

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "bill_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub bill_id: i32,

    /// Order of the item on the bill
    pub position: i32,

    pub item_type: String,

    pub description: String,

    #[sea_orm(nullable)]
    pub units: Option<String>,

    #[sea_orm(nullable)]
    pub rate: Option<String>,

    #[sea_orm(nullable)]
    pub slab_number: Option<i32>,

    pub amount: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bill::Entity",
        from = "Column::BillId",
        to = "super::bill::Column::Id"
    )]
    Bill,
}

impl Related<super::bill::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bill.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
