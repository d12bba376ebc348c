//! Bill entity

use sea_orm::entity::prelude::*;

/// Issued bill with its charge totals. Amounts are stored as decimal text.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "bills")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// e.g., "BILL-2024-000001"
    #[sea_orm(unique)]
    pub bill_number: String,

    pub customer_id: i32,

    pub meter_id: i32,

    pub tariff_id: i32,

    pub billing_period_start: Date,

    pub billing_period_end: Date,

    pub issue_date: Date,

    pub due_date: Date,

    pub previous_reading: String,

    pub current_reading: String,

    pub consumption: String,

    pub energy_charges: String,

    pub fixed_charges: String,

    pub tax_amount: String,

    pub discount: String,

    pub minimum_charge_adjustment: String,

    pub previous_balance: String,

    pub late_fee: String,

    pub total_amount: String,

    pub paid_amount: String,

    pub remaining_amount: String,

    /// pending | partially_paid | paid | overdue | cancelled
    pub status: String,

    /// Optimistic concurrency counter
    pub version: i32,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bill_item::Entity")]
    BillItem,
    #[sea_orm(has_many = "super::payment::Entity")]
    Payment,
}

impl Related<super::bill_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BillItem.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
