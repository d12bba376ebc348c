//! SeaORM implementation of BillRepository

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, info};

use super::mapping::{db_err, decimal, opt_decimal, parse_enum};
use crate::domain::bill::{
    Bill, BillCharges, BillFilter, BillLineItem, BillReference, BillRepository,
};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::{bill, bill_item};

// ── Conversion helpers ──────────────────────────────────────────

fn item_to_domain(i: bill_item::Model) -> DomainResult<BillLineItem> {
    Ok(BillLineItem {
        item_type: parse_enum(&i.item_type, "bill_items.item_type")?,
        units: opt_decimal(i.units.as_deref(), "bill_items.units")?,
        rate: opt_decimal(i.rate.as_deref(), "bill_items.rate")?,
        slab_number: i.slab_number.map(|n| n as u32),
        amount: decimal(&i.amount, "bill_items.amount")?,
        description: i.description,
    })
}

fn entity_to_domain(b: bill::Model, items: Vec<bill_item::Model>) -> DomainResult<Bill> {
    let line_items = items
        .into_iter()
        .map(item_to_domain)
        .collect::<DomainResult<Vec<_>>>()?;

    Ok(Bill {
        id: b.id,
        reference: BillReference {
            customer_id: b.customer_id,
            meter_id: b.meter_id,
            tariff_id: b.tariff_id,
            billing_period_start: b.billing_period_start,
            billing_period_end: b.billing_period_end,
            issue_date: b.issue_date,
            due_date: b.due_date,
            previous_reading: decimal(&b.previous_reading, "bills.previous_reading")?,
            current_reading: decimal(&b.current_reading, "bills.current_reading")?,
        },
        charges: BillCharges {
            consumption: decimal(&b.consumption, "bills.consumption")?,
            energy_charges: decimal(&b.energy_charges, "bills.energy_charges")?,
            fixed_charges: decimal(&b.fixed_charges, "bills.fixed_charges")?,
            tax_amount: decimal(&b.tax_amount, "bills.tax_amount")?,
            discount: decimal(&b.discount, "bills.discount")?,
            minimum_charge_adjustment: decimal(
                &b.minimum_charge_adjustment,
                "bills.minimum_charge_adjustment",
            )?,
            previous_balance: decimal(&b.previous_balance, "bills.previous_balance")?,
            late_fee: decimal(&b.late_fee, "bills.late_fee")?,
            total_amount: decimal(&b.total_amount, "bills.total_amount")?,
            line_items,
        },
        paid_amount: decimal(&b.paid_amount, "bills.paid_amount")?,
        remaining_amount: decimal(&b.remaining_amount, "bills.remaining_amount")?,
        status: parse_enum(&b.status, "bills.status")?,
        bill_number: b.bill_number,
        version: b.version,
        created_at: b.created_at,
        updated_at: b.updated_at,
    })
}

fn to_active(b: &Bill) -> bill::ActiveModel {
    let r = &b.reference;
    let c = &b.charges;
    bill::ActiveModel {
        bill_number: Set(b.bill_number.clone()),
        customer_id: Set(r.customer_id),
        meter_id: Set(r.meter_id),
        tariff_id: Set(r.tariff_id),
        billing_period_start: Set(r.billing_period_start),
        billing_period_end: Set(r.billing_period_end),
        issue_date: Set(r.issue_date),
        due_date: Set(r.due_date),
        previous_reading: Set(r.previous_reading.to_string()),
        current_reading: Set(r.current_reading.to_string()),
        consumption: Set(c.consumption.to_string()),
        energy_charges: Set(c.energy_charges.to_string()),
        fixed_charges: Set(c.fixed_charges.to_string()),
        tax_amount: Set(c.tax_amount.to_string()),
        discount: Set(c.discount.to_string()),
        minimum_charge_adjustment: Set(c.minimum_charge_adjustment.to_string()),
        previous_balance: Set(c.previous_balance.to_string()),
        late_fee: Set(c.late_fee.to_string()),
        total_amount: Set(c.total_amount.to_string()),
        paid_amount: Set(b.paid_amount.to_string()),
        remaining_amount: Set(b.remaining_amount.to_string()),
        status: Set(b.status.to_string()),
        version: Set(b.version),
        created_at: Set(b.created_at),
        updated_at: Set(b.updated_at),
        ..Default::default()
    }
}

async fn insert_items<C: ConnectionTrait>(
    conn: &C,
    bill_id: i32,
    first_position: usize,
    items: &[BillLineItem],
) -> DomainResult<()> {
    for (offset, item) in items.iter().enumerate() {
        bill_item::ActiveModel {
            bill_id: Set(bill_id),
            position: Set((first_position + offset) as i32),
            item_type: Set(item.item_type.to_string()),
            description: Set(item.description.clone()),
            units: Set(item.units.map(|u| u.to_string())),
            rate: Set(item.rate.map(|r| r.to_string())),
            slab_number: Set(item.slab_number.map(|n| n as i32)),
            amount: Set(item.amount.to_string()),
            ..Default::default()
        }
        .insert(conn)
        .await
        .map_err(db_err)?;
    }
    Ok(())
}

async fn load_items<C: ConnectionTrait>(
    conn: &C,
    bill_id: i32,
) -> DomainResult<Vec<bill_item::Model>> {
    bill_item::Entity::find()
        .filter(bill_item::Column::BillId.eq(bill_id))
        .order_by_asc(bill_item::Column::Position)
        .all(conn)
        .await
        .map_err(db_err)
}

/// Version-checked write of the account fields, plus any appended items.
/// Used by both the bill and the payment repositories.
pub(super) async fn update_account_on<C: ConnectionTrait>(
    conn: &C,
    b: &Bill,
    expected_version: i32,
    new_items: &[BillLineItem],
) -> DomainResult<Bill> {
    let now = Utc::now();
    let next_version = expected_version + 1;

    let result = bill::Entity::update_many()
        .col_expr(bill::Column::PaidAmount, Expr::value(b.paid_amount.to_string()))
        .col_expr(
            bill::Column::RemainingAmount,
            Expr::value(b.remaining_amount.to_string()),
        )
        .col_expr(
            bill::Column::TotalAmount,
            Expr::value(b.charges.total_amount.to_string()),
        )
        .col_expr(bill::Column::LateFee, Expr::value(b.charges.late_fee.to_string()))
        .col_expr(bill::Column::Status, Expr::value(b.status.to_string()))
        .col_expr(bill::Column::Version, Expr::value(next_version))
        .col_expr(bill::Column::UpdatedAt, Expr::value(now))
        .filter(bill::Column::Id.eq(b.id))
        .filter(bill::Column::Version.eq(expected_version))
        .exec(conn)
        .await
        .map_err(db_err)?;

    if result.rows_affected == 0 {
        let exists = bill::Entity::find_by_id(b.id)
            .one(conn)
            .await
            .map_err(db_err)?;
        return Err(match exists {
            Some(current) => DomainError::Conflict(format!(
                "bill {} was modified concurrently (expected version {expected_version}, found {})",
                b.id, current.version
            )),
            None => DomainError::not_found("Bill", "id", b.id),
        });
    }

    if !new_items.is_empty() {
        let stored = load_items(conn, b.id).await?;
        insert_items(conn, b.id, stored.len(), new_items).await?;
    }

    let model = bill::Entity::find_by_id(b.id)
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| DomainError::not_found("Bill", "id", b.id))?;
    let items = load_items(conn, b.id).await?;
    debug!(bill_id = b.id, version = next_version, "Bill account updated");
    entity_to_domain(model, items)
}

fn apply_filter(
    mut query: sea_orm::Select<bill::Entity>,
    filter: &BillFilter,
) -> sea_orm::Select<bill::Entity> {
    if let Some(customer_id) = filter.customer_id {
        query = query.filter(bill::Column::CustomerId.eq(customer_id));
    }
    if let Some(meter_id) = filter.meter_id {
        query = query.filter(bill::Column::MeterId.eq(meter_id));
    }
    if let Some(status) = filter.status {
        query = query.filter(bill::Column::Status.eq(status.as_str()));
    }
    query
}

// ── SeaOrmBillRepository ────────────────────────────────────────

pub struct SeaOrmBillRepository {
    db: DatabaseConnection,
}

impl SeaOrmBillRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BillRepository for SeaOrmBillRepository {
    async fn save(&self, b: Bill) -> DomainResult<Bill> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let saved = to_active(&b).insert(&txn).await.map_err(db_err)?;
        insert_items(&txn, saved.id, 0, &b.charges.line_items).await?;
        let items = load_items(&txn, saved.id).await?;
        txn.commit().await.map_err(db_err)?;

        info!(bill_id = saved.id, bill_number = %saved.bill_number, "Bill saved");
        entity_to_domain(saved, items)
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Bill>> {
        let Some(model) = bill::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
        else {
            return Ok(None);
        };
        let items = load_items(&self.db, id).await?;
        entity_to_domain(model, items).map(Some)
    }

    async fn find_by_number(&self, bill_number: &str) -> DomainResult<Option<Bill>> {
        let Some(model) = bill::Entity::find()
            .filter(bill::Column::BillNumber.eq(bill_number))
            .one(&self.db)
            .await
            .map_err(db_err)?
        else {
            return Ok(None);
        };
        let items = load_items(&self.db, model.id).await?;
        entity_to_domain(model, items).map(Some)
    }

    async fn list(
        &self,
        filter: &BillFilter,
        page: u64,
        limit: u64,
    ) -> DomainResult<(Vec<Bill>, u64)> {
        let paginator = apply_filter(bill::Entity::find(), filter)
            .order_by_desc(bill::Column::Id)
            .paginate(&self.db, limit.max(1));
        let total = paginator.num_items().await.map_err(db_err)?;
        let models = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(db_err)?;

        let ids: Vec<i32> = models.iter().map(|m| m.id).collect();
        let mut items_by_bill: HashMap<i32, Vec<bill_item::Model>> = HashMap::new();
        for item in bill_item::Entity::find()
            .filter(bill_item::Column::BillId.is_in(ids))
            .order_by_asc(bill_item::Column::Position)
            .all(&self.db)
            .await
            .map_err(db_err)?
        {
            items_by_bill.entry(item.bill_id).or_default().push(item);
        }

        let bills = models
            .into_iter()
            .map(|m| {
                let items = items_by_bill.remove(&m.id).unwrap_or_default();
                entity_to_domain(m, items)
            })
            .collect::<DomainResult<Vec<_>>>()?;
        Ok((bills, total))
    }

    async fn count_numbered(&self, prefix: &str, year: i32) -> DomainResult<u64> {
        bill::Entity::find()
            .filter(bill::Column::BillNumber.starts_with(format!("{prefix}-{year}-")))
            .count(&self.db)
            .await
            .map_err(db_err)
    }

    async fn update_account(
        &self,
        b: &Bill,
        expected_version: i32,
        new_items: &[BillLineItem],
    ) -> DomainResult<Bill> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let updated = update_account_on(&txn, b, expected_version, new_items).await?;
        txn.commit().await.map_err(db_err)?;
        Ok(updated)
    }
}
