//! SeaORM implementation of PaymentRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::info;

use super::bill_repository::update_account_on;
use super::mapping::{db_err, decimal, parse_enum};
use crate::domain::bill::Bill;
use crate::domain::payment::{Payment, PaymentRepository};
use crate::domain::DomainResult;
use crate::infrastructure::database::entities::payment;

fn entity_to_domain(p: payment::Model) -> DomainResult<Payment> {
    Ok(Payment {
        id: p.id,
        amount: decimal(&p.amount, "payments.amount")?,
        method: parse_enum(&p.method, "payments.method")?,
        payment_number: p.payment_number,
        bill_id: p.bill_id,
        customer_id: p.customer_id,
        reference: p.reference,
        notes: p.notes,
        paid_at: p.paid_at,
        created_at: p.created_at,
    })
}

pub struct SeaOrmPaymentRepository {
    db: DatabaseConnection,
}

impl SeaOrmPaymentRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PaymentRepository for SeaOrmPaymentRepository {
    async fn record(
        &self,
        bill: &Bill,
        expected_version: i32,
        p: Payment,
    ) -> DomainResult<(Bill, Payment)> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let updated = update_account_on(&txn, bill, expected_version, &[]).await?;

        let saved = payment::ActiveModel {
            payment_number: Set(p.payment_number),
            bill_id: Set(p.bill_id),
            customer_id: Set(p.customer_id),
            amount: Set(p.amount.to_string()),
            method: Set(p.method.to_string()),
            reference: Set(p.reference),
            notes: Set(p.notes),
            paid_at: Set(p.paid_at),
            created_at: Set(p.created_at),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        info!(
            payment_id = saved.id,
            bill_id = saved.bill_id,
            amount = %saved.amount,
            "Payment saved"
        );
        Ok((updated, entity_to_domain(saved)?))
    }

    async fn find_by_bill(&self, bill_id: i32) -> DomainResult<Vec<Payment>> {
        payment::Entity::find()
            .filter(payment::Column::BillId.eq(bill_id))
            .order_by_asc(payment::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(entity_to_domain)
            .collect()
    }
}
