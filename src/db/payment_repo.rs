// src/db/payment_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        finance::{Payment, PaymentMethod, PaymentView},
        page::PageRequest,
    },
};

const PAYMENT_COLUMNS: &str =
    "id, customer_id, payment_date, amount, method, memo, created_by, created_at, updated_at";

pub struct PaymentRecord<'a> {
    pub customer_id: Uuid,
    pub payment_date: NaiveDate,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub memo: Option<&'a str>,
}

#[derive(Clone)]
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        record: &PaymentRecord<'_>,
        created_by: Uuid,
    ) -> Result<Payment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO payments (customer_id, payment_date, amount, method, memo, created_by)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {PAYMENT_COLUMNS}"
        );
        let payment = sqlx::query_as::<_, Payment>(&sql)
            .bind(record.customer_id)
            .bind(record.payment_date)
            .bind(record.amount)
            .bind(record.method)
            .bind(record.memo)
            .bind(created_by)
            .fetch_one(executor)
            .await?;
        Ok(payment)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        record: &PaymentRecord<'_>,
    ) -> Result<Option<Payment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "UPDATE payments
             SET customer_id = $2, payment_date = $3, amount = $4, method = $5, memo = $6,
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {PAYMENT_COLUMNS}"
        );
        let payment = sqlx::query_as::<_, Payment>(&sql)
            .bind(id)
            .bind(record.customer_id)
            .bind(record.payment_date)
            .bind(record.amount)
            .bind(record.method)
            .bind(record.memo)
            .fetch_optional(executor)
            .await?;
        Ok(payment)
    }

    pub async fn find_view<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<PaymentView>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let view = sqlx::query_as::<_, PaymentView>(
            r#"
            SELECT
                p.id, p.customer_id, p.payment_date, p.amount, p.method, p.memo,
                p.created_by, p.created_at, p.updated_at,
                c.name AS customer_name,
                1::BIGINT AS total_count,
                p.amount AS period_amount
            FROM payments p
            JOIN customers c ON c.id = p.customer_id
            WHERE p.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(view)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM payments WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Pagamentos do período [start, end), mais recentes primeiro.
    pub async fn list<'e, E>(
        &self,
        executor: E,
        start: NaiveDate,
        end: NaiveDate,
        customer_id: Option<Uuid>,
        page: PageRequest,
    ) -> Result<Vec<PaymentView>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT
                p.id, p.customer_id, p.payment_date, p.amount, p.method, p.memo,
                p.created_by, p.created_at, p.updated_at,
                c.name AS customer_name,
                COUNT(*) OVER() AS total_count,
                COALESCE(SUM(p.amount) OVER(), 0) AS period_amount
            FROM payments p
            JOIN customers c ON c.id = p.customer_id
            WHERE p.payment_date >= "#,
        );
        qb.push_bind(start).push(" AND p.payment_date < ").push_bind(end);

        if let Some(customer_id) = customer_id {
            qb.push(" AND p.customer_id = ").push_bind(customer_id);
        }

        qb.push(" ORDER BY p.payment_date DESC, c.name, p.id")
            .push(" LIMIT ")
            .push_bind(page.per_page)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let payments = qb.build_query_as::<PaymentView>().fetch_all(executor).await?;
        Ok(payments)
    }
}
