// src/db/customer_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{like_pattern, map_constraint_error},
        error::AppError,
    },
    models::{
        page::PageRequest,
        registry::{BalanceFilter, Customer, CustomerBalanceRow, CustomerFilter, CustomerSort},
    },
};

const CUSTOMER_COLUMNS: &str = "id, name, tax_id, phone, address, is_active, created_at";

/// Campos gravados de um cliente (já normalizados).
pub struct CustomerRecord<'a> {
    pub name: &'a str,
    pub tax_id: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub address: Option<&'a str>,
    pub is_active: bool,
}

#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn create<'e, E>(&self, executor: E, record: &CustomerRecord<'_>) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO customers (name, tax_id, phone, address, is_active)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {CUSTOMER_COLUMNS}"
        );
        sqlx::query_as::<_, Customer>(&sql)
            .bind(record.name)
            .bind(record.tax_id)
            .bind(record.phone)
            .bind(record.address)
            .bind(record.is_active)
            .fetch_one(executor)
            .await
            .map_err(|e| map_constraint_error(e, &format!("Cliente '{}'", record.name)))
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        record: &CustomerRecord<'_>,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "UPDATE customers
             SET name = $2, tax_id = $3, phone = $4, address = $5, is_active = $6
             WHERE id = $1
             RETURNING {CUSTOMER_COLUMNS}"
        );
        sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .bind(record.name)
            .bind(record.tax_id)
            .bind(record.phone)
            .bind(record.address)
            .bind(record.is_active)
            .fetch_optional(executor)
            .await
            .map_err(|e| map_constraint_error(e, &format!("Cliente '{}'", record.name)))
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1");
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(customer)
    }

    /// Exclusão bloqueada (RESTRICT) quando há romaneios ou pagamentos.
    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await
            .map_err(|e| map_constraint_error(e, "Cliente possui romaneios ou pagamentos"))?;
        Ok(result.rows_affected() > 0)
    }

    /// Totais do cliente: (soma dos pagamentos, soma do valor líquido dos romaneios).
    pub async fn balance_of<'e, E>(&self, executor: E, id: Uuid) -> Result<(Decimal, Decimal), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let totals: (Decimal, Decimal) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COALESCE(SUM(amount), 0)::numeric(15, 2) FROM payments WHERE customer_id = $1),
                (SELECT COALESCE(SUM(net_value), 0)::numeric(15, 2) FROM delivery_notes WHERE customer_id = $1)
            "#,
        )
        .bind(id)
        .fetch_one(executor)
        .await?;
        Ok(totals)
    }

    /// Listagem com saldo calculado no banco (sem N+1): um LATERAL por coleção.
    /// `page = None` devolve todas as linhas (exportação).
    pub async fn list_with_balance<'e, E>(
        &self,
        executor: E,
        filter: &CustomerFilter,
        page: Option<PageRequest>,
    ) -> Result<Vec<CustomerBalanceRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT
                c.id, c.name, c.tax_id, c.phone, c.is_active,
                s.total_sales,
                p.total_payments,
                (p.total_payments - s.total_sales) AS balance,
                COUNT(*) OVER() AS total_count
            FROM customers c
            LEFT JOIN LATERAL (
                SELECT COALESCE(SUM(n.net_value), 0)::numeric(15, 2) AS total_sales
                FROM delivery_notes n
                WHERE n.customer_id = c.id
            ) s ON TRUE
            LEFT JOIN LATERAL (
                SELECT COALESCE(SUM(pm.amount), 0)::numeric(15, 2) AS total_payments
                FROM payments pm
                WHERE pm.customer_id = c.id
            ) p ON TRUE
            WHERE TRUE
            "#,
        );

        if let Some(term) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = like_pattern(term);
            qb.push(" AND (c.name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR c.phone ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR c.tax_id ILIKE ")
                .push_bind(pattern)
                .push(")");
        }

        if let Some(active) = filter.active {
            qb.push(" AND c.is_active = ").push_bind(active);
        }

        match filter.balance_filter {
            BalanceFilter::All => {}
            BalanceFilter::Negative => {
                qb.push(" AND (p.total_payments - s.total_sales) < 0");
            }
            BalanceFilter::Positive => {
                qb.push(" AND (p.total_payments - s.total_sales) > 0");
            }
            BalanceFilter::Zero => {
                qb.push(" AND (p.total_payments - s.total_sales) = 0");
            }
        }

        qb.push(match filter.sort {
            CustomerSort::Name => " ORDER BY c.name ASC",
            CustomerSort::Balance => " ORDER BY balance ASC, c.name ASC",
            CustomerSort::BalanceDesc => " ORDER BY balance DESC, c.name ASC",
        });

        if let Some(page) = page {
            qb.push(" LIMIT ")
                .push_bind(page.per_page)
                .push(" OFFSET ")
                .push_bind(page.offset());
        }

        let rows = qb
            .build_query_as::<CustomerBalanceRow>()
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use crate::{
        config::AppState,
        models::{
            delivery::{CreateNotePayload, FreightMode, ItemPayload, WeighingMode},
            finance::{PaymentMethod, PaymentPayload},
            registry::{BalanceSummary, CustomerBalance, CustomerPayload, WoodTypePayload},
        },
    };

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    async fn customer(state: &AppState, name: &str) -> Uuid {
        state
            .registry_service
            .create_customer(CustomerPayload {
                name: name.into(),
                tax_id: None,
                phone: None,
                address: None,
                is_active: true,
            })
            .await
            .unwrap()
            .id
    }

    async fn sale(state: &AppState, operator: Uuid, customer_id: Uuid, number: &str, quantity: Decimal) {
        let wood_type_id = state
            .registry_service
            .create_wood_type(WoodTypePayload {
                name: format!("Madeira {number}"),
                normal_price: dec!(10.00),
                freight_price: dec!(8.00),
                is_active: true,
            })
            .await
            .unwrap()
            .id;
        let payload = CreateNotePayload {
            number: number.into(),
            note_date: today(),
            customer_id,
            driver_id: None,
            freight_mode: FreightMode::Normal,
            weighing_mode: WeighingMode::Simple,
            items: vec![ItemPayload { wood_type_id, unit_price: None, quantity: Some(quantity), logs: vec![] }],
        };
        state.delivery_service.create_note(payload, operator).await.unwrap();
    }

    async fn payment(state: &AppState, operator: Uuid, customer_id: Uuid, amount: Decimal) {
        let payload = PaymentPayload {
            customer_id,
            payment_date: today(),
            amount,
            method: PaymentMethod::Pix,
            memo: None,
        };
        state.payment_service.create_payment(payload, operator).await.unwrap();
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn listing_and_single_balance_agree_for_every_filter(pool: PgPool) {
        let state = AppState::for_tests(pool);
        let operator = state.test_operator().await;

        // ANA deve 15, BRUNO tem 10 de crédito, CAIO e DORA estão quites
        let ana = customer(&state, "Ana").await;
        sale(&state, operator, ana, "1", dec!(2)).await;
        payment(&state, operator, ana, dec!(5)).await;
        let bruno = customer(&state, "Bruno").await;
        payment(&state, operator, bruno, dec!(10)).await;
        customer(&state, "Caio").await;
        let dora = customer(&state, "Dora").await;
        sale(&state, operator, dora, "2", dec!(1)).await;
        payment(&state, operator, dora, dec!(10)).await;

        let repo = CustomerRepository::new(state.db_pool.clone());
        let cases = [
            (BalanceFilter::Negative, vec!["ANA"]),
            (BalanceFilter::Positive, vec!["BRUNO"]),
            (BalanceFilter::Zero, vec!["CAIO", "DORA"]),
        ];
        for (balance_filter, expected) in cases {
            let filter = CustomerFilter { balance_filter, ..Default::default() };
            let rows = repo.list_with_balance(repo.pool(), &filter, None).await.unwrap();
            let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
            assert_eq!(names, expected, "{balance_filter:?}");

            for row in rows {
                let id = row.id;
                let listed = CustomerBalance::from(row).summary;

                let (total_payments, total_sales) = repo.balance_of(repo.pool(), id).await.unwrap();
                let single = BalanceSummary::from_totals(total_payments, total_sales);
                assert_eq!(listed, single);
                assert_eq!(single.balance, crate::services::totals::balance(total_payments, total_sales));

                let detail = state.registry_service.get_customer(id).await.unwrap().balance;
                assert_eq!(
                    serde_json::to_value(listed).unwrap(),
                    serde_json::to_value(detail).unwrap(),
                    "{balance_filter:?}"
                );
            }
        }
    }
}
