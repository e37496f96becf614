// src/db/report_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};

use crate::{
    common::error::AppError,
    models::reports::{
        CashFlowQuery, CustomerAmount, ItemReportRow, NotesReportQuery, NotesReportRow, NotesSort,
        PaymentMovementRow, PeriodTotalsRow, SaleMovementRow, WoodReportQuery, WoodSort, WoodVolume,
    },
};

// Nº do romaneio é texto; números puros ordenam como número.
const NUMBER_ORDER: &str = "(CASE WHEN n.number ~ '^[0-9]+$' THEN n.number::NUMERIC END)";

/// Consultas somente-leitura dos relatórios.
#[derive(Clone)]
pub struct ReportRepository {
    pool: PgPool,
}

impl ReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // =========================================================================
    //  FICHA DE ROMANEIOS
    // =========================================================================

    pub async fn notes<'e, E>(
        &self,
        executor: E,
        (start, end): (NaiveDate, NaiveDate),
        query: &NotesReportQuery,
    ) -> Result<Vec<NotesReportRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT
                n.id, n.number, n.note_date,
                c.name AS customer_name,
                d.name AS driver_name,
                n.freight_mode, n.weighing_mode, n.total_volume, n.gross_value, n.net_value
            FROM delivery_notes n
            JOIN customers c ON c.id = n.customer_id
            LEFT JOIN drivers d ON d.id = n.driver_id
            WHERE n.note_date >= "#,
        );
        qb.push_bind(start).push(" AND n.note_date < ").push_bind(end);

        if let Some(customer_id) = query.customer_id {
            qb.push(" AND n.customer_id = ").push_bind(customer_id);
        }
        if let Some(number) = query.number.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            qb.push(" AND n.number = ").push_bind(number.to_string());
        }
        if let Some(wood_type_id) = query.wood_type_id {
            // EXISTS: sem duplicar romaneios com mais de um item da madeira
            qb.push(" AND EXISTS (SELECT 1 FROM note_items i WHERE i.note_id = n.id AND i.wood_type_id = ")
                .push_bind(wood_type_id)
                .push(")");
        }

        let field = match query.sort {
            NotesSort::Date => "n.note_date",
            NotesSort::Number => NUMBER_ORDER,
            NotesSort::Customer => "c.name",
            NotesSort::M3 => "n.total_volume",
            NotesSort::Total => "n.net_value",
        };
        qb.push(format!(
            " ORDER BY {field} {dir} NULLS LAST, n.note_date, {NUMBER_ORDER} NULLS LAST, n.number, n.id",
            dir = query.dir.sql()
        ));

        let rows = qb.build_query_as::<NotesReportRow>().fetch_all(executor).await?;
        Ok(rows)
    }

    /// Itens dos romaneios filtrados (linhas do CSV da ficha de romaneios).
    /// Com filtro de madeira, só entram os itens daquela madeira.
    pub async fn note_items_for_export<'e, E>(
        &self,
        executor: E,
        (start, end): (NaiveDate, NaiveDate),
        query: &NotesReportQuery,
    ) -> Result<Vec<ItemReportRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let wood_query = WoodReportQuery {
            month: query.month,
            year: query.year,
            customer_id: query.customer_id,
            number: query.number.clone(),
            freight_mode: None,
            wood_type_id: query.wood_type_id,
            sort: WoodSort::Date,
            dir: query.dir,
        };
        self.items(executor, (start, end), &wood_query).await
    }

    // =========================================================================
    //  FICHA DE MADEIRAS
    // =========================================================================

    pub async fn items<'e, E>(
        &self,
        executor: E,
        (start, end): (NaiveDate, NaiveDate),
        query: &WoodReportQuery,
    ) -> Result<Vec<ItemReportRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT
                i.id AS item_id, n.id AS note_id, n.number, n.note_date,
                c.name AS customer_name,
                d.name AS driver_name,
                w.name AS wood_type_name,
                n.freight_mode, n.weighing_mode,
                i.unit_price, i.quantity, i.subtotal
            FROM note_items i
            JOIN delivery_notes n ON n.id = i.note_id
            JOIN customers c ON c.id = n.customer_id
            JOIN wood_types w ON w.id = i.wood_type_id
            LEFT JOIN drivers d ON d.id = n.driver_id
            WHERE n.note_date >= "#,
        );
        qb.push_bind(start).push(" AND n.note_date < ").push_bind(end);

        if let Some(customer_id) = query.customer_id {
            qb.push(" AND n.customer_id = ").push_bind(customer_id);
        }
        if let Some(number) = query.number.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            qb.push(" AND n.number = ").push_bind(number.to_string());
        }
        if let Some(mode) = query.freight_mode {
            qb.push(" AND n.freight_mode = ").push_bind(mode);
        }
        if let Some(wood_type_id) = query.wood_type_id {
            qb.push(" AND i.wood_type_id = ").push_bind(wood_type_id);
        }

        let field = match query.sort {
            WoodSort::Date => "n.note_date",
            WoodSort::Number => NUMBER_ORDER,
            WoodSort::Wood => "w.name",
            WoodSort::Mode => "n.freight_mode",
            WoodSort::UnitPrice => "i.unit_price",
            WoodSort::M3 => "i.quantity",
            WoodSort::Total => "i.subtotal",
        };
        qb.push(format!(
            " ORDER BY {field} {dir} NULLS LAST, n.note_date, {NUMBER_ORDER} NULLS LAST, n.number, w.name, i.id",
            dir = query.dir.sql()
        ));

        let rows = qb.build_query_as::<ItemReportRow>().fetch_all(executor).await?;
        Ok(rows)
    }

    // =========================================================================
    //  FLUXO FINANCEIRO
    // =========================================================================

    pub async fn sales<'e, E>(
        &self,
        executor: E,
        (start, end): (NaiveDate, NaiveDate),
        query: &CashFlowQuery,
    ) -> Result<Vec<SaleMovementRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT
                n.note_date, n.customer_id, c.name AS customer_name, n.number,
                n.total_volume, n.net_value
            FROM delivery_notes n
            JOIN customers c ON c.id = n.customer_id
            WHERE n.note_date >= "#,
        );
        qb.push_bind(start).push(" AND n.note_date < ").push_bind(end);
        push_sale_filters(&mut qb, query);
        qb.push(" ORDER BY n.note_date, c.name, n.number");

        let rows = qb.build_query_as::<SaleMovementRow>().fetch_all(executor).await?;
        Ok(rows)
    }

    /// Com filtro de romaneio, só entram pagamentos dos clientes desses romaneios.
    pub async fn payments<'e, E>(
        &self,
        executor: E,
        (start, end): (NaiveDate, NaiveDate),
        query: &CashFlowQuery,
    ) -> Result<Vec<PaymentMovementRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT p.payment_date, p.customer_id, c.name AS customer_name, p.amount
            FROM payments p
            JOIN customers c ON c.id = p.customer_id
            WHERE p.payment_date >= "#,
        );
        qb.push_bind(start).push(" AND p.payment_date < ").push_bind(end);

        if let Some(customer_id) = query.customer_id {
            qb.push(" AND p.customer_id = ").push_bind(customer_id);
        }
        if query.has_note_filters() {
            qb.push(" AND p.customer_id IN (SELECT n.customer_id FROM delivery_notes n WHERE n.note_date >= ")
                .push_bind(start)
                .push(" AND n.note_date < ")
                .push_bind(end);
            push_sale_filters(&mut qb, query);
            qb.push(")");
        }
        qb.push(" ORDER BY p.payment_date, c.name, p.id");

        let rows = qb.build_query_as::<PaymentMovementRow>().fetch_all(executor).await?;
        Ok(rows)
    }

    // =========================================================================
    //  DASHBOARD
    // =========================================================================

    pub async fn period_totals<'e, E>(
        &self,
        executor: E,
        (start, end): (NaiveDate, NaiveDate),
    ) -> Result<PeriodTotalsRow, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let totals = sqlx::query_as::<_, PeriodTotalsRow>(
            r#"
            SELECT
                COUNT(*) AS note_count,
                COALESCE(SUM(total_volume), 0) AS total_volume,
                COALESCE(SUM(net_value), 0) AS total_net
            FROM delivery_notes
            WHERE note_date >= $1 AND note_date < $2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(executor)
        .await?;
        Ok(totals)
    }

    /// Soma dos saldos negativos, em módulo.
    pub async fn total_receivable<'e, E>(&self, executor: E) -> Result<Decimal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (total,): (Decimal,) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(-(p.total_payments - s.total_sales)), 0)
            FROM customers c
            LEFT JOIN LATERAL (
                SELECT COALESCE(SUM(n.net_value), 0) AS total_sales
                FROM delivery_notes n WHERE n.customer_id = c.id
            ) s ON TRUE
            LEFT JOIN LATERAL (
                SELECT COALESCE(SUM(pm.amount), 0) AS total_payments
                FROM payments pm WHERE pm.customer_id = c.id
            ) p ON TRUE
            WHERE (p.total_payments - s.total_sales) < 0
            "#,
        )
        .fetch_one(executor)
        .await?;
        Ok(total)
    }

    pub async fn top_buyers<'e, E>(
        &self,
        executor: E,
        (start, end): (NaiveDate, NaiveDate),
        limit: i64,
    ) -> Result<Vec<CustomerAmount>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, CustomerAmount>(
            r#"
            SELECT c.id AS customer_id, c.name AS customer_name, SUM(n.net_value) AS amount
            FROM delivery_notes n
            JOIN customers c ON c.id = n.customer_id
            WHERE n.note_date >= $1 AND n.note_date < $2
            GROUP BY c.id, c.name
            ORDER BY amount DESC, c.name
            LIMIT $3
            "#,
        )
        .bind(start)
        .bind(end)
        .bind(limit)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn top_woods<'e, E>(
        &self,
        executor: E,
        (start, end): (NaiveDate, NaiveDate),
        limit: i64,
    ) -> Result<Vec<WoodVolume>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, WoodVolume>(
            r#"
            SELECT
                w.id AS wood_type_id, w.name AS wood_type_name,
                SUM(i.quantity) AS total_volume,
                SUM(i.subtotal) AS total_value
            FROM note_items i
            JOIN delivery_notes n ON n.id = i.note_id
            JOIN wood_types w ON w.id = i.wood_type_id
            WHERE n.note_date >= $1 AND n.note_date < $2
            GROUP BY w.id, w.name
            ORDER BY total_volume DESC, w.name
            LIMIT $3
            "#,
        )
        .bind(start)
        .bind(end)
        .bind(limit)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }
}

fn push_sale_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &CashFlowQuery) {
    if let Some(customer_id) = query.customer_id {
        qb.push(" AND n.customer_id = ").push_bind(customer_id);
    }
    if let Some(number) = query.number.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        qb.push(" AND n.number = ").push_bind(number.to_string());
    }
    if let Some(wood_type_id) = query.wood_type_id {
        qb.push(" AND EXISTS (SELECT 1 FROM note_items i WHERE i.note_id = n.id AND i.wood_type_id = ")
            .push_bind(wood_type_id)
            .push(")");
    }
}
