// src/db/delivery_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{like_pattern, map_constraint_error},
        error::{AppError, RuleViolation},
    },
    models::{
        delivery::{
            DeliveryNote, FreightMode, ItemContext, ItemRow, LogUnit, NoteHeaderRow, NoteItem,
            NoteSummary, ResolvedLog, WeighingMode,
        },
        page::PageRequest,
    },
    services::totals::{ItemTotals, NoteTotals},
};

const NOTE_COLUMNS: &str = "id, number, note_date, customer_id, driver_id, freight_mode, weighing_mode, \
     total_volume, gross_value, net_value, created_by, created_at, updated_at";
const ITEM_COLUMNS: &str = "id, note_id, wood_type_id, unit_price, quantity, subtotal";
const LOG_COLUMNS: &str = "id, item_id, length, rodo, deduction_1, deduction_2, quantity";

/// Cabeçalho gravável do romaneio.
pub struct NoteHeader<'a> {
    pub number: &'a str,
    pub note_date: NaiveDate,
    pub customer_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub freight_mode: FreightMode,
    pub weighing_mode: WeighingMode,
}

/// Filtro já resolvido da listagem de romaneios.
pub struct NoteListFilter<'a> {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub customer_id: Option<Uuid>,
    pub number: Option<&'a str>,
    pub weighing_mode: Option<WeighingMode>,
}

fn item_error(e: sqlx::Error) -> AppError {
    // UNIQUE (note_id, wood_type_id)
    match map_constraint_error(e, "Item") {
        AppError::UniqueConstraintViolation(_) => RuleViolation::DuplicateWoodType.into(),
        other => other,
    }
}

#[derive(Clone)]
pub struct DeliveryRepository {
    pool: PgPool,
}

impl DeliveryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // =========================================================================
    //  CABEÇALHO
    // =========================================================================

    pub async fn insert_note<'e, E>(
        &self,
        executor: E,
        header: &NoteHeader<'_>,
        created_by: Uuid,
    ) -> Result<DeliveryNote, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO delivery_notes
                (number, note_date, customer_id, driver_id, freight_mode, weighing_mode, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {NOTE_COLUMNS}"
        );
        sqlx::query_as::<_, DeliveryNote>(&sql)
            .bind(header.number)
            .bind(header.note_date)
            .bind(header.customer_id)
            .bind(header.driver_id)
            .bind(header.freight_mode)
            .bind(header.weighing_mode)
            .bind(created_by)
            .fetch_one(executor)
            .await
            .map_err(|e| map_constraint_error(e, &format!("Romaneio nº {}", header.number)))
    }

    pub async fn update_header<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        header: &NoteHeader<'_>,
    ) -> Result<Option<DeliveryNote>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "UPDATE delivery_notes
             SET number = $2, note_date = $3, customer_id = $4, driver_id = $5,
                 freight_mode = $6, weighing_mode = $7, updated_at = NOW()
             WHERE id = $1
             RETURNING {NOTE_COLUMNS}"
        );
        sqlx::query_as::<_, DeliveryNote>(&sql)
            .bind(id)
            .bind(header.number)
            .bind(header.note_date)
            .bind(header.customer_id)
            .bind(header.driver_id)
            .bind(header.freight_mode)
            .bind(header.weighing_mode)
            .fetch_optional(executor)
            .await
            .map_err(|e| map_constraint_error(e, &format!("Romaneio nº {}", header.number)))
    }

    /// Trava a linha do romaneio até o fim da transação.
    pub async fn lock_note<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<DeliveryNote>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {NOTE_COLUMNS} FROM delivery_notes WHERE id = $1 FOR UPDATE");
        let note = sqlx::query_as::<_, DeliveryNote>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(note)
    }

    pub async fn find_header<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<NoteHeaderRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let header = sqlx::query_as::<_, NoteHeaderRow>(
            r#"
            SELECT
                n.id, n.number, n.note_date, n.customer_id, n.driver_id, n.freight_mode,
                n.weighing_mode, n.total_volume, n.gross_value, n.net_value, n.created_by,
                n.created_at, n.updated_at,
                c.name AS customer_name,
                d.name AS driver_name
            FROM delivery_notes n
            JOIN customers c ON c.id = n.customer_id
            LEFT JOIN drivers d ON d.id = n.driver_id
            WHERE n.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(header)
    }

    /// Itens e toras caem junto (ON DELETE CASCADE).
    pub async fn delete_note<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM delivery_notes WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn store_note_totals<'e, E>(
        &self,
        executor: E,
        note_id: Uuid,
        totals: &NoteTotals,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "UPDATE delivery_notes
             SET total_volume = $2, gross_value = $3, net_value = $4, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(note_id)
        .bind(totals.total_volume)
        .bind(totals.gross_value)
        .bind(totals.net_value)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Listagem paginada; cada linha traz também o total de linhas e as somas do filtro.
    pub async fn list_notes<'e, E>(
        &self,
        executor: E,
        filter: &NoteListFilter<'_>,
        page: PageRequest,
    ) -> Result<Vec<NoteSummary>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT
                n.id, n.number, n.note_date, n.customer_id,
                c.name AS customer_name,
                d.name AS driver_name,
                n.freight_mode, n.weighing_mode, n.total_volume, n.net_value,
                COUNT(*) OVER() AS total_count,
                COALESCE(SUM(n.total_volume) OVER(), 0) AS period_volume,
                COALESCE(SUM(n.net_value) OVER(), 0) AS period_value
            FROM delivery_notes n
            JOIN customers c ON c.id = n.customer_id
            LEFT JOIN drivers d ON d.id = n.driver_id
            WHERE n.note_date >= "#,
        );
        qb.push_bind(filter.start)
            .push(" AND n.note_date < ")
            .push_bind(filter.end);

        if let Some(customer_id) = filter.customer_id {
            qb.push(" AND n.customer_id = ").push_bind(customer_id);
        }
        if let Some(number) = filter.number.filter(|n| !n.trim().is_empty()) {
            qb.push(" AND n.number ILIKE ").push_bind(like_pattern(number));
        }
        if let Some(mode) = filter.weighing_mode {
            qb.push(" AND n.weighing_mode = ").push_bind(mode);
        }

        qb.push(" ORDER BY n.note_date DESC, n.number DESC, n.id")
            .push(" LIMIT ")
            .push_bind(page.per_page)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let notes = qb.build_query_as::<NoteSummary>().fetch_all(executor).await?;
        Ok(notes)
    }

    // =========================================================================
    //  ITENS
    // =========================================================================

    pub async fn insert_item<'e, E>(
        &self,
        executor: E,
        note_id: Uuid,
        wood_type_id: Uuid,
        unit_price: Decimal,
        totals: &ItemTotals,
    ) -> Result<NoteItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO note_items (note_id, wood_type_id, unit_price, quantity, subtotal)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {ITEM_COLUMNS}"
        );
        sqlx::query_as::<_, NoteItem>(&sql)
            .bind(note_id)
            .bind(wood_type_id)
            .bind(unit_price)
            .bind(totals.quantity)
            .bind(totals.subtotal)
            .fetch_one(executor)
            .await
            .map_err(item_error)
    }

    pub async fn update_item<'e, E>(
        &self,
        executor: E,
        item_id: Uuid,
        wood_type_id: Uuid,
        unit_price: Decimal,
        totals: &ItemTotals,
    ) -> Result<NoteItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "UPDATE note_items
             SET wood_type_id = $2, unit_price = $3, quantity = $4, subtotal = $5
             WHERE id = $1
             RETURNING {ITEM_COLUMNS}"
        );
        sqlx::query_as::<_, NoteItem>(&sql)
            .bind(item_id)
            .bind(wood_type_id)
            .bind(unit_price)
            .bind(totals.quantity)
            .bind(totals.subtotal)
            .fetch_one(executor)
            .await
            .map_err(item_error)
    }

    pub async fn store_item_totals<'e, E>(
        &self,
        executor: E,
        item_id: Uuid,
        totals: &ItemTotals,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE note_items SET quantity = $2, subtotal = $3 WHERE id = $1")
            .bind(item_id)
            .bind(totals.quantity)
            .bind(totals.subtotal)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Item com a modalidade do romaneio dono.
    pub async fn find_item_context<'e, E>(
        &self,
        executor: E,
        item_id: Uuid,
    ) -> Result<Option<ItemContext>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, ItemContext>(
            r#"
            SELECT
                i.id, i.note_id, i.wood_type_id, i.unit_price, i.quantity,
                n.freight_mode, n.weighing_mode
            FROM note_items i
            JOIN delivery_notes n ON n.id = i.note_id
            WHERE i.id = $1
            "#,
        )
        .bind(item_id)
        .fetch_optional(executor)
        .await?;
        Ok(item)
    }

    pub async fn delete_item<'e, E>(&self, executor: E, item_id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM note_items WHERE id = $1")
            .bind(item_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_items<'e, E>(&self, executor: E, note_id: Uuid) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM note_items WHERE note_id = $1")
            .bind(note_id)
            .fetch_one(executor)
            .await?;
        Ok(count)
    }

    /// (quantidade, subtotal) de cada item gravado do romaneio.
    pub async fn list_item_totals<'e, E>(&self, executor: E, note_id: Uuid) -> Result<Vec<ItemTotals>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows: Vec<(Decimal, Decimal)> =
            sqlx::query_as("SELECT quantity, subtotal FROM note_items WHERE note_id = $1")
                .bind(note_id)
                .fetch_all(executor)
                .await?;
        Ok(rows
            .into_iter()
            .map(|(quantity, subtotal)| ItemTotals { quantity, subtotal })
            .collect())
    }

    pub async fn list_items_with_names<'e, E>(&self, executor: E, note_id: Uuid) -> Result<Vec<ItemRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT
                i.id, i.note_id, i.wood_type_id, i.unit_price, i.quantity, i.subtotal,
                w.name AS wood_type_name
            FROM note_items i
            JOIN wood_types w ON w.id = i.wood_type_id
            WHERE i.note_id = $1
            ORDER BY w.name, i.id
            "#,
        )
        .bind(note_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    // =========================================================================
    //  TORAS
    // =========================================================================

    pub async fn insert_log<'e, E>(&self, executor: E, item_id: Uuid, log: &ResolvedLog) -> Result<LogUnit, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO log_units (item_id, length, rodo, deduction_1, deduction_2, quantity)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {LOG_COLUMNS}"
        );
        let unit = sqlx::query_as::<_, LogUnit>(&sql)
            .bind(item_id)
            .bind(log.length)
            .bind(log.rodo)
            .bind(log.deduction_1)
            .bind(log.deduction_2)
            .bind(log.quantity)
            .fetch_one(executor)
            .await?;
        Ok(unit)
    }

    pub async fn update_log<'e, E>(&self, executor: E, log_id: Uuid, log: &ResolvedLog) -> Result<LogUnit, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "UPDATE log_units
             SET length = $2, rodo = $3, deduction_1 = $4, deduction_2 = $5, quantity = $6
             WHERE id = $1
             RETURNING {LOG_COLUMNS}"
        );
        let unit = sqlx::query_as::<_, LogUnit>(&sql)
            .bind(log_id)
            .bind(log.length)
            .bind(log.rodo)
            .bind(log.deduction_1)
            .bind(log.deduction_2)
            .bind(log.quantity)
            .fetch_one(executor)
            .await?;
        Ok(unit)
    }

    pub async fn find_log<'e, E>(&self, executor: E, log_id: Uuid) -> Result<Option<LogUnit>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {LOG_COLUMNS} FROM log_units WHERE id = $1");
        let unit = sqlx::query_as::<_, LogUnit>(&sql)
            .bind(log_id)
            .fetch_optional(executor)
            .await?;
        Ok(unit)
    }

    pub async fn delete_log<'e, E>(&self, executor: E, log_id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM log_units WHERE id = $1")
            .bind(log_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_logs<'e, E>(&self, executor: E, item_id: Uuid) -> Result<Vec<LogUnit>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {LOG_COLUMNS} FROM log_units WHERE item_id = $1 ORDER BY created_at, id");
        let logs = sqlx::query_as::<_, LogUnit>(&sql)
            .bind(item_id)
            .fetch_all(executor)
            .await?;
        Ok(logs)
    }

    /// Todas as toras do romaneio (para o detalhe e o PDF).
    pub async fn list_logs_for_note<'e, E>(&self, executor: E, note_id: Uuid) -> Result<Vec<LogUnit>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let logs = sqlx::query_as::<_, LogUnit>(
            r#"
            SELECT l.id, l.item_id, l.length, l.rodo, l.deduction_1, l.deduction_2, l.quantity
            FROM log_units l
            JOIN note_items i ON i.id = l.item_id
            WHERE i.note_id = $1
            ORDER BY l.created_at, l.id
            "#,
        )
        .bind(note_id)
        .fetch_all(executor)
        .await?;
        Ok(logs)
    }
}
