// src/db/driver_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{like_pattern, map_constraint_error},
        error::AppError,
    },
    models::registry::{Driver, RegistryFilter},
};

const DRIVER_COLUMNS: &str = "id, name, tax_id, phone, plate, is_active, created_at";

pub struct DriverRecord<'a> {
    pub name: &'a str,
    pub tax_id: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub plate: Option<&'a str>,
    pub is_active: bool,
}

#[derive(Clone)]
pub struct DriverRepository {
    pool: PgPool,
}

impl DriverRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn create<'e, E>(&self, executor: E, record: &DriverRecord<'_>) -> Result<Driver, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO drivers (name, tax_id, phone, plate, is_active)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {DRIVER_COLUMNS}"
        );
        sqlx::query_as::<_, Driver>(&sql)
            .bind(record.name)
            .bind(record.tax_id)
            .bind(record.phone)
            .bind(record.plate)
            .bind(record.is_active)
            .fetch_one(executor)
            .await
            .map_err(|e| map_constraint_error(e, &format!("Motorista '{}'", record.name)))
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        record: &DriverRecord<'_>,
    ) -> Result<Option<Driver>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "UPDATE drivers
             SET name = $2, tax_id = $3, phone = $4, plate = $5, is_active = $6
             WHERE id = $1
             RETURNING {DRIVER_COLUMNS}"
        );
        sqlx::query_as::<_, Driver>(&sql)
            .bind(id)
            .bind(record.name)
            .bind(record.tax_id)
            .bind(record.phone)
            .bind(record.plate)
            .bind(record.is_active)
            .fetch_optional(executor)
            .await
            .map_err(|e| map_constraint_error(e, &format!("Motorista '{}'", record.name)))
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Driver>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {DRIVER_COLUMNS} FROM drivers WHERE id = $1");
        let driver = sqlx::query_as::<_, Driver>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(driver)
    }

    pub async fn list<'e, E>(&self, executor: E, filter: &RegistryFilter) -> Result<Vec<Driver>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {DRIVER_COLUMNS} FROM drivers WHERE TRUE"));
        if let Some(term) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = like_pattern(term);
            qb.push(" AND (name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR plate ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(active) = filter.active {
            qb.push(" AND is_active = ").push_bind(active);
        }
        qb.push(" ORDER BY name");

        let drivers = qb.build_query_as::<Driver>().fetch_all(executor).await?;
        Ok(drivers)
    }

    /// Romaneios do motorista ficam sem motorista (ON DELETE SET NULL).
    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM drivers WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
