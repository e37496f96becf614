// src/db/wood_type_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{like_pattern, map_constraint_error},
        error::AppError,
    },
    models::registry::{RegistryFilter, WoodType},
};

const WOOD_COLUMNS: &str = "id, name, normal_price, freight_price, is_active, created_at";

#[derive(Clone)]
pub struct WoodTypeRepository {
    pool: PgPool,
}

impl WoodTypeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        name: &str,
        normal_price: Decimal,
        freight_price: Decimal,
        is_active: bool,
    ) -> Result<WoodType, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO wood_types (name, normal_price, freight_price, is_active)
             VALUES ($1, $2, $3, $4)
             RETURNING {WOOD_COLUMNS}"
        );
        sqlx::query_as::<_, WoodType>(&sql)
            .bind(name)
            .bind(normal_price)
            .bind(freight_price)
            .bind(is_active)
            .fetch_one(executor)
            .await
            .map_err(|e| map_constraint_error(e, &format!("Tipo de madeira '{}'", name)))
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        name: &str,
        normal_price: Decimal,
        freight_price: Decimal,
        is_active: bool,
    ) -> Result<Option<WoodType>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "UPDATE wood_types
             SET name = $2, normal_price = $3, freight_price = $4, is_active = $5
             WHERE id = $1
             RETURNING {WOOD_COLUMNS}"
        );
        sqlx::query_as::<_, WoodType>(&sql)
            .bind(id)
            .bind(name)
            .bind(normal_price)
            .bind(freight_price)
            .bind(is_active)
            .fetch_optional(executor)
            .await
            .map_err(|e| map_constraint_error(e, &format!("Tipo de madeira '{}'", name)))
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<WoodType>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {WOOD_COLUMNS} FROM wood_types WHERE id = $1");
        let wood = sqlx::query_as::<_, WoodType>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(wood)
    }

    pub async fn list<'e, E>(&self, executor: E, filter: &RegistryFilter) -> Result<Vec<WoodType>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {WOOD_COLUMNS} FROM wood_types WHERE TRUE"));
        if let Some(term) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            qb.push(" AND name ILIKE ").push_bind(like_pattern(term));
        }
        if let Some(active) = filter.active {
            qb.push(" AND is_active = ").push_bind(active);
        }
        qb.push(" ORDER BY name");

        let woods = qb.build_query_as::<WoodType>().fetch_all(executor).await?;
        Ok(woods)
    }

    /// Bloqueada (RESTRICT) quando a madeira já está em algum item de romaneio.
    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM wood_types WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await
            .map_err(|e| map_constraint_error(e, "Tipo de madeira usado em romaneios"))?;
        Ok(result.rows_affected() > 0)
    }
}
