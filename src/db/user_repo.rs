// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_constraint_error, error::AppError},
    models::auth::User,
};

const USER_COLUMNS: &str =
    "id, email, password_hash, full_name, is_staff, is_active, created_at, updated_at";

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // Busca um usuário pelo e-mail (comparação sem diferenciar maiúsculas)
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)");
        let maybe_user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let maybe_user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    pub async fn list(&self) -> Result<Vec<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY email");
        let users = sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?;
        Ok(users)
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // Cria um novo usuário; e-mail duplicado vira EmailAlreadyExists
    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        email: &str,
        password_hash: &str,
        full_name: Option<&str>,
        is_staff: bool,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO users (email, password_hash, full_name, is_staff)
             VALUES (LOWER($1), $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .bind(password_hash)
            .bind(full_name)
            .bind(is_staff)
            .fetch_one(executor)
            .await
            .map_err(|e| match map_constraint_error(e, email) {
                AppError::UniqueConstraintViolation(_) => AppError::EmailAlreadyExists,
                other => other,
            })
    }
}
