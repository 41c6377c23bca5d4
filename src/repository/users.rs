//! Users repository for database operations

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::user::{Role, User},
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Look a user up by identifier: matricula first (students), then
    /// name (admins or students by name)
    pub async fn find_by_identifier(&self, identifier: &str) -> AppResult<Option<User>> {
        let by_matricula = sqlx::query_as::<_, User>("SELECT * FROM users WHERE matricula = $1")
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await?;

        if by_matricula.is_some() {
            return Ok(by_matricula);
        }

        let by_name = sqlx::query_as::<_, User>("SELECT * FROM users WHERE name = $1 LIMIT 1")
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await?;

        Ok(by_name)
    }

    /// Check whether a student with this matricula is already registered
    pub async fn matricula_exists(&self, matricula: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE matricula = $1 AND role = 'student')",
        )
        .bind(matricula)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Check whether an admin with this name is already registered
    pub async fn admin_name_exists(&self, name: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE name = $1 AND role = 'admin')",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Insert a new user
    pub async fn create(&self, user: &User) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, role, matricula, password)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(user.role)
        .bind(user.matricula.as_deref())
        .bind(user.password.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                if user.role == Role::Student {
                    AppError::Conflict("A student with this matricula is already registered".to_string())
                } else {
                    AppError::Conflict("An administrator with this name already exists".to_string())
                }
            }
            _ => AppError::from(e),
        })?;

        Ok(())
    }
}
