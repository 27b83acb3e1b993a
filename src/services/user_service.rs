use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::api::Pagination;
use crate::auth::Role;
use crate::database::models::User;
use crate::database::DatabaseError;

const USER_COLUMNS: &str = "id, login, password_hash, email, name, role, city, salary_gross, \
                            currency, is_active, created_at, updated_at";

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub city: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub login: String,
    pub password_hash: String,
    pub email: Option<String>,
    pub name: String,
    pub role: Role,
    pub city: String,
    pub salary_gross: Option<Decimal>,
    pub currency: String,
}

/// Fields an admin may change; `None` leaves the column as is.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
    pub city: Option<String>,
    pub salary_gross: Option<Decimal>,
    pub currency: Option<String>,
    pub is_active: Option<bool>,
    pub password_hash: Option<String>,
}

/// Logins are case-insensitive and stored lower-case.
pub fn normalize_login(login: &str) -> String {
    login.trim().to_lowercase()
}

pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
        qb.push(" WHERE TRUE");
        if let Some(city) = &filter.city {
            qb.push(" AND city = ").push_bind(city.clone());
        }
        if let Some(role) = filter.role {
            qb.push(" AND role = ").push_bind(role);
        }
        if let Some(is_active) = filter.is_active {
            qb.push(" AND is_active = ").push_bind(is_active);
        }
    }

    /// One page of users ordered by city, role, name, plus the total match count.
    pub async fn list(&self, filter: &UserFilter, page: Pagination) -> Result<(Vec<User>, i64), DatabaseError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        Self::push_filters(&mut count, filter);
        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {USER_COLUMNS} FROM users"));
        Self::push_filters(&mut query, filter);
        query
            .push(" ORDER BY city ASC, role ASC, name ASC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let users = query.build_query_as::<User>().fetch_all(&self.pool).await?;

        Ok((users, total))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_login(&self, login: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE login = $1"))
            .bind(normalize_login(login))
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Insert a user; a taken login surfaces as a unique violation.
    pub async fn create(&self, new_user: NewUser) -> Result<User, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (login, password_hash, email, name, role, city, salary_gross, currency)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(normalize_login(&new_user.login))
        .bind(&new_user.password_hash)
        .bind(&new_user.email)
        .bind(&new_user.name)
        .bind(new_user.role)
        .bind(&new_user.city)
        .bind(new_user.salary_gross)
        .bind(&new_user.currency)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(user_id = %user.id, login = %user.login, role = %user.role, "User created");
        Ok(user)
    }

    pub async fn update(&self, id: Uuid, changes: UserChanges) -> Result<User, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET
                email = COALESCE($2, email),
                name = COALESCE($3, name),
                role = COALESCE($4, role),
                city = COALESCE($5, city),
                salary_gross = COALESCE($6, salary_gross),
                currency = COALESCE($7, currency),
                is_active = COALESCE($8, is_active),
                password_hash = COALESCE($9, password_hash),
                updated_at = now()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.email)
        .bind(changes.name)
        .bind(changes.role)
        .bind(changes.city)
        .bind(changes.salary_gross)
        .bind(changes.currency)
        .bind(changes.is_active)
        .bind(changes.password_hash)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("User not found".to_string()))?;

        Ok(user)
    }

    /// Soft delete: the user can no longer log in, their reports stay.
    pub async fn deactivate(&self, id: Uuid) -> Result<User, DatabaseError> {
        self.update(
            id,
            UserChanges {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
    }
}
