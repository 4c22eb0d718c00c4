//! UserRepository - accounts and their role profiles

use super::{Create, Delete, Read, Update};
use crate::dtos::{CreateUserDTO, UpdateUserDTO, UserQuery, like_pattern};
use crate::entities::{Role, User};
use chrono::Utc;
use sqlx::{Error, QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info, instrument};

const USER_COLUMNS: &str = "user_id, name, email, password, role, phone, is_active, created_at";

pub struct UserRepository {
    connection_pool: SqlitePool,
}

impl UserRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Email lookup is case-insensitive (column collation is NOCASE)
    #[instrument(skip(self))]
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        debug!("Finding user by email");
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        sqlx::query_as::<_, User>(&sql)
            .bind(email.trim())
            .fetch_optional(&self.connection_pool)
            .await
    }

    /// Inserts the user and, for patients and students, its empty profile row
    /// in a single transaction. Doctors get their profile through
    /// `DoctorRepository::create_with_account`.
    #[instrument(skip(self, data), fields(email = %data.email, role = %data.role))]
    pub async fn create_with_profile(&self, data: &CreateUserDTO) -> Result<User, Error> {
        debug!("Creating user with profile");
        let mut tx = self.connection_pool.begin().await?;

        let user = insert_user(&mut tx, data).await?;

        match user.role {
            Role::Patient => {
                sqlx::query("INSERT INTO patients (user_id) VALUES (?)")
                    .bind(user.user_id)
                    .execute(&mut *tx)
                    .await?;
            }
            Role::Student => {
                sqlx::query("INSERT INTO students (user_id) VALUES (?)")
                    .bind(user.user_id)
                    .execute(&mut *tx)
                    .await?;
            }
            Role::Admin | Role::Doctor => {}
        }

        tx.commit().await?;
        info!("User {} created", user.user_id);
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn find_many(&self, query: &UserQuery) -> Result<Vec<User>, Error> {
        debug!("Listing users");
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users WHERE 1 = 1"));

        if let Some(role) = query.role {
            builder.push(" AND role = ").push_bind(role);
        }
        if let Some(is_active) = query.is_active {
            builder.push(" AND is_active = ").push_bind(is_active);
        }
        if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = like_pattern(search);
            builder
                .push(" AND (name LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR email LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }
        builder.push(" ORDER BY user_id");

        builder
            .build_query_as::<User>()
            .fetch_all(&self.connection_pool)
            .await
    }

    #[instrument(skip(self, password_hash))]
    pub async fn update_password(&self, user_id: &i64, password_hash: &str) -> Result<(), Error> {
        debug!("Updating password");
        let result = sqlx::query("UPDATE users SET password = ? WHERE user_id = ?")
            .bind(password_hash)
            .bind(user_id)
            .execute(&self.connection_pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::RowNotFound);
        }
        Ok(())
    }

    /// Number of accounts per role
    pub async fn count_by_role(&self) -> Result<Vec<(Role, i64)>, Error> {
        sqlx::query_as::<_, (Role, i64)>("SELECT role, COUNT(*) FROM users GROUP BY role ORDER BY role")
            .fetch_all(&self.connection_pool)
            .await
    }
}

/// Inserts a user row inside an open transaction
pub(crate) async fn insert_user(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    data: &CreateUserDTO,
) -> Result<User, Error> {
    let sql = format!(
        "INSERT INTO users (name, email, password, role, phone, is_active, created_at) \
         VALUES (?, ?, ?, ?, ?, 1, ?) RETURNING {USER_COLUMNS}"
    );
    sqlx::query_as::<_, User>(&sql)
        .bind(data.name.trim())
        .bind(data.email.trim())
        .bind(&data.password)
        .bind(data.role)
        .bind(&data.phone)
        .bind(Utc::now())
        .fetch_one(&mut **tx)
        .await
}

impl Create<User, CreateUserDTO> for UserRepository {
    #[instrument(skip(self, data), fields(email = %data.email))]
    async fn create(&self, data: &CreateUserDTO) -> Result<User, Error> {
        let mut tx = self.connection_pool.begin().await?;
        let user = insert_user(&mut tx, data).await?;
        tx.commit().await?;
        info!("User {} created", user.user_id);
        Ok(user)
    }
}

impl Read<User, i64> for UserRepository {
    #[instrument(skip(self), fields(user_id = %id))]
    async fn read(&self, id: &i64) -> Result<Option<User>, Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}

impl Update<User, UpdateUserDTO, i64> for UserRepository {
    #[instrument(skip(self, data), fields(user_id = %id))]
    async fn update(&self, id: &i64, data: &UpdateUserDTO) -> Result<User, Error> {
        let current = self.read(id).await?.ok_or(Error::RowNotFound)?;

        if data.name.is_none() && data.phone.is_none() && data.is_active.is_none() {
            debug!("No fields to update, returning current user");
            return Ok(current);
        }

        let mut query_builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE users SET ");
        let mut separated = query_builder.separated(", ");
        if let Some(ref name) = data.name {
            separated.push("name = ");
            separated.push_bind_unseparated(name.trim().to_string());
        }
        if let Some(ref phone) = data.phone {
            separated.push("phone = ");
            separated.push_bind_unseparated(phone.clone());
        }
        if let Some(is_active) = data.is_active {
            separated.push("is_active = ");
            separated.push_bind_unseparated(is_active);
        }
        query_builder.push(" WHERE user_id = ");
        query_builder.push_bind(*id);

        query_builder.build().execute(&self.connection_pool).await?;
        info!("User updated");

        self.read(id).await?.ok_or(Error::RowNotFound)
    }
}

impl Delete<i64> for UserRepository {
    /// Hard delete; role profile, bookings, orders and threads cascade
    #[instrument(skip(self), fields(user_id = %id))]
    async fn delete(&self, id: &i64) -> Result<(), Error> {
        let result = sqlx::query("DELETE FROM users WHERE user_id = ?")
            .bind(id)
            .execute(&self.connection_pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::RowNotFound);
        }
        info!("User deleted");
        Ok(())
    }
}
