//! DoctorRepository - doctor profiles and weekly availability

use super::user::insert_user;
use super::{Delete, Read, Update};
use crate::dtos::{AvailabilityWindowDTO, CreateUserDTO, DoctorQuery, NewDoctorDTO, UpdateDoctorDTO, like_pattern};
use crate::entities::{Availability, Doctor, DoctorProfile, User};
use sqlx::{Error, QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info, instrument};

const PROFILE_SELECT: &str = "SELECT d.doctor_id, d.user_id, u.name, u.email, u.phone, \
     d.specialization, d.qualification, d.experience_years, d.consultation_fee_cents, d.bio \
     FROM doctors d INNER JOIN users u ON u.user_id = d.user_id";

pub struct DoctorRepository {
    connection_pool: SqlitePool,
}

impl DoctorRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Creates the doctor's user account and profile atomically
    #[instrument(skip(self, account, profile), fields(email = %account.email))]
    pub async fn create_with_account(
        &self,
        account: &CreateUserDTO,
        profile: &NewDoctorDTO,
    ) -> Result<(User, Doctor), Error> {
        debug!("Creating doctor account");
        let mut tx = self.connection_pool.begin().await?;

        let user = insert_user(&mut tx, account).await?;
        let doctor = sqlx::query_as::<_, Doctor>(
            r#"
            INSERT INTO doctors (user_id, specialization, qualification, experience_years, consultation_fee_cents, bio)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING doctor_id, user_id, specialization, qualification, experience_years, consultation_fee_cents, bio
            "#,
        )
        .bind(user.user_id)
        .bind(profile.specialization.trim())
        .bind(profile.qualification.trim())
        .bind(profile.experience_years)
        .bind(profile.consultation_fee_cents)
        .bind(&profile.bio)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        info!("Doctor {} created for user {}", doctor.doctor_id, user.user_id);
        Ok((user, doctor))
    }

    #[instrument(skip(self))]
    pub async fn find_by_user_id(&self, user_id: &i64) -> Result<Option<Doctor>, Error> {
        sqlx::query_as::<_, Doctor>(
            "SELECT doctor_id, user_id, specialization, qualification, experience_years, consultation_fee_cents, bio \
             FROM doctors WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.connection_pool)
        .await
    }

    #[instrument(skip(self))]
    pub async fn find_profile(&self, doctor_id: &i64) -> Result<Option<DoctorProfile>, Error> {
        let sql = format!("{PROFILE_SELECT} WHERE d.doctor_id = ?");
        sqlx::query_as::<_, DoctorProfile>(&sql)
            .bind(doctor_id)
            .fetch_optional(&self.connection_pool)
            .await
    }

    /// Lists active doctors, optionally narrowed by specialization or name
    #[instrument(skip(self))]
    pub async fn find_profiles(&self, query: &DoctorQuery) -> Result<Vec<DoctorProfile>, Error> {
        debug!("Listing doctors");
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(PROFILE_SELECT);
        builder.push(" WHERE u.is_active = 1");

        if let Some(specialization) = query.specialization.as_deref().filter(|s| !s.trim().is_empty()) {
            builder
                .push(" AND d.specialization LIKE ")
                .push_bind(like_pattern(specialization))
                .push(" ESCAPE '\\'");
        }
        if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
            builder
                .push(" AND u.name LIKE ")
                .push_bind(like_pattern(search))
                .push(" ESCAPE '\\'");
        }
        builder.push(" ORDER BY u.name");

        builder
            .build_query_as::<DoctorProfile>()
            .fetch_all(&self.connection_pool)
            .await
    }

    #[instrument(skip(self))]
    pub async fn find_availability(&self, doctor_id: &i64) -> Result<Vec<Availability>, Error> {
        sqlx::query_as::<_, Availability>(
            "SELECT availability_id, doctor_id, weekday, start_time, end_time \
             FROM doctor_availability WHERE doctor_id = ? ORDER BY weekday, start_time",
        )
        .bind(doctor_id)
        .fetch_all(&self.connection_pool)
        .await
    }

    /// Replaces every availability window of a doctor in one transaction
    #[instrument(skip(self, windows), fields(doctor_id = %doctor_id, count = windows.len()))]
    pub async fn replace_availability(
        &self,
        doctor_id: &i64,
        windows: &[AvailabilityWindowDTO],
    ) -> Result<Vec<Availability>, Error> {
        let mut tx = self.connection_pool.begin().await?;

        sqlx::query("DELETE FROM doctor_availability WHERE doctor_id = ?")
            .bind(doctor_id)
            .execute(&mut *tx)
            .await?;

        for window in windows {
            sqlx::query(
                "INSERT INTO doctor_availability (doctor_id, weekday, start_time, end_time) VALUES (?, ?, ?, ?)",
            )
            .bind(doctor_id)
            .bind(window.weekday)
            .bind(window.start_time)
            .bind(window.end_time)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!("Availability replaced");
        self.find_availability(doctor_id).await
    }
}

impl Read<Doctor, i64> for DoctorRepository {
    #[instrument(skip(self), fields(doctor_id = %id))]
    async fn read(&self, id: &i64) -> Result<Option<Doctor>, Error> {
        sqlx::query_as::<_, Doctor>(
            "SELECT doctor_id, user_id, specialization, qualification, experience_years, consultation_fee_cents, bio \
             FROM doctors WHERE doctor_id = ?",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
    }
}

impl Update<Doctor, UpdateDoctorDTO, i64> for DoctorRepository {
    #[instrument(skip(self, data), fields(doctor_id = %id))]
    async fn update(&self, id: &i64, data: &UpdateDoctorDTO) -> Result<Doctor, Error> {
        let current = self.read(id).await?.ok_or(Error::RowNotFound)?;

        if data.specialization.is_none()
            && data.qualification.is_none()
            && data.experience_years.is_none()
            && data.consultation_fee_cents.is_none()
            && data.bio.is_none()
        {
            return Ok(current);
        }

        let mut query_builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE doctors SET ");
        let mut separated = query_builder.separated(", ");
        if let Some(ref specialization) = data.specialization {
            separated.push("specialization = ");
            separated.push_bind_unseparated(specialization.trim().to_string());
        }
        if let Some(ref qualification) = data.qualification {
            separated.push("qualification = ");
            separated.push_bind_unseparated(qualification.trim().to_string());
        }
        if let Some(experience_years) = data.experience_years {
            separated.push("experience_years = ");
            separated.push_bind_unseparated(experience_years);
        }
        if let Some(fee) = data.consultation_fee_cents {
            separated.push("consultation_fee_cents = ");
            separated.push_bind_unseparated(fee);
        }
        if let Some(ref bio) = data.bio {
            separated.push("bio = ");
            separated.push_bind_unseparated(bio.clone());
        }
        query_builder.push(" WHERE doctor_id = ");
        query_builder.push_bind(*id);

        query_builder.build().execute(&self.connection_pool).await?;
        info!("Doctor updated");

        self.read(id).await?.ok_or(Error::RowNotFound)
    }
}

impl Delete<i64> for DoctorRepository {
    /// Removes the doctor by deleting the owning user account
    #[instrument(skip(self), fields(doctor_id = %id))]
    async fn delete(&self, id: &i64) -> Result<(), Error> {
        let result = sqlx::query("DELETE FROM users WHERE user_id = (SELECT user_id FROM doctors WHERE doctor_id = ?)")
            .bind(id)
            .execute(&self.connection_pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::RowNotFound);
        }
        info!("Doctor deleted");
        Ok(())
    }
}
