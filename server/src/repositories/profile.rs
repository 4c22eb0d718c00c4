//! PatientRepository and StudentRepository - role profiles linked to users

use super::Read;
use crate::dtos::{UpdatePatientDTO, UpdateStudentDTO};
use crate::entities::{Patient, PatientProfile, Student, StudentProfile};
use sqlx::{Error, QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info, instrument};

const PATIENT_COLUMNS: &str = "patient_id, user_id, date_of_birth, gender, address, medical_history";
const PATIENT_PROFILE_SELECT: &str = "SELECT p.patient_id, p.user_id, u.name, u.email, u.phone, \
     p.date_of_birth, p.gender, p.address, p.medical_history \
     FROM patients p INNER JOIN users u ON u.user_id = p.user_id";

const STUDENT_COLUMNS: &str = "student_id, user_id, date_of_birth, institution, education_level";
const STUDENT_PROFILE_SELECT: &str = "SELECT s.student_id, s.user_id, u.name, u.email, u.phone, \
     s.date_of_birth, s.institution, s.education_level \
     FROM students s INNER JOIN users u ON u.user_id = s.user_id";

pub struct PatientRepository {
    connection_pool: SqlitePool,
}

impl PatientRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    #[instrument(skip(self))]
    pub async fn find_by_user_id(&self, user_id: &i64) -> Result<Option<Patient>, Error> {
        let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE user_id = ?");
        sqlx::query_as::<_, Patient>(&sql)
            .bind(user_id)
            .fetch_optional(&self.connection_pool)
            .await
    }

    #[instrument(skip(self))]
    pub async fn find_profile(&self, patient_id: &i64) -> Result<Option<PatientProfile>, Error> {
        let sql = format!("{PATIENT_PROFILE_SELECT} WHERE p.patient_id = ?");
        sqlx::query_as::<_, PatientProfile>(&sql)
            .bind(patient_id)
            .fetch_optional(&self.connection_pool)
            .await
    }

    #[instrument(skip(self))]
    pub async fn find_profile_by_user_id(&self, user_id: &i64) -> Result<Option<PatientProfile>, Error> {
        let sql = format!("{PATIENT_PROFILE_SELECT} WHERE p.user_id = ?");
        sqlx::query_as::<_, PatientProfile>(&sql)
            .bind(user_id)
            .fetch_optional(&self.connection_pool)
            .await
    }

    #[instrument(skip(self))]
    pub async fn find_profiles(&self) -> Result<Vec<PatientProfile>, Error> {
        debug!("Listing patients");
        let sql = format!("{PATIENT_PROFILE_SELECT} ORDER BY u.name");
        sqlx::query_as::<_, PatientProfile>(&sql)
            .fetch_all(&self.connection_pool)
            .await
    }

    #[instrument(skip(self, data))]
    pub async fn update_by_user_id(&self, user_id: &i64, data: &UpdatePatientDTO) -> Result<Patient, Error> {
        let current = self.find_by_user_id(user_id).await?.ok_or(Error::RowNotFound)?;

        if data.date_of_birth.is_none()
            && data.gender.is_none()
            && data.address.is_none()
            && data.medical_history.is_none()
        {
            return Ok(current);
        }

        let mut query_builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE patients SET ");
        let mut separated = query_builder.separated(", ");
        if let Some(date_of_birth) = data.date_of_birth {
            separated.push("date_of_birth = ");
            separated.push_bind_unseparated(date_of_birth);
        }
        if let Some(ref gender) = data.gender {
            separated.push("gender = ");
            separated.push_bind_unseparated(gender.clone());
        }
        if let Some(ref address) = data.address {
            separated.push("address = ");
            separated.push_bind_unseparated(address.clone());
        }
        if let Some(ref medical_history) = data.medical_history {
            separated.push("medical_history = ");
            separated.push_bind_unseparated(medical_history.clone());
        }
        query_builder.push(" WHERE user_id = ");
        query_builder.push_bind(*user_id);

        query_builder.build().execute(&self.connection_pool).await?;
        info!("Patient profile updated");

        self.find_by_user_id(user_id).await?.ok_or(Error::RowNotFound)
    }
}

impl Read<Patient, i64> for PatientRepository {
    #[instrument(skip(self), fields(patient_id = %id))]
    async fn read(&self, id: &i64) -> Result<Option<Patient>, Error> {
        let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE patient_id = ?");
        sqlx::query_as::<_, Patient>(&sql)
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}

pub struct StudentRepository {
    connection_pool: SqlitePool,
}

impl StudentRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    #[instrument(skip(self))]
    pub async fn find_by_user_id(&self, user_id: &i64) -> Result<Option<Student>, Error> {
        let sql = format!("SELECT {STUDENT_COLUMNS} FROM students WHERE user_id = ?");
        sqlx::query_as::<_, Student>(&sql)
            .bind(user_id)
            .fetch_optional(&self.connection_pool)
            .await
    }

    #[instrument(skip(self))]
    pub async fn find_profile_by_user_id(&self, user_id: &i64) -> Result<Option<StudentProfile>, Error> {
        let sql = format!("{STUDENT_PROFILE_SELECT} WHERE s.user_id = ?");
        sqlx::query_as::<_, StudentProfile>(&sql)
            .bind(user_id)
            .fetch_optional(&self.connection_pool)
            .await
    }

    #[instrument(skip(self))]
    pub async fn find_profiles(&self) -> Result<Vec<StudentProfile>, Error> {
        let sql = format!("{STUDENT_PROFILE_SELECT} ORDER BY u.name");
        sqlx::query_as::<_, StudentProfile>(&sql)
            .fetch_all(&self.connection_pool)
            .await
    }

    #[instrument(skip(self, data))]
    pub async fn update_by_user_id(&self, user_id: &i64, data: &UpdateStudentDTO) -> Result<Student, Error> {
        let current = self.find_by_user_id(user_id).await?.ok_or(Error::RowNotFound)?;

        if data.date_of_birth.is_none() && data.institution.is_none() && data.education_level.is_none() {
            return Ok(current);
        }

        let mut query_builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE students SET ");
        let mut separated = query_builder.separated(", ");
        if let Some(date_of_birth) = data.date_of_birth {
            separated.push("date_of_birth = ");
            separated.push_bind_unseparated(date_of_birth);
        }
        if let Some(ref institution) = data.institution {
            separated.push("institution = ");
            separated.push_bind_unseparated(institution.clone());
        }
        if let Some(ref education_level) = data.education_level {
            separated.push("education_level = ");
            separated.push_bind_unseparated(education_level.clone());
        }
        query_builder.push(" WHERE user_id = ");
        query_builder.push_bind(*user_id);

        query_builder.build().execute(&self.connection_pool).await?;
        info!("Student profile updated");

        self.find_by_user_id(user_id).await?.ok_or(Error::RowNotFound)
    }
}
