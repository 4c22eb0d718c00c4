//! AppointmentRepository and PrescriptionRepository

use super::{Create, Delete, Read};
use crate::dtos::{AppointmentQuery, CreateAppointmentDTO, NewPrescriptionDTO};
use crate::entities::{Appointment, AppointmentDetails, AppointmentStatus, Prescription};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::{Error, QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info, instrument};

const APPOINTMENT_COLUMNS: &str =
    "appointment_id, patient_id, doctor_id, scheduled_at, reason, status, notes, created_at";

const DETAILS_SELECT: &str = "SELECT a.appointment_id, a.patient_id, pu.name AS patient_name, \
     a.doctor_id, du.name AS doctor_name, d.specialization, a.scheduled_at, a.reason, a.status, \
     a.notes, a.created_at \
     FROM appointments a \
     INNER JOIN patients p ON p.patient_id = a.patient_id \
     INNER JOIN users pu ON pu.user_id = p.user_id \
     INNER JOIN doctors d ON d.doctor_id = a.doctor_id \
     INNER JOIN users du ON du.user_id = d.user_id";

/// Which appointments a caller is allowed to list
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppointmentScope {
    All,
    Patient(i64),
    Doctor(i64),
}

pub struct AppointmentRepository {
    connection_pool: SqlitePool,
}

impl AppointmentRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    #[instrument(skip(self))]
    pub async fn find_details(&self, appointment_id: &i64) -> Result<Option<AppointmentDetails>, Error> {
        let sql = format!("{DETAILS_SELECT} WHERE a.appointment_id = ?");
        sqlx::query_as::<_, AppointmentDetails>(&sql)
            .bind(appointment_id)
            .fetch_optional(&self.connection_pool)
            .await
    }

    #[instrument(skip(self))]
    pub async fn find_many(
        &self,
        scope: AppointmentScope,
        query: &AppointmentQuery,
    ) -> Result<Vec<AppointmentDetails>, Error> {
        debug!("Listing appointments");
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(DETAILS_SELECT);
        builder.push(" WHERE 1 = 1");

        match scope {
            AppointmentScope::All => {}
            AppointmentScope::Patient(patient_id) => {
                builder.push(" AND a.patient_id = ").push_bind(patient_id);
            }
            AppointmentScope::Doctor(doctor_id) => {
                builder.push(" AND a.doctor_id = ").push_bind(doctor_id);
            }
        }
        if let Some(status) = query.status {
            builder.push(" AND a.status = ").push_bind(status);
        }
        if let Some(date) = query.date {
            builder.push(" AND date(a.scheduled_at) = ").push_bind(date);
        }
        builder.push(" ORDER BY a.scheduled_at, a.appointment_id");

        builder
            .build_query_as::<AppointmentDetails>()
            .fetch_all(&self.connection_pool)
            .await
    }

    /// Start times of the doctor's pending or confirmed appointments in `[from, to)`
    #[instrument(skip(self))]
    pub async fn find_booked_times(
        &self,
        doctor_id: &i64,
        from: &DateTime<Utc>,
        to: &DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, Error> {
        sqlx::query_scalar::<_, DateTime<Utc>>(
            "SELECT scheduled_at FROM appointments \
             WHERE doctor_id = ? AND status IN ('pending', 'confirmed') \
               AND scheduled_at >= ? AND scheduled_at < ? \
             ORDER BY scheduled_at",
        )
        .bind(doctor_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.connection_pool)
        .await
    }

    /// Inserts a pending appointment unless another pending or confirmed one of
    /// the same doctor starts less than `slot` away. The check and the insert are
    /// a single statement, so concurrent bookings cannot both take the slot.
    /// Returns `None` when the slot is taken.
    #[instrument(skip(self, data), fields(doctor_id = %data.doctor_id, patient_id = %data.patient_id))]
    pub async fn book_if_free(
        &self,
        data: &CreateAppointmentDTO,
        slot: Duration,
    ) -> Result<Option<Appointment>, Error> {
        let sql = format!(
            "INSERT INTO appointments (patient_id, doctor_id, scheduled_at, reason, status, created_at) \
             SELECT ?, ?, ?, ?, ?, ? \
             WHERE NOT EXISTS (SELECT 1 FROM appointments \
                 WHERE doctor_id = ? AND status IN ('pending', 'confirmed') \
                   AND scheduled_at > ? AND scheduled_at < ?) \
             RETURNING {APPOINTMENT_COLUMNS}"
        );
        let appointment = sqlx::query_as::<_, Appointment>(&sql)
            .bind(data.patient_id)
            .bind(data.doctor_id)
            .bind(data.scheduled_at)
            .bind(&data.reason)
            .bind(AppointmentStatus::Pending)
            .bind(Utc::now())
            .bind(data.doctor_id)
            .bind(data.scheduled_at - slot)
            .bind(data.scheduled_at + slot)
            .fetch_optional(&self.connection_pool)
            .await?;
        match &appointment {
            Some(a) => info!("Appointment {} booked", a.appointment_id),
            None => debug!("Slot already taken"),
        }
        Ok(appointment)
    }

    /// Moves an appointment from `from` to `to`. Returns `None` when it is no
    /// longer in `from` (a concurrent update won).
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        appointment_id: &i64,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<Option<Appointment>, Error> {
        let sql = format!(
            "UPDATE appointments SET status = ? WHERE appointment_id = ? AND status = ? RETURNING {APPOINTMENT_COLUMNS}"
        );
        let appointment = sqlx::query_as::<_, Appointment>(&sql)
            .bind(to)
            .bind(appointment_id)
            .bind(from)
            .fetch_optional(&self.connection_pool)
            .await?;
        if appointment.is_some() {
            info!("Appointment status moved from {} to {}", from, to);
        }
        Ok(appointment)
    }

    #[instrument(skip(self, notes))]
    pub async fn update_notes(&self, appointment_id: &i64, notes: &str) -> Result<Appointment, Error> {
        let sql = format!("UPDATE appointments SET notes = ? WHERE appointment_id = ? RETURNING {APPOINTMENT_COLUMNS}");
        sqlx::query_as::<_, Appointment>(&sql)
            .bind(notes)
            .bind(appointment_id)
            .fetch_optional(&self.connection_pool)
            .await?
            .ok_or(Error::RowNotFound)
    }

    /// Pending or confirmed appointments falling on `date` (UTC)
    pub async fn count_open_on(&self, date: NaiveDate) -> Result<i64, Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM appointments \
             WHERE date(scheduled_at) = ? AND status IN ('pending', 'confirmed')",
        )
        .bind(date)
        .fetch_one(&self.connection_pool)
        .await
    }
}

impl Read<Appointment, i64> for AppointmentRepository {
    #[instrument(skip(self), fields(appointment_id = %id))]
    async fn read(&self, id: &i64) -> Result<Option<Appointment>, Error> {
        let sql = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE appointment_id = ?");
        sqlx::query_as::<_, Appointment>(&sql)
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}

impl Delete<i64> for AppointmentRepository {
    #[instrument(skip(self), fields(appointment_id = %id))]
    async fn delete(&self, id: &i64) -> Result<(), Error> {
        let result = sqlx::query("DELETE FROM appointments WHERE appointment_id = ?")
            .bind(id)
            .execute(&self.connection_pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::RowNotFound);
        }
        Ok(())
    }
}

/// Which prescriptions a caller may list
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrescriptionScope {
    All,
    Patient(i64),
    Doctor(i64),
}

const PRESCRIPTION_COLUMNS: &str =
    "prescription_id, doctor_id, patient_id, appointment_id, medicines, instructions, created_at";

pub struct PrescriptionRepository {
    connection_pool: SqlitePool,
}

impl PrescriptionRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    #[instrument(skip(self))]
    pub async fn find_many(
        &self,
        scope: PrescriptionScope,
        patient_id: Option<i64>,
    ) -> Result<Vec<Prescription>, Error> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {PRESCRIPTION_COLUMNS} FROM prescriptions WHERE 1 = 1"));
        match scope {
            PrescriptionScope::All => {}
            PrescriptionScope::Patient(id) => {
                builder.push(" AND patient_id = ").push_bind(id);
            }
            PrescriptionScope::Doctor(id) => {
                builder.push(" AND doctor_id = ").push_bind(id);
            }
        }
        if let Some(patient_id) = patient_id {
            builder.push(" AND patient_id = ").push_bind(patient_id);
        }
        builder.push(" ORDER BY created_at DESC, prescription_id DESC");

        builder
            .build_query_as::<Prescription>()
            .fetch_all(&self.connection_pool)
            .await
    }
}

impl Create<Prescription, NewPrescriptionDTO> for PrescriptionRepository {
    #[instrument(skip(self, data), fields(doctor_id = %data.doctor_id, patient_id = %data.patient_id))]
    async fn create(&self, data: &NewPrescriptionDTO) -> Result<Prescription, Error> {
        let sql = format!(
            "INSERT INTO prescriptions (doctor_id, patient_id, appointment_id, medicines, instructions, created_at) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING {PRESCRIPTION_COLUMNS}"
        );
        let prescription = sqlx::query_as::<_, Prescription>(&sql)
            .bind(data.doctor_id)
            .bind(data.patient_id)
            .bind(data.appointment_id)
            .bind(&data.medicines)
            .bind(&data.instructions)
            .bind(Utc::now())
            .fetch_one(&self.connection_pool)
            .await?;
        info!("Prescription {} written", prescription.prescription_id);
        Ok(prescription)
    }
}

impl Read<Prescription, i64> for PrescriptionRepository {
    async fn read(&self, id: &i64) -> Result<Option<Prescription>, Error> {
        let sql = format!("SELECT {PRESCRIPTION_COLUMNS} FROM prescriptions WHERE prescription_id = ?");
        sqlx::query_as::<_, Prescription>(&sql)
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}
