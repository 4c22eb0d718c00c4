//! CourseRepository and ApplicationRepository - the education side

use super::{Create, Delete, Read, Update};
use crate::dtos::{ApplicationQuery, CreateCourseDTO, UpdateCourseDTO, like_pattern};
use crate::entities::{Application, ApplicationDetails, ApplicationStatus, Course};
use chrono::Utc;
use sqlx::{Error, QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info, instrument};

const COURSE_COLUMNS: &str =
    "course_id, title, description, instructor, duration_weeks, fee_cents, start_date, created_at";
const APPLICATION_COLUMNS: &str =
    "application_id, course_id, student_id, statement, status, created_at, reviewed_at";

pub struct CourseRepository {
    connection_pool: SqlitePool,
}

impl CourseRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Lists courses, soonest start first, optionally matching title or instructor
    #[instrument(skip(self))]
    pub async fn find_many(&self, search: Option<&str>) -> Result<Vec<Course>, Error> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {COURSE_COLUMNS} FROM courses WHERE 1 = 1"));
        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = like_pattern(term);
            builder
                .push(" AND (title LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR instructor LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }
        builder.push(" ORDER BY start_date IS NULL, start_date, title");

        builder
            .build_query_as::<Course>()
            .fetch_all(&self.connection_pool)
            .await
    }
}

impl Create<Course, CreateCourseDTO> for CourseRepository {
    #[instrument(skip(self, data), fields(title = %data.title))]
    async fn create(&self, data: &CreateCourseDTO) -> Result<Course, Error> {
        let sql = format!(
            "INSERT INTO courses (title, description, instructor, duration_weeks, fee_cents, start_date, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {COURSE_COLUMNS}"
        );
        let course = sqlx::query_as::<_, Course>(&sql)
            .bind(data.title.trim())
            .bind(&data.description)
            .bind(&data.instructor)
            .bind(data.duration_weeks)
            .bind(data.fee_cents)
            .bind(data.start_date)
            .bind(Utc::now())
            .fetch_one(&self.connection_pool)
            .await?;
        info!("Course {} created", course.course_id);
        Ok(course)
    }
}

impl Read<Course, i64> for CourseRepository {
    async fn read(&self, id: &i64) -> Result<Option<Course>, Error> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE course_id = ?");
        sqlx::query_as::<_, Course>(&sql)
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}

impl Update<Course, UpdateCourseDTO, i64> for CourseRepository {
    #[instrument(skip(self, data), fields(course_id = %id))]
    async fn update(&self, id: &i64, data: &UpdateCourseDTO) -> Result<Course, Error> {
        let current = self.read(id).await?.ok_or(Error::RowNotFound)?;
        if data.title.is_none()
            && data.description.is_none()
            && data.instructor.is_none()
            && data.duration_weeks.is_none()
            && data.fee_cents.is_none()
            && data.start_date.is_none()
        {
            return Ok(current);
        }

        let mut query_builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE courses SET ");
        let mut separated = query_builder.separated(", ");
        if let Some(ref title) = data.title {
            separated.push("title = ");
            separated.push_bind_unseparated(title.trim().to_string());
        }
        if let Some(ref description) = data.description {
            separated.push("description = ");
            separated.push_bind_unseparated(description.clone());
        }
        if let Some(ref instructor) = data.instructor {
            separated.push("instructor = ");
            separated.push_bind_unseparated(instructor.clone());
        }
        if let Some(duration_weeks) = data.duration_weeks {
            separated.push("duration_weeks = ");
            separated.push_bind_unseparated(duration_weeks);
        }
        if let Some(fee_cents) = data.fee_cents {
            separated.push("fee_cents = ");
            separated.push_bind_unseparated(fee_cents);
        }
        if let Some(start_date) = data.start_date {
            separated.push("start_date = ");
            separated.push_bind_unseparated(start_date);
        }
        query_builder.push(" WHERE course_id = ");
        query_builder.push_bind(*id);
        query_builder.build().execute(&self.connection_pool).await?;

        self.read(id).await?.ok_or(Error::RowNotFound)
    }
}

impl Delete<i64> for CourseRepository {
    /// Applications to the course go with it
    #[instrument(skip(self), fields(course_id = %id))]
    async fn delete(&self, id: &i64) -> Result<(), Error> {
        let result = sqlx::query("DELETE FROM courses WHERE course_id = ?")
            .bind(id)
            .execute(&self.connection_pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::RowNotFound);
        }
        info!("Course deleted");
        Ok(())
    }
}

/// Row for a new application; the student id comes from the caller's profile
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub course_id: i64,
    pub student_id: i64,
    pub statement: Option<String>,
}

pub struct ApplicationRepository {
    connection_pool: SqlitePool,
}

impl ApplicationRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Lists applications joined with course title and student name, newest first.
    /// `student_id = None` lists every student's applications.
    #[instrument(skip(self))]
    pub async fn find_many(
        &self,
        student_id: Option<i64>,
        filter: &ApplicationQuery,
    ) -> Result<Vec<ApplicationDetails>, Error> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT a.application_id, a.course_id, c.title AS course_title, a.student_id, \
             u.name AS student_name, a.statement, a.status, a.created_at, a.reviewed_at \
             FROM applications a \
             INNER JOIN courses c ON c.course_id = a.course_id \
             INNER JOIN students s ON s.student_id = a.student_id \
             INNER JOIN users u ON u.user_id = s.user_id \
             WHERE 1 = 1",
        );
        if let Some(student_id) = student_id {
            builder.push(" AND a.student_id = ").push_bind(student_id);
        }
        if let Some(status) = filter.status {
            builder.push(" AND a.status = ").push_bind(status);
        }
        if let Some(course_id) = filter.course_id {
            builder.push(" AND a.course_id = ").push_bind(course_id);
        }
        builder.push(" ORDER BY a.created_at DESC, a.application_id DESC");

        builder
            .build_query_as::<ApplicationDetails>()
            .fetch_all(&self.connection_pool)
            .await
    }

    /// Records a review decision; only applications still pending are touched.
    /// Returns `None` when the application was already reviewed.
    #[instrument(skip(self))]
    pub async fn review(
        &self,
        application_id: &i64,
        status: ApplicationStatus,
    ) -> Result<Option<Application>, Error> {
        let sql = format!(
            "UPDATE applications SET status = ?, reviewed_at = ? \
             WHERE application_id = ? AND status = 'pending' RETURNING {APPLICATION_COLUMNS}"
        );
        let reviewed = sqlx::query_as::<_, Application>(&sql)
            .bind(status)
            .bind(Utc::now())
            .bind(application_id)
            .fetch_optional(&self.connection_pool)
            .await?;
        if reviewed.is_some() {
            info!("Application {} marked {}", application_id, status);
        } else {
            debug!("Application {} not pending", application_id);
        }
        Ok(reviewed)
    }

    pub async fn count_pending(&self) -> Result<i64, Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM applications WHERE status = 'pending'")
            .fetch_one(&self.connection_pool)
            .await
    }
}

impl Create<Application, NewApplication> for ApplicationRepository {
    #[instrument(skip(self, data), fields(course_id = %data.course_id, student_id = %data.student_id))]
    async fn create(&self, data: &NewApplication) -> Result<Application, Error> {
        let sql = format!(
            "INSERT INTO applications (course_id, student_id, statement, status, created_at) \
             VALUES (?, ?, ?, ?, ?) RETURNING {APPLICATION_COLUMNS}"
        );
        let application = sqlx::query_as::<_, Application>(&sql)
            .bind(data.course_id)
            .bind(data.student_id)
            .bind(&data.statement)
            .bind(ApplicationStatus::Pending)
            .bind(Utc::now())
            .fetch_one(&self.connection_pool)
            .await?;
        info!("Application {} submitted", application.application_id);
        Ok(application)
    }
}

impl Read<Application, i64> for ApplicationRepository {
    async fn read(&self, id: &i64) -> Result<Option<Application>, Error> {
        let sql = format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE application_id = ?");
        sqlx::query_as::<_, Application>(&sql)
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}

impl Delete<i64> for ApplicationRepository {
    #[instrument(skip(self), fields(application_id = %id))]
    async fn delete(&self, id: &i64) -> Result<(), Error> {
        let result = sqlx::query("DELETE FROM applications WHERE application_id = ?")
            .bind(id)
            .execute(&self.connection_pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::RowNotFound);
        }
        Ok(())
    }
}
