//! Repositories module - one repository per table family
//!
//! Each repository owns a clone of the connection pool and exposes the CRUD
//! traits from [`traits`] plus whatever lookups its handlers need.

// ************************* A NOTE ON SQLX ************************* //

/*
   Queries are written with the runtime API: `sqlx::query_as::<_, T>(sql)`
   for rows mapped through `#[derive(sqlx::FromRow)]`, `sqlx::query_scalar`
   for aggregates and `QueryBuilder` whenever the WHERE clause depends on
   optional filters. No DATABASE_URL is needed to compile the crate.

   Number of rows   Method                      Returns
   None             .execute(...).await         QueryResult (check rows_affected)
   Zero or one      .fetch_optional(...).await  Option<T>
   Exactly one      .fetch_one(...).await       T, RowNotFound otherwise
   Many             .fetch_all(...).await       Vec<T>

   Writes use `INSERT ... RETURNING` so the stored row comes back in one
   round trip. Anything that touches more than one table runs inside
   `pool.begin()` and commits at the end; returning early drops the
   transaction and rolls it back.

   Errors are plain `sqlx::Error` and travel up with `?`; the conversion
   into an HTTP status lives in `core::error`.
*/

pub mod appointment;
pub mod catalog;
pub mod conversation;
pub mod course;
pub mod doctor;
pub mod order;
pub mod profile;
pub mod traits;
pub mod user;

pub use traits::{Create, Delete, Read, Update};

pub use appointment::{AppointmentRepository, AppointmentScope, PrescriptionRepository, PrescriptionScope};
pub use catalog::{CategoryRepository, MedicineRepository};
pub use conversation::{ConversationRepository, InboxRow};
pub use course::{ApplicationRepository, CourseRepository, NewApplication};
pub use doctor::DoctorRepository;
pub use order::{OrderRepository, PlaceOrderOutcome};
pub use profile::{PatientRepository, StudentRepository};
pub use user::UserRepository;
