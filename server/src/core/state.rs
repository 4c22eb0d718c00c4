//! Application State - shared by every route and middleware

use crate::core::config::Config;
use crate::core::throttle::LoginThrottle;
use crate::repositories::{
    AppointmentRepository, ApplicationRepository, CategoryRepository, ConversationRepository,
    CourseRepository, DoctorRepository, MedicineRepository, OrderRepository, PatientRepository,
    PrescriptionRepository, StudentRepository, UserRepository,
};
use sqlx::SqlitePool;
use std::time::{Duration, Instant};

pub struct AppState {
    pub user: UserRepository,
    pub doctor: DoctorRepository,
    pub patient: PatientRepository,
    pub student: StudentRepository,
    pub appointment: AppointmentRepository,
    pub prescription: PrescriptionRepository,
    pub category: CategoryRepository,
    pub medicine: MedicineRepository,
    pub order: OrderRepository,
    pub course: CourseRepository,
    pub application: ApplicationRepository,
    pub conversation: ConversationRepository,

    /// Kept for health checks and statistics that span tables
    pub pool: SqlitePool,

    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub bcrypt_cost: u32,

    /// Length of an appointment slot in minutes
    pub slot_minutes: i64,

    pub login_throttle: LoginThrottle,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: &Config) -> Self {
        Self {
            user: UserRepository::new(pool.clone()),
            doctor: DoctorRepository::new(pool.clone()),
            patient: PatientRepository::new(pool.clone()),
            student: StudentRepository::new(pool.clone()),
            appointment: AppointmentRepository::new(pool.clone()),
            prescription: PrescriptionRepository::new(pool.clone()),
            category: CategoryRepository::new(pool.clone()),
            medicine: MedicineRepository::new(pool.clone()),
            order: OrderRepository::new(pool.clone()),
            course: CourseRepository::new(pool.clone()),
            application: ApplicationRepository::new(pool.clone()),
            conversation: ConversationRepository::new(pool.clone()),
            pool,
            jwt_secret: config.jwt_secret.clone(),
            jwt_expiry_hours: config.jwt_expiry_hours,
            bcrypt_cost: config.bcrypt_cost,
            slot_minutes: config.slot_minutes,
            login_throttle: LoginThrottle::new(
                config.login_max_failures,
                Duration::from_secs(config.login_lockout_secs),
            ),
            started_at: Instant::now(),
        }
    }
}
