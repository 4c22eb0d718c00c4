//! DTOs module - Data Transfer Objects
//!
//! Request and response shapes exchanged with clients, kept apart from the
//! entities stored in the database.

pub mod appointment;
pub mod catalog;
pub mod conversation;
pub mod course;
pub mod doctor;
pub mod order;
pub mod profile;
pub mod query;
pub mod stats;
pub mod user;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Optional leading `+`, then 7 to 15 digits
    pub static ref PHONE_RE: Regex = Regex::new(r"^\+?[0-9]{7,15}$").unwrap();
}

pub use appointment::{
    AppointmentNotesDTO, AppointmentQuery, AppointmentStatusDTO, BookAppointmentDTO,
    CreateAppointmentDTO, CreatePrescriptionDTO, NewPrescriptionDTO, PrescriptionQuery,
};
pub use catalog::{CategoryDTO, CreateMedicineDTO, MedicineQuery, UpdateCategoryDTO, UpdateMedicineDTO};
pub use conversation::{ConversationDTO, MessagesQuery, SendMessageDTO, StartConversationDTO};
pub use course::{
    ApplicationQuery, ApplicationStatusDTO, ApplyDTO, CourseQuery, CreateCourseDTO, UpdateCourseDTO,
};
pub use doctor::{
    AvailabilityWindowDTO, CreateDoctorDTO, NewDoctorDTO, ReplaceAvailabilityDTO, SlotsQuery,
    UpdateDoctorDTO,
};
pub use order::{OrderDTO, OrderLineDTO, OrderQuery, OrderStatusDTO, PlaceOrderDTO};
pub use profile::{UpdatePatientDTO, UpdateStudentDTO};
pub use query::{DoctorQuery, UserQuery, like_pattern};
pub use stats::DashboardStatsDTO;
pub use user::{
    ChangePasswordDTO, CreateUserDTO, LoginDTO, LoginResponseDTO, RegisterDTO, UpdateMeDTO,
    UpdateUserDTO, UserDTO,
};
