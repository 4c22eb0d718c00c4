//! Entities module - rows persisted in the database
//!
//! Every entity maps to a table (or to a join used for listings).

pub mod appointment;
pub mod catalog;
pub mod conversation;
pub mod course;
pub mod doctor;
pub mod enums;
pub mod order;
pub mod patient;
pub mod user;

pub use appointment::{Appointment, AppointmentDetails, Prescription};
pub use catalog::{Category, Medicine};
pub use conversation::{Conversation, Message};
pub use course::{Application, ApplicationDetails, Course};
pub use doctor::{Availability, Doctor, DoctorProfile};
pub use enums::{ApplicationStatus, AppointmentStatus, OrderStatus, Role};
pub use order::{Order, OrderItem};
pub use patient::{Patient, PatientProfile, Student, StudentProfile};
pub use user::User;
