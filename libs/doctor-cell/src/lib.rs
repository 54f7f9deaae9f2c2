pub mod models;
pub mod services;

pub use models::{Doctor, DoctorError, DoctorProfile, DoctorStatus};
pub use services::{AvailabilityCalculator, DoctorDirectory, InMemoryDoctorDirectory, SupabaseDoctorDirectory};
