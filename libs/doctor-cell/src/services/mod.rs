pub mod availability;
pub mod directory;

pub use availability::AvailabilityCalculator;
pub use directory::{DoctorDirectory, InMemoryDoctorDirectory, SupabaseDoctorDirectory};
