pub mod feed;
pub mod sessions;
pub mod store;
pub mod submitter;
pub mod wizard;

pub use feed::{AppointmentFeed, AppointmentSubscription, FeedFilter};
pub use sessions::BookingSessions;
pub use store::{AppointmentStore, SupabaseAppointmentStore};
pub use submitter::AppointmentSubmitter;
pub use wizard::{BookingWizard, SubmissionDraft};
