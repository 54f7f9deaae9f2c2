// libs/appointment-cell/src/models.rs
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use doctor_cell::models::{DoctorError, DoctorProfile};
use shared_models::error::AppError;

// ==============================================================================
// APPOINTMENT RECORDS
// ==============================================================================

/// Time-of-day slots a patient may pick on the schedule step.
pub const TIME_SLOTS: [&str; 7] = [
    "9:00 AM", "10:00 AM", "11:00 AM", "1:00 PM", "2:00 PM", "3:00 PM", "4:00 PM",
];

pub fn is_known_time_slot(time: &str) -> bool {
    TIME_SLOTS.contains(&time)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AppointmentType {
    #[serde(rename = "in-person", alias = "in_person", alias = "InPerson")]
    InPerson,

    #[serde(rename = "telehealth", alias = "Telehealth", alias = "virtual")]
    Telehealth,
}

impl fmt::Display for AppointmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentType::InPerson => write!(f, "in-person"),
            AppointmentType::Telehealth => write!(f, "telehealth"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AppointmentStatus {
    #[serde(alias = "scheduled")]
    Scheduled,
    #[serde(alias = "completed")]
    Completed,
    #[serde(alias = "cancelled")]
    Cancelled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "Scheduled"),
            AppointmentStatus::Completed => write!(f, "Completed"),
            AppointmentStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Row of the `appointments` collection. Written once per booking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub patient_id: String,
    pub patient_name: String,
    pub doctor_id: String,
    pub date: String,
    pub time: String,
    #[serde(rename = "type")]
    pub appointment_type: AppointmentType,
    pub status: AppointmentStatus,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub notes: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// ==============================================================================
// WIZARD STATE
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    VisitType = 1,
    Doctor = 2,
    Schedule = 3,
    Confirmation = 4,
}

impl WizardStep {
    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            WizardStep::VisitType => "visit_type",
            WizardStep::Doctor => "doctor",
            WizardStep::Schedule => "schedule",
            WizardStep::Confirmation => "confirmation",
        }
    }

    pub fn next(self) -> Option<WizardStep> {
        match self {
            WizardStep::VisitType => Some(WizardStep::Doctor),
            WizardStep::Doctor => Some(WizardStep::Schedule),
            WizardStep::Schedule => Some(WizardStep::Confirmation),
            WizardStep::Confirmation => None,
        }
    }

    pub fn previous(self) -> Option<WizardStep> {
        match self {
            WizardStep::VisitType => None,
            WizardStep::Doctor => Some(WizardStep::VisitType),
            WizardStep::Schedule => Some(WizardStep::Doctor),
            WizardStep::Confirmation => Some(WizardStep::Schedule),
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} ({})", self.number(), self.name())
    }
}

/// Fields the guards check, used to tell the patient what is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardField {
    AppointmentType,
    Doctor,
    Date,
    Time,
}

impl WizardField {
    pub fn prompt(self) -> &'static str {
        match self {
            WizardField::AppointmentType => "Please select an appointment type",
            WizardField::Doctor => "Please select a doctor",
            WizardField::Date => "Please select a date",
            WizardField::Time => "Please select a time",
        }
    }

    pub fn owning_step(self) -> WizardStep {
        match self {
            WizardField::AppointmentType => WizardStep::VisitType,
            WizardField::Doctor => WizardStep::Doctor,
            WizardField::Date | WizardField::Time => WizardStep::Schedule,
        }
    }
}

impl fmt::Display for WizardField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WizardField::AppointmentType => "appointment type",
            WizardField::Doctor => "doctor",
            WizardField::Date => "date",
            WizardField::Time => "time",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WizardState {
    pub step: WizardStep,
    pub appointment_type: Option<AppointmentType>,
    pub selected_doctor_id: Option<String>,
    pub selected_date: Option<String>,
    pub selected_time: Option<String>,
    pub submitting: bool,
    pub confirmation: Option<AppointmentRecord>,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            step: WizardStep::VisitType,
            appointment_type: None,
            selected_doctor_id: None,
            selected_date: None,
            selected_time: None,
            submitting: false,
            confirmation: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DateOption {
    pub date: String,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TimeOption {
    pub time: &'static str,
    pub selected: bool,
}

/// What the schedule step renders for the current doctor.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScheduleView {
    pub dates: Vec<DateOption>,
    pub times: Vec<TimeOption>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WizardSnapshot {
    pub step: u8,
    pub step_name: &'static str,
    pub appointment_type: Option<AppointmentType>,
    pub selected_doctor_id: Option<String>,
    /// Only reported while still bookable with the selected doctor.
    pub selected_date: Option<String>,
    pub selected_time: Option<String>,
    pub submitting: bool,
    pub doctors: Vec<DoctorProfile>,
    pub schedule: ScheduleView,
    pub confirmation: Option<AppointmentRecord>,
}

// ==============================================================================
// SUBMISSION
// ==============================================================================

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Redirect {
    pub to: String,
    pub delay_ms: u64,
}

impl Redirect {
    pub fn new(to: impl Into<String>, delay: Duration) -> Self {
        Self {
            to: to.into(),
            delay_ms: delay.as_millis() as u64,
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubmissionReceipt {
    pub appointment: AppointmentRecord,
    pub notice: String,
    pub redirect: Redirect,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppointmentError {
    #[error("{}", .0.prompt())]
    MissingField(WizardField),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Doctor not found: {0}")]
    DoctorNotFound(String),

    #[error("Doctor {0} is not accepting appointments")]
    DoctorInactive(String),

    #[error("Doctor {doctor_id} is not available on {date}")]
    DoctorUnavailable { doctor_id: String, date: String },

    #[error("Invalid navigation: {0}")]
    InvalidTransition(String),

    #[error("An appointment submission is already in progress")]
    SubmissionInProgress,

    #[error("This appointment has already been booked")]
    AlreadySubmitted,

    #[error("Booking session not found")]
    SessionNotFound,

    /// Failure reported by the backend, message kept verbatim.
    #[error("{0}")]
    Collaborator(String),
}

impl AppointmentError {
    /// Local problems the patient can fix without anything changing remotely.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppointmentError::MissingField(_)
                | AppointmentError::ValidationError(_)
                | AppointmentError::DoctorNotFound(_)
                | AppointmentError::DoctorInactive(_)
                | AppointmentError::DoctorUnavailable { .. }
                | AppointmentError::InvalidTransition(_)
        )
    }
}

impl From<DoctorError> for AppointmentError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound(id) => AppointmentError::DoctorNotFound(id),
            DoctorError::Directory(msg) => AppointmentError::Collaborator(msg),
        }
    }
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        let message = err.to_string();
        match err {
            AppointmentError::DoctorNotFound(_) | AppointmentError::SessionNotFound => AppError::NotFound(message),
            AppointmentError::SubmissionInProgress | AppointmentError::AlreadySubmitted => AppError::Conflict(message),
            AppointmentError::Collaborator(_) => AppError::ExternalService(message),
            _ => AppError::ValidationError(message),
        }
    }
}
