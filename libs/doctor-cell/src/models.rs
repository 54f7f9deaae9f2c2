use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Wire format of every calendar date exchanged with the backend.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Avatar shown when a doctor record carries no image.
pub const DEFAULT_DOCTOR_IMAGE: &str = "/images/doctor-placeholder.png";

/// Row of the `doctors` collection as stored by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: String,
    pub name: String,
    pub specialization: String,
    pub status: DoctorStatus,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub available_dates: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DoctorStatus {
    #[serde(alias = "active", alias = "ACTIVE")]
    Active,
    #[serde(alias = "inactive", alias = "INACTIVE")]
    Inactive,
}

impl DoctorStatus {
    pub fn is_active(self) -> bool {
        self == DoctorStatus::Active
    }
}

impl fmt::Display for DoctorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DoctorStatus::Active => write!(f, "Active"),
            DoctorStatus::Inactive => write!(f, "Inactive"),
        }
    }
}

/// What the booking flow knows about a doctor: the stored fields plus the
/// display-only image, with availability parsed into real dates.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DoctorProfile {
    pub id: String,
    pub name: String,
    pub specialization: String,
    pub status: DoctorStatus,
    pub image_url: String,
    pub rating: f32,
    pub available_dates: BTreeSet<NaiveDate>,
}

impl DoctorProfile {
    /// Project a backend record. Unparseable availability entries are dropped.
    pub fn from_record(record: Doctor) -> Self {
        let available_dates = record
            .available_dates
            .iter()
            .filter_map(|raw| {
                let parsed = parse_date(raw);
                if parsed.is_none() {
                    warn!("Doctor {} has malformed available date '{}', ignoring", record.id, raw);
                }
                parsed
            })
            .collect();

        let image_url = record
            .image
            .filter(|image| !image.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DOCTOR_IMAGE.to_string());

        Self {
            id: record.id,
            name: record.name,
            specialization: record.specialization,
            status: record.status,
            image_url,
            rating: record.rating,
            available_dates,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn is_available_on(&self, date: NaiveDate) -> bool {
        self.is_active() && self.available_dates.contains(&date)
    }
}

impl From<Doctor> for DoctorProfile {
    fn from(record: Doctor) -> Self {
        DoctorProfile::from_record(record)
    }
}

/// Strict `YYYY-MM-DD` parse; anything else (including `2025-6-1`) is rejected.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date = NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()?;
    (format_date(date) == raw).then_some(date)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DoctorError {
    #[error("Doctor not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Directory(String),
}
