#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use tokio::sync::Notify;

use appointment_cell::models::{AppointmentError, AppointmentRecord};
use appointment_cell::services::{AppointmentStore, BookingWizard};
use doctor_cell::models::{Doctor, DoctorStatus};
use doctor_cell::services::{AvailabilityCalculator, DoctorDirectory, InMemoryDoctorDirectory};
use shared_models::auth::PatientIdentity;

pub fn doctor(id: &str, status: DoctorStatus, dates: &[&str]) -> Doctor {
    Doctor {
        id: id.to_string(),
        name: format!("Dr. {}", id),
        specialization: "General Practice".to_string(),
        status,
        image: None,
        rating: 4.6,
        available_dates: dates.iter().map(|d| d.to_string()).collect(),
    }
}

pub fn patient() -> PatientIdentity {
    PatientIdentity::new("P1", "Ada Obi", "patient-token")
}

/// Friday 2025-06-06, so 2025-06-10 is the following Tuesday.
pub fn anchor() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 6).unwrap()
}

/// First weekday strictly after today, formatted for the backend.
pub fn next_weekday_from_today(skip: i64) -> String {
    let today = Utc::now().date_naive();
    (1..)
        .map(|offset| today + Duration::days(offset))
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .nth(skip as usize)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap()
}

pub async fn wizard_for(directory: &InMemoryDoctorDirectory) -> BookingWizard {
    let doctors = directory.list_active_doctors(None).await.unwrap();
    BookingWizard::new(patient(), AvailabilityCalculator::anchored(anchor(), 30, doctors))
}

/// Store that accepts everything and remembers what it was given.
#[derive(Default)]
pub struct RecordingStore {
    pub created: Mutex<Vec<AppointmentRecord>>,
    pub tokens: Mutex<Vec<String>>,
}

impl RecordingStore {
    pub fn created(&self) -> Vec<AppointmentRecord> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl AppointmentStore for RecordingStore {
    async fn create_appointment(
        &self,
        record: &AppointmentRecord,
        auth_token: &str,
    ) -> Result<AppointmentRecord, AppointmentError> {
        let mut stored = record.clone();
        let mut created = self.created.lock().unwrap();
        stored.id = Some(format!("appt-{}", created.len() + 1));
        created.push(stored.clone());
        self.tokens.lock().unwrap().push(auth_token.to_string());
        Ok(stored)
    }
}

/// Store that always fails with the given message.
pub struct FailingStore {
    pub message: String,
    pub calls: AtomicUsize,
}

impl FailingStore {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AppointmentStore for FailingStore {
    async fn create_appointment(
        &self,
        _record: &AppointmentRecord,
        _auth_token: &str,
    ) -> Result<AppointmentRecord, AppointmentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(AppointmentError::Collaborator(self.message.clone()))
    }
}

/// Store that parks every call until released, to hold a submission in flight.
#[derive(Default)]
pub struct GatedStore {
    pub entered: Notify,
    pub release: Notify,
    pub calls: AtomicUsize,
}

impl GatedStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AppointmentStore for GatedStore {
    async fn create_appointment(
        &self,
        record: &AppointmentRecord,
        _auth_token: &str,
    ) -> Result<AppointmentRecord, AppointmentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.release.notified().await;

        let mut stored = record.clone();
        stored.id = Some("appt-gated".to_string());
        Ok(stored)
    }
}

pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
