use std::sync::RwLock;

use async_trait::async_trait;
use reqwest::Method;
use tracing::{debug, error};

use shared_config::AppConfig;
use shared_database::supabase::{backend_message, SupabaseClient};

use crate::models::{Doctor, DoctorError, DoctorProfile};

/// Read side of the doctor collection used by the booking flow.
#[async_trait]
pub trait DoctorDirectory: Send + Sync {
    /// Only doctors whose status is active.
    async fn list_active_doctors(&self, auth_token: Option<&str>) -> Result<Vec<DoctorProfile>, DoctorError>;

    /// Any doctor regardless of status, `None` when the id is unknown.
    async fn find_doctor(&self, doctor_id: &str, auth_token: Option<&str>) -> Result<Option<DoctorProfile>, DoctorError>;
}

pub struct SupabaseDoctorDirectory {
    supabase: SupabaseClient,
}

impl SupabaseDoctorDirectory {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    async fn fetch(&self, path: &str, auth_token: Option<&str>) -> Result<Vec<Doctor>, DoctorError> {
        self.supabase
            .request::<Vec<Doctor>>(Method::GET, path, auth_token, None)
            .await
            .map_err(|e| {
                error!("Doctor directory read failed: {}", e);
                DoctorError::Directory(backend_message(&e))
            })
    }
}

#[async_trait]
impl DoctorDirectory for SupabaseDoctorDirectory {
    async fn list_active_doctors(&self, auth_token: Option<&str>) -> Result<Vec<DoctorProfile>, DoctorError> {
        let rows = self
            .fetch("/rest/v1/doctors?status=eq.Active&order=name.asc", auth_token)
            .await?;

        debug!("Fetched {} active doctors", rows.len());

        // PostgREST already filtered; keep the contract even if the table holds odd casing
        Ok(rows
            .into_iter()
            .map(DoctorProfile::from_record)
            .filter(DoctorProfile::is_active)
            .collect())
    }

    async fn find_doctor(&self, doctor_id: &str, auth_token: Option<&str>) -> Result<Option<DoctorProfile>, DoctorError> {
        let path = format!("/rest/v1/doctors?id=eq.{}", urlencoding::encode(doctor_id));
        let rows = self.fetch(&path, auth_token).await?;

        Ok(rows.into_iter().next().map(DoctorProfile::from_record))
    }
}

/// Directory held in process memory, for local runs without a backend.
#[derive(Default)]
pub struct InMemoryDoctorDirectory {
    doctors: RwLock<Vec<Doctor>>,
}

impl InMemoryDoctorDirectory {
    pub fn new(doctors: Vec<Doctor>) -> Self {
        Self {
            doctors: RwLock::new(doctors),
        }
    }

    /// Insert or replace by id.
    pub fn upsert(&self, doctor: Doctor) {
        let mut doctors = self.doctors.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        match doctors.iter_mut().find(|existing| existing.id == doctor.id) {
            Some(existing) => *existing = doctor,
            None => doctors.push(doctor),
        }
    }

    /// Replace a doctor's available dates, returns false for an unknown id.
    pub fn set_available_dates(&self, doctor_id: &str, dates: Vec<String>) -> bool {
        let mut doctors = self.doctors.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        match doctors.iter_mut().find(|doctor| doctor.id == doctor_id) {
            Some(doctor) => {
                doctor.available_dates = dates;
                true
            }
            None => false,
        }
    }

    fn snapshot(&self) -> Vec<Doctor> {
        self.doctors
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl DoctorDirectory for InMemoryDoctorDirectory {
    async fn list_active_doctors(&self, _auth_token: Option<&str>) -> Result<Vec<DoctorProfile>, DoctorError> {
        Ok(self
            .snapshot()
            .into_iter()
            .filter(|doctor| doctor.status.is_active())
            .map(DoctorProfile::from_record)
            .collect())
    }

    async fn find_doctor(&self, doctor_id: &str, _auth_token: Option<&str>) -> Result<Option<DoctorProfile>, DoctorError> {
        Ok(self
            .snapshot()
            .into_iter()
            .find(|doctor| doctor.id == doctor_id)
            .map(DoctorProfile::from_record))
    }
}
