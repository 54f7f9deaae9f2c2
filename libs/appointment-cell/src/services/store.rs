// libs/appointment-cell/src/services/store.rs
use async_trait::async_trait;
use reqwest::Method;
use tracing::{debug, error};

use shared_config::AppConfig;
use shared_database::supabase::{backend_message, return_representation, SupabaseClient};

use crate::models::{AppointmentError, AppointmentRecord};

/// Write side of the `appointments` collection.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Persist a new record and return it as stored. Errors carry a message
    /// fit to show the patient.
    async fn create_appointment(
        &self,
        record: &AppointmentRecord,
        auth_token: &str,
    ) -> Result<AppointmentRecord, AppointmentError>;
}

pub struct SupabaseAppointmentStore {
    supabase: SupabaseClient,
}

impl SupabaseAppointmentStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn create_appointment(
        &self,
        record: &AppointmentRecord,
        auth_token: &str,
    ) -> Result<AppointmentRecord, AppointmentError> {
        debug!("Creating appointment for patient {} with doctor {}", record.patient_id, record.doctor_id);

        let body = serde_json::to_value(record)
            .map_err(|e| AppointmentError::ValidationError(format!("Unserializable appointment: {}", e)))?;

        let rows: Vec<AppointmentRecord> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                Some(auth_token),
                Some(body),
                Some(return_representation()),
            )
            .await
            .map_err(|e| {
                error!("Appointment insert failed: {}", e);
                AppointmentError::Collaborator(backend_message(&e))
            })?;

        rows.into_iter()
            .next()
            .ok_or_else(|| AppointmentError::Collaborator("Failed to create appointment".to_string()))
    }
}
