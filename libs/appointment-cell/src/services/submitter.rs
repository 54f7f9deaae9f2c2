// libs/appointment-cell/src/services/submitter.rs
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use doctor_cell::models::{format_date, DoctorProfile};
use doctor_cell::services::DoctorDirectory;
use shared_config::AppConfig;
use shared_models::auth::PatientIdentity;

use crate::models::{
    AppointmentError, AppointmentRecord, AppointmentStatus, Redirect, SubmissionReceipt,
};
use crate::services::feed::AppointmentFeed;
use crate::services::store::AppointmentStore;
use crate::services::wizard::{BookingWizard, SubmissionDraft};

/// Turns a completed wizard into a persisted appointment.
///
/// The session lock is only held to flip the wizard's `submitting` flag, so a
/// second submit that arrives while the backend call is pending is refused
/// instead of queued.
pub struct AppointmentSubmitter {
    directory: Arc<dyn DoctorDirectory>,
    store: Arc<dyn AppointmentStore>,
    feed: AppointmentFeed,
    dashboard_path: String,
    redirect_delay: Duration,
}

impl AppointmentSubmitter {
    pub fn new(
        config: &AppConfig,
        directory: Arc<dyn DoctorDirectory>,
        store: Arc<dyn AppointmentStore>,
        feed: AppointmentFeed,
    ) -> Self {
        Self {
            directory,
            store,
            feed,
            dashboard_path: config.patient_dashboard_path.clone(),
            redirect_delay: Duration::from_secs(config.booking_redirect_delay_secs),
        }
    }

    pub fn feed(&self) -> &AppointmentFeed {
        &self.feed
    }

    pub async fn submit(
        &self,
        session: &Mutex<BookingWizard>,
        notes: Option<String>,
    ) -> Result<SubmissionReceipt, AppointmentError> {
        let (draft, identity) = {
            let mut wizard = session.lock().await;
            let draft = wizard.begin_submission().map_err(|e| {
                warn!("Submission rejected locally: {}", e);
                e
            })?;
            (draft, wizard.identity().clone())
        };

        info!(
            "Submitting appointment for patient {} with doctor {} on {} at {}",
            identity.patient_id, draft.doctor_id, draft.date, draft.time
        );

        let outcome = self.persist(&draft, &identity, notes).await;

        let mut wizard = session.lock().await;
        match outcome {
            Ok((record, doctor)) => {
                wizard.finish_submission(Some(record.clone()));
                drop(wizard);

                let listeners = self.feed.publish(&record);
                info!(
                    "Appointment {:?} booked for patient {} ({} live listeners)",
                    record.id, record.patient_id, listeners
                );

                Ok(SubmissionReceipt {
                    notice: format!(
                        "Your {} appointment with {} on {} at {} is confirmed",
                        record.appointment_type, doctor.name, record.date, record.time
                    ),
                    appointment: record,
                    redirect: Redirect::new(self.dashboard_path.clone(), self.redirect_delay),
                })
            }
            Err(e) => {
                wizard.finish_submission(None);
                if e.is_validation() {
                    warn!("Submission for patient {} failed re-validation: {}", identity.patient_id, e);
                } else {
                    error!("Submission for patient {} failed: {}", identity.patient_id, e);
                }
                Err(e)
            }
        }
    }

    async fn persist(
        &self,
        draft: &SubmissionDraft,
        identity: &PatientIdentity,
        notes: Option<String>,
    ) -> Result<(AppointmentRecord, DoctorProfile), AppointmentError> {
        let doctor = self.revalidate(draft, identity).await?;

        let record = AppointmentRecord {
            id: None,
            patient_id: identity.patient_id.clone(),
            patient_name: identity.display_name.clone(),
            doctor_id: draft.doctor_id.clone(),
            date: format_date(draft.date),
            time: draft.time.clone(),
            appointment_type: draft.appointment_type,
            status: AppointmentStatus::Scheduled,
            notes: notes.map(|n| n.trim().to_string()).unwrap_or_default(),
        };

        let stored = self.store.create_appointment(&record, &identity.access_token).await?;
        Ok((stored, doctor))
    }

    /// Availability may have changed since the doctor list was loaded.
    async fn revalidate(
        &self,
        draft: &SubmissionDraft,
        identity: &PatientIdentity,
    ) -> Result<DoctorProfile, AppointmentError> {
        let doctor = self
            .directory
            .find_doctor(&draft.doctor_id, Some(&identity.access_token))
            .await?
            .ok_or_else(|| AppointmentError::DoctorNotFound(draft.doctor_id.clone()))?;

        if !doctor.is_active() {
            return Err(AppointmentError::DoctorInactive(doctor.id));
        }

        if !doctor.is_available_on(draft.date) {
            return Err(AppointmentError::DoctorUnavailable {
                doctor_id: doctor.id,
                date: format_date(draft.date),
            });
        }

        Ok(doctor)
    }
}
