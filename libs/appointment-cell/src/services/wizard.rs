// libs/appointment-cell/src/services/wizard.rs
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use doctor_cell::models::{format_date, parse_date, DoctorProfile};
use doctor_cell::services::AvailabilityCalculator;
use shared_models::auth::PatientIdentity;

use crate::models::{
    is_known_time_slot, AppointmentError, AppointmentRecord, AppointmentType, DateOption,
    ScheduleView, TimeOption, WizardField, WizardSnapshot, WizardState, WizardStep, TIME_SLOTS,
};

/// Everything the submitter needs once the wizard has been validated locally.
#[derive(Debug, Clone)]
pub struct SubmissionDraft {
    pub appointment_type: AppointmentType,
    pub doctor_id: String,
    pub date: NaiveDate,
    pub time: String,
}

/// Four-step booking flow for one patient: visit type, doctor, date/time,
/// confirmation.
///
/// Forward moves are guarded by the current step's fields. Going back and
/// changing an earlier answer keeps later answers as they were, so the
/// schedule step re-checks the stored date instead of trusting it.
#[derive(Debug, Clone)]
pub struct BookingWizard {
    identity: PatientIdentity,
    availability: AvailabilityCalculator,
    state: WizardState,
}

impl BookingWizard {
    pub fn new(identity: PatientIdentity, availability: AvailabilityCalculator) -> Self {
        debug!(
            "Starting booking wizard for patient {} with {} doctors",
            identity.patient_id,
            availability.doctors().len()
        );

        Self {
            identity,
            availability,
            state: WizardState::default(),
        }
    }

    pub fn identity(&self) -> &PatientIdentity {
        &self.identity
    }

    pub fn availability(&self) -> &AvailabilityCalculator {
        &self.availability
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn step(&self) -> WizardStep {
        self.state.step
    }

    pub fn is_submitting(&self) -> bool {
        self.state.submitting
    }

    pub fn confirmation(&self) -> Option<&AppointmentRecord> {
        self.state.confirmation.as_ref()
    }

    // ------------------------------------------------------------------
    // Field selection
    // ------------------------------------------------------------------

    pub fn select_type(&mut self, appointment_type: AppointmentType) -> Result<(), AppointmentError> {
        self.ensure_editable(WizardField::AppointmentType)?;
        self.state.appointment_type = Some(appointment_type);
        debug!("Appointment type set to {}", appointment_type);
        Ok(())
    }

    pub fn select_doctor(&mut self, doctor_id: &str) -> Result<(), AppointmentError> {
        self.ensure_editable(WizardField::Doctor)?;

        if self.availability.doctor(doctor_id).is_none() {
            warn!("Patient {} picked unlisted doctor {}", self.identity.patient_id, doctor_id);
            return Err(AppointmentError::DoctorNotFound(doctor_id.to_string()));
        }

        // selected_date is deliberately left alone, see visible_selected_date
        self.state.selected_doctor_id = Some(doctor_id.to_string());
        debug!("Doctor set to {}", doctor_id);
        Ok(())
    }

    pub fn select_date(&mut self, date: &str) -> Result<(), AppointmentError> {
        self.ensure_editable(WizardField::Date)?;

        let parsed = parse_date(date)
            .ok_or_else(|| AppointmentError::ValidationError(format!("'{}' is not a valid date", date)))?;
        let canonical = format_date(parsed);
        let doctor_id = self.state.selected_doctor_id.as_deref();

        if !self.availability.is_date_selectable(&canonical, None) {
            return Err(AppointmentError::ValidationError(format!(
                "{} is not a bookable date",
                canonical
            )));
        }

        if let Some(doctor_id) = doctor_id {
            if !self.availability.is_doctor_available(doctor_id, &canonical) {
                return Err(AppointmentError::DoctorUnavailable {
                    doctor_id: doctor_id.to_string(),
                    date: canonical,
                });
            }
        }

        debug!("Date set to {}", canonical);
        self.state.selected_date = Some(canonical);
        Ok(())
    }

    pub fn select_time(&mut self, time: &str) -> Result<(), AppointmentError> {
        self.ensure_editable(WizardField::Time)?;

        let time = time.trim();
        if !is_known_time_slot(time) {
            return Err(AppointmentError::ValidationError(format!(
                "'{}' is not an available time slot",
                time
            )));
        }

        self.state.selected_time = Some(time.to_string());
        debug!("Time set to {}", time);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    pub fn handle_continue(&mut self) -> Result<WizardStep, AppointmentError> {
        self.ensure_idle()?;

        let current = self.state.step;
        let next = current.next().ok_or_else(|| {
            AppointmentError::InvalidTransition("already on the confirmation step".to_string())
        })?;

        if let Some(field) = self.missing_field_for(current) {
            warn!("Continue rejected on {}: {} missing", current, field);
            return Err(AppointmentError::MissingField(field));
        }

        self.state.step = next;
        info!("Booking wizard for patient {} advanced to {}", self.identity.patient_id, next);
        Ok(next)
    }

    pub fn handle_back(&mut self) -> Result<WizardStep, AppointmentError> {
        self.ensure_idle()?;

        let previous = self.state.step.previous().ok_or_else(|| {
            AppointmentError::InvalidTransition("already on the first step".to_string())
        })?;

        self.state.step = previous;
        debug!("Booking wizard moved back to {}", previous);
        Ok(previous)
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Step-2 listing, exactly as the directory returned it.
    pub fn doctor_options(&self) -> &[DoctorProfile] {
        self.availability.doctors()
    }

    pub fn selected_doctor(&self) -> Option<&DoctorProfile> {
        self.state
            .selected_doctor_id
            .as_deref()
            .and_then(|id| self.availability.doctor(id))
    }

    /// The stored date, but only while it is still bookable with the
    /// currently selected doctor.
    pub fn visible_selected_date(&self) -> Option<&str> {
        self.state.selected_date.as_deref().filter(|date| {
            self.availability
                .is_date_selectable(date, self.state.selected_doctor_id.as_deref())
        })
    }

    pub fn schedule_view(&self) -> ScheduleView {
        let visible = self.visible_selected_date();
        let dates = self
            .availability
            .selectable_dates(self.state.selected_doctor_id.as_deref())
            .into_iter()
            .map(|date| DateOption {
                selected: visible == Some(date.as_str()),
                date,
            })
            .collect();

        let chosen_time = self.state.selected_time.as_deref();
        let times = TIME_SLOTS
            .iter()
            .map(|&time| TimeOption {
                time,
                selected: chosen_time == Some(time),
            })
            .collect();

        ScheduleView { dates, times }
    }

    pub fn snapshot(&self) -> WizardSnapshot {
        WizardSnapshot {
            step: self.state.step.number(),
            step_name: self.state.step.name(),
            appointment_type: self.state.appointment_type,
            selected_doctor_id: self.state.selected_doctor_id.clone(),
            selected_date: self.visible_selected_date().map(str::to_string),
            selected_time: self.state.selected_time.clone(),
            submitting: self.state.submitting,
            doctors: self.availability.doctors().to_vec(),
            schedule: self.schedule_view(),
            confirmation: self.state.confirmation.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Submission bookkeeping, driven by AppointmentSubmitter
    // ------------------------------------------------------------------

    /// Validate against the local snapshot and mark the wizard as submitting.
    pub(crate) fn begin_submission(&mut self) -> Result<SubmissionDraft, AppointmentError> {
        self.ensure_idle()?;

        let appointment_type = self
            .state
            .appointment_type
            .ok_or(AppointmentError::MissingField(WizardField::AppointmentType))?;
        let doctor_id = self
            .state
            .selected_doctor_id
            .clone()
            .ok_or(AppointmentError::MissingField(WizardField::Doctor))?;
        let date = self
            .state
            .selected_date
            .clone()
            .ok_or(AppointmentError::MissingField(WizardField::Date))?;
        let time = self
            .state
            .selected_time
            .clone()
            .ok_or(AppointmentError::MissingField(WizardField::Time))?;

        let doctor = self
            .availability
            .doctor(&doctor_id)
            .ok_or_else(|| AppointmentError::DoctorNotFound(doctor_id.clone()))?;

        if !doctor.is_active() {
            return Err(AppointmentError::DoctorInactive(doctor_id));
        }

        let parsed = parse_date(&date)
            .filter(|_| self.availability.is_doctor_available(&doctor_id, &date))
            .ok_or_else(|| AppointmentError::DoctorUnavailable {
                doctor_id: doctor_id.clone(),
                date: date.clone(),
            })?;

        self.state.submitting = true;

        Ok(SubmissionDraft {
            appointment_type,
            doctor_id,
            date: parsed,
            time,
        })
    }

    /// Clear the in-flight flag; a persisted record moves the wizard to its
    /// booked state. Selections are kept either way.
    pub(crate) fn finish_submission(&mut self, persisted: Option<AppointmentRecord>) {
        self.state.submitting = false;
        if let Some(record) = persisted {
            self.state.step = WizardStep::Confirmation;
            self.state.confirmation = Some(record);
        }
    }

    fn missing_field_for(&self, step: WizardStep) -> Option<WizardField> {
        match step {
            WizardStep::VisitType => self
                .state
                .appointment_type
                .is_none()
                .then_some(WizardField::AppointmentType),
            WizardStep::Doctor => self
                .state
                .selected_doctor_id
                .is_none()
                .then_some(WizardField::Doctor),
            WizardStep::Schedule => {
                // a stored date the current doctor can't take counts as unset
                if self.visible_selected_date().is_none() {
                    Some(WizardField::Date)
                } else if self.state.selected_time.is_none() {
                    Some(WizardField::Time)
                } else {
                    None
                }
            }
            WizardStep::Confirmation => None,
        }
    }

    fn ensure_idle(&self) -> Result<(), AppointmentError> {
        if self.state.submitting {
            return Err(AppointmentError::SubmissionInProgress);
        }
        if self.state.confirmation.is_some() {
            return Err(AppointmentError::AlreadySubmitted);
        }
        Ok(())
    }

    fn ensure_editable(&self, field: WizardField) -> Result<(), AppointmentError> {
        self.ensure_idle()?;

        let owner = field.owning_step();
        if self.state.step != owner {
            return Err(AppointmentError::ValidationError(format!(
                "the {} is chosen on {}, wizard is on {}",
                field, owner, self.state.step
            )));
        }
        Ok(())
    }
}
