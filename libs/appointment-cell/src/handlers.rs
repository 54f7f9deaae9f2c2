// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use doctor_cell::models::DoctorProfile;
use doctor_cell::services::{AvailabilityCalculator, DoctorDirectory, SupabaseDoctorDirectory};
use shared_config::AppConfig;
use shared_models::auth::{PatientIdentity, User};
use shared_models::error::AppError;

use crate::models::{AppointmentError, AppointmentType, SubmissionReceipt, WizardSnapshot};
use crate::services::{
    AppointmentFeed, AppointmentStore, AppointmentSubmitter, BookingSessions, BookingWizard,
    SupabaseAppointmentStore,
};

// ==============================================================================
// SHARED STATE
// ==============================================================================

#[derive(Clone)]
pub struct BookingState {
    pub config: Arc<AppConfig>,
    pub directory: Arc<dyn DoctorDirectory>,
    pub submitter: Arc<AppointmentSubmitter>,
    pub sessions: BookingSessions,
}

impl BookingState {
    /// Wire the Supabase-backed collaborators.
    pub fn new(config: Arc<AppConfig>) -> Self {
        let directory: Arc<dyn DoctorDirectory> = Arc::new(SupabaseDoctorDirectory::new(&config));
        let store: Arc<dyn AppointmentStore> = Arc::new(SupabaseAppointmentStore::new(&config));
        Self::with_collaborators(config, directory, store, AppointmentFeed::new())
    }

    pub fn with_collaborators(
        config: Arc<AppConfig>,
        directory: Arc<dyn DoctorDirectory>,
        store: Arc<dyn AppointmentStore>,
        feed: AppointmentFeed,
    ) -> Self {
        let submitter = AppointmentSubmitter::new(&config, Arc::clone(&directory), store, feed);
        let sessions = BookingSessions::with_idle_ttl(Duration::from_secs(config.booking_session_ttl_secs));

        Self {
            config,
            directory,
            submitter: Arc::new(submitter),
            sessions,
        }
    }

    async fn session(&self, id: Uuid, user: &User) -> Result<Arc<Mutex<BookingWizard>>, AppError> {
        Ok(self.sessions.get(id, &user.id).await?)
    }
}

// ==============================================================================
// REQUEST BODIES
// ==============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateSessionRequest {
    pub patient_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SelectTypeRequest {
    pub appointment_type: AppointmentType,
}

#[derive(Debug, Deserialize)]
pub struct SelectDoctorRequest {
    pub doctor_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectDateRequest {
    pub date: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectTimeRequest {
    pub time: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SubmitRequest {
    pub notes: Option<String>,
}

// ==============================================================================
// DIRECTORY & CALENDAR
// ==============================================================================

#[axum::debug_handler]
pub async fn get_candidate_dates(
    State(state): State<BookingState>,
) -> Result<Json<Value>, AppError> {
    let window_days = state.config.booking_window_days;
    let calculator = AvailabilityCalculator::for_today(window_days, Vec::new());

    Ok(Json(json!({
        "window_days": window_days,
        "dates": calculator.generate_candidate_dates(window_days),
    })))
}

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<BookingState>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Vec<DoctorProfile>>, AppError> {
    let doctors = state
        .directory
        .list_active_doctors(Some(auth.token()))
        .await
        .map_err(AppointmentError::from)?;

    Ok(Json(doctors))
}

// ==============================================================================
// WIZARD SESSIONS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_session(
    State(state): State<BookingState>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if user.role.as_deref() != Some("patient") {
        warn!("User {} with role {:?} tried to open a booking session", user.id, user.role);
        return Err(AppError::Auth("Only patients can book appointments".to_string()));
    }

    let doctors = state
        .directory
        .list_active_doctors(Some(auth.token()))
        .await
        .map_err(AppointmentError::from)?;

    let identity = PatientIdentity::from_user(&user, auth.token(), request.patient_name);
    let availability = AvailabilityCalculator::for_today(state.config.booking_window_days, doctors);
    let wizard = BookingWizard::new(identity, availability);
    let snapshot = wizard.snapshot();

    let (session_id, _) = state.sessions.open(wizard).await;
    info!("Patient {} opened booking session {}", user.id, session_id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "session_id": session_id,
            "wizard": snapshot,
        })),
    ))
}

#[axum::debug_handler]
pub async fn get_session(
    State(state): State<BookingState>,
    Extension(user): Extension<User>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<WizardSnapshot>, AppError> {
    let session = state.session(session_id, &user).await?;
    let wizard = session.lock().await;
    Ok(Json(wizard.snapshot()))
}

#[axum::debug_handler]
pub async fn delete_session(
    State(state): State<BookingState>,
    Extension(user): Extension<User>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.close(session_id, &user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_session<F>(
    state: &BookingState,
    user: &User,
    session_id: Uuid,
    apply: F,
) -> Result<Json<WizardSnapshot>, AppError>
where
    F: FnOnce(&mut BookingWizard) -> Result<(), AppointmentError>,
{
    let session = state.session(session_id, user).await?;
    let mut wizard = session.lock().await;
    apply(&mut wizard)?;
    Ok(Json(wizard.snapshot()))
}

#[axum::debug_handler]
pub async fn select_type(
    State(state): State<BookingState>,
    Extension(user): Extension<User>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SelectTypeRequest>,
) -> Result<Json<WizardSnapshot>, AppError> {
    update_session(&state, &user, session_id, |wizard| {
        wizard.select_type(request.appointment_type)
    })
    .await
}

#[axum::debug_handler]
pub async fn select_doctor(
    State(state): State<BookingState>,
    Extension(user): Extension<User>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SelectDoctorRequest>,
) -> Result<Json<WizardSnapshot>, AppError> {
    update_session(&state, &user, session_id, |wizard| {
        wizard.select_doctor(&request.doctor_id)
    })
    .await
}

#[axum::debug_handler]
pub async fn select_date(
    State(state): State<BookingState>,
    Extension(user): Extension<User>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SelectDateRequest>,
) -> Result<Json<WizardSnapshot>, AppError> {
    update_session(&state, &user, session_id, |wizard| wizard.select_date(&request.date)).await
}

#[axum::debug_handler]
pub async fn select_time(
    State(state): State<BookingState>,
    Extension(user): Extension<User>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SelectTimeRequest>,
) -> Result<Json<WizardSnapshot>, AppError> {
    update_session(&state, &user, session_id, |wizard| wizard.select_time(&request.time)).await
}

#[axum::debug_handler]
pub async fn continue_step(
    State(state): State<BookingState>,
    Extension(user): Extension<User>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<WizardSnapshot>, AppError> {
    update_session(&state, &user, session_id, |wizard| wizard.handle_continue().map(|_| ())).await
}

#[axum::debug_handler]
pub async fn back_step(
    State(state): State<BookingState>,
    Extension(user): Extension<User>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<WizardSnapshot>, AppError> {
    update_session(&state, &user, session_id, |wizard| wizard.handle_back().map(|_| ())).await
}

#[axum::debug_handler]
pub async fn submit_booking(
    State(state): State<BookingState>,
    Extension(user): Extension<User>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<SubmissionReceipt>), AppError> {
    let session = state.session(session_id, &user).await?;
    let receipt = state.submitter.submit(&session, request.notes).await?;
    state.sessions.mark_booked(session_id).await;

    Ok((StatusCode::CREATED, Json(receipt)))
}
