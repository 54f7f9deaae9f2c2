// libs/appointment-cell/src/router.rs
use axum::{
    Router,
    routing::{get, post, put},
    middleware,
};

use shared_utils::extractor::auth_middleware;

use crate::handlers::{self, BookingState};

pub fn booking_routes(state: BookingState) -> Router {
    // Every booking operation acts on behalf of an authenticated patient
    let protected_routes = Router::new()
        .route("/candidate-dates", get(handlers::get_candidate_dates))
        .route("/doctors", get(handlers::list_doctors))

        // Wizard sessions
        .route("/wizard", post(handlers::create_session))
        .route("/wizard/{session_id}", get(handlers::get_session).delete(handlers::delete_session))
        .route("/wizard/{session_id}/type", put(handlers::select_type))
        .route("/wizard/{session_id}/doctor", put(handlers::select_doctor))
        .route("/wizard/{session_id}/date", put(handlers::select_date))
        .route("/wizard/{session_id}/time", put(handlers::select_time))
        .route("/wizard/{session_id}/continue", post(handlers::continue_step))
        .route("/wizard/{session_id}/back", post(handlers::back_step))
        .route("/wizard/{session_id}/submit", post(handlers::submit_booking))

        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
