use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use appointment_cell::handlers::BookingState;
use appointment_cell::router::booking_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic booking API is running!" }))
        .nest("/booking", booking_routes(BookingState::new(state)))
}
