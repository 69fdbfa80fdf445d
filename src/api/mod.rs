mod handlers;

use std::sync::{Arc, Mutex};

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::Database;
use crate::timeline::Timeline;

pub use handlers::{AtInput, LeadTimeInput, StatusResponse, WindowRange};

/// The reconciler shared between request handlers. Holding the lock for the
/// whole request keeps reconciler operations from interleaving.
pub type SharedTimeline = Arc<Mutex<Timeline<Database>>>;

pub fn create_router(timeline: Timeline<Database>) -> Router {
    let state: SharedTimeline = Arc::new(Mutex::new(timeline));

    let api = Router::new()
        // Fasting
        .route("/status", get(handlers::status))
        .route("/fast/start", post(handlers::start_fast))
        .route("/fast/stop", post(handlers::stop_fast))
        // Windows
        .route("/windows", get(handlers::list_windows).post(handlers::create_window))
        .route(
            "/windows/{id}",
            put(handlers::update_window).delete(handlers::delete_window),
        )
        // Regimens
        .route("/regimens", get(handlers::list_regimens).post(handlers::create_regimen))
        .route(
            "/regimens/{id}",
            put(handlers::update_regimen).delete(handlers::delete_regimen),
        )
        .route("/regimens/{id}/activate", post(handlers::activate_regimen))
        // Projections
        .route("/summary/weekly", get(handlers::weekly_summary))
        .route("/history", get(handlers::history))
        .route("/reminders", get(handlers::reminders))
        .route("/settings/lead-time", put(handlers::set_lead_time))
        // Whole store
        .route("/export", get(handlers::export))
        .route("/reset", post(handlers::reset))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
