// src/routes/admin_routes.rs

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};

use crate::{
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{AppState, AppointmentView, UpdateStatusRequest},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/appointments", get(list_appointments))
        .route("/appointments/{appointment_id}/status", patch(update_status))
}

pub async fn list_appointments(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<Vec<AppointmentView>>, ApiError> {
    auth.require_admin()?;
    Ok(Json(state.booking.all_appointments().await?))
}

/// Overwrites the status; last writer wins.
pub async fn update_status(
    State(state): State<AppState>,
    auth: AuthContext,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    auth.require_admin()?;
    let Path(appointment_id) = path?;
    let Json(req) = payload?;

    state
        .workflow
        .set_status(appointment_id, req.status.as_deref())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
