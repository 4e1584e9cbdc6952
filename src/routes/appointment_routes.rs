// src/routes/appointment_routes.rs

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Local, NaiveDateTime};

use crate::{
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{AppState, AppointmentView, BookAppointmentRequest},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/appointments", post(book_appointment))
        .route("/appointments/me", get(my_appointments))
}

/* ============================================================
   POST /appointments
   ============================================================ */

pub async fn book_appointment(
    State(state): State<AppState>,
    auth: AuthContext,
    payload: Result<Json<BookAppointmentRequest>, JsonRejection>,
) -> Result<Json<AppointmentView>, ApiError> {
    let caller = auth.require_patient()?;
    let Json(req) = payload?;

    let doctor_id = req
        .doctor_id
        .ok_or_else(|| ApiError::validation("doctorId is required"))?;
    let raw_time = req
        .appointment_time
        .as_deref()
        .ok_or_else(|| ApiError::validation("appointmentTime is required"))?;
    let appointment_time = parse_appointment_time(raw_time)?;

    let view = state
        .booking
        .book_appointment(doctor_id, appointment_time, &caller)
        .await?;

    Ok(Json(view))
}

/* ============================================================
   GET /appointments/me
   ============================================================ */

pub async fn my_appointments(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<Vec<AppointmentView>>, ApiError> {
    let caller = auth.require_patient()?;
    let views = state.booking.appointments_for_patient(&caller).await?;
    Ok(Json(views))
}

/// Accepts browser `datetime-local` values (`YYYY-MM-DDTHH:MM`), the same with
/// seconds and fractions, or RFC 3339 with an offset. Offsets are converted to
/// the server's local wall clock.
pub fn parse_appointment_time(raw: &str) -> Result<NaiveDateTime, ApiError> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Local).naive_local());
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| {
            ApiError::validation("appointmentTime must look like YYYY-MM-DDTHH:MM[:SS]")
        })
}
