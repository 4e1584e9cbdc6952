use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::booking::{BookingEngine, status::{AppointmentStatus, StatusWorkflow}};

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub session_ttl_hours: i64,
    pub booking: BookingEngine,
    pub workflow: StatusWorkflow,
}

/* -------------------------
   Domain
--------------------------*/

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Doctor {
    #[sqlx(rename = "doctor_id")]
    pub id: i64,
    pub name: String,
    pub specialization: String,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Patient {
    #[sqlx(rename = "user_id")]
    pub id: i64,
    pub username: String,
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appointment {
    pub id: i64,
    pub doctor_id: i64,
    pub patient_id: i64,
    pub appointment_time: NaiveDateTime,
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub doctor_id: i64,
    pub patient_id: i64,
    pub appointment_time: NaiveDateTime,
    pub status: AppointmentStatus,
}

/// The caller a request was authenticated as. Passed explicitly into the
/// booking engine.
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub user_id: i64,
    pub username: String,
    pub full_name: String,
}

/* -------------------------
   API DTOs
--------------------------*/

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentView {
    pub id: i64,
    pub doctor_id: i64,
    pub doctor_name: String,
    pub specialization: String,
    pub patient_id: i64,
    pub patient_name: String,
    pub appointment_time: NaiveDateTime,
    pub status: AppointmentStatus,
}

impl AppointmentView {
    pub fn new(appointment: &Appointment, doctor: &Doctor, patient: &Patient) -> Self {
        Self {
            id: appointment.id,
            doctor_id: doctor.id,
            doctor_name: doctor.name.clone(),
            specialization: doctor.specialization.clone(),
            patient_id: patient.id,
            patient_name: patient.full_name.clone(),
            appointment_time: appointment.appointment_time,
            status: appointment.status,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookAppointmentRequest {
    pub doctor_id: Option<i64>,
    pub appointment_time: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub device_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub role: String,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub full_name: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/* -------------------------
   DB Row Models
--------------------------*/

#[derive(Debug, sqlx::FromRow)]
pub struct UserRow {
    pub user_id: i64,
    pub username: String,
    pub full_name: String,
    pub password_hash: String,
    pub roles: i16,
    pub is_active: bool,
}

#[derive(Debug, sqlx::FromRow)]
pub struct SessionTokenRow {
    pub session_token_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/* -------------------------
   Helpers
--------------------------*/

/// Roles stored in app_user.roles:
/// 0 Patient, 1 Admin
pub const ROLE_PATIENT: i16 = 0;
pub const ROLE_ADMIN: i16 = 1;

pub fn role_to_string(role: i16) -> String {
    match role {
        ROLE_PATIENT => "PATIENT",
        ROLE_ADMIN => "ADMIN",
        _ => "UNKNOWN",
    }
    .to_string()
}
