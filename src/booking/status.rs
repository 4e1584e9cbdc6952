use std::{fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};

use super::{error::BookingError, store::AppointmentStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    /// Status every newly booked appointment starts in.
    pub const INITIAL: AppointmentStatus = AppointmentStatus::Pending;

    pub const ALL: [AppointmentStatus; 4] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "PENDING",
            AppointmentStatus::Confirmed => "CONFIRMED",
            AppointmentStatus::Cancelled => "CANCELLED",
            AppointmentStatus::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = BookingError;

    /// Exact upper-case names only.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AppointmentStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| BookingError::invalid(format!("Unknown appointment status: {s}")))
    }
}

/// Administrative status overrides. Any status may replace any other; there is
/// no transition graph.
#[derive(Clone)]
pub struct StatusWorkflow {
    store: Arc<dyn AppointmentStore>,
}

impl StatusWorkflow {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }

    pub async fn set_status(
        &self,
        appointment_id: i64,
        new_status: Option<&str>,
    ) -> Result<AppointmentStatus, BookingError> {
        // Validate before touching storage.
        let status = match new_status {
            Some(raw) if !raw.trim().is_empty() => raw.parse::<AppointmentStatus>()?,
            _ => return Err(BookingError::invalid("Status must not be null")),
        };

        if !self.store.update_status(appointment_id, status).await? {
            return Err(BookingError::not_found("Appointment not found"));
        }

        tracing::info!(appointment_id, status = %status, "appointment status updated");
        Ok(status)
    }
}
