//! Appointment booking under a per-doctor daily capacity.
//!
//! The count-then-insert for a `(doctor, day)` key always runs inside one
//! [`store::BookingUnit`], so concurrent bookings for the same doctor and day
//! cannot both observe a count below the limit.

pub mod error;
#[cfg(test)]
pub mod memory_store;
pub mod pg_store;
pub mod status;
pub mod store;

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};

use crate::models::{AppointmentView, CallerIdentity, NewAppointment};
use error::BookingError;
use status::AppointmentStatus;
use store::{AppointmentStore, DoctorDirectory};

/// Maximum appointments a single doctor may hold on one calendar day.
pub const MAX_APPOINTMENTS_PER_DAY: i64 = 5;

#[derive(Clone)]
pub struct BookingEngine {
    store: Arc<dyn AppointmentStore>,
    doctors: Arc<dyn DoctorDirectory>,
}

impl BookingEngine {
    pub fn new(store: Arc<dyn AppointmentStore>, doctors: Arc<dyn DoctorDirectory>) -> Self {
        Self { store, doctors }
    }

    pub async fn book_appointment(
        &self,
        doctor_id: i64,
        requested_time: NaiveDateTime,
        caller: &CallerIdentity,
    ) -> Result<AppointmentView, BookingError> {
        let now = Local::now().naive_local();
        if requested_time <= now {
            return Err(BookingError::invalid("Appointment time cannot be in the past"));
        }

        let doctor = self
            .doctors
            .find_doctor_by_id(doctor_id)
            .await?
            .ok_or_else(|| BookingError::not_found("Doctor not found"))?;

        let day = requested_time.date();

        // Everything below runs under the (doctor, day) serialization point.
        // Returning early drops the unit uncommitted.
        let mut unit = self.store.begin_booking(doctor.id, day).await?;

        let booked = unit.count_for_doctor_on_day().await?;
        if booked >= MAX_APPOINTMENTS_PER_DAY {
            tracing::warn!(doctor_id = doctor.id, %day, booked, "doctor at daily capacity");
            return Err(BookingError::CapacityExceeded);
        }

        let patient = unit
            .find_patient(caller.user_id)
            .await?
            .ok_or_else(|| BookingError::not_found("Patient not found"))?;

        let appointment = unit
            .insert(NewAppointment {
                doctor_id: doctor.id,
                patient_id: patient.id,
                appointment_time: requested_time,
                status: AppointmentStatus::INITIAL,
            })
            .await?;

        unit.commit().await?;

        tracing::info!(
            appointment_id = appointment.id,
            doctor_id = doctor.id,
            patient_id = patient.id,
            caller = %caller.username,
            caller_name = %caller.full_name,
            time = %appointment.appointment_time,
            "appointment booked"
        );

        Ok(AppointmentView::new(&appointment, &doctor, &patient))
    }

    pub async fn appointments_for_patient(
        &self,
        caller: &CallerIdentity,
    ) -> Result<Vec<AppointmentView>, BookingError> {
        self.store.list_for_patient_ordered_by_time(caller.user_id).await
    }

    pub async fn all_appointments(&self) -> Result<Vec<AppointmentView>, BookingError> {
        self.store.list_all().await
    }
}
