use async_trait::async_trait;
use chrono::NaiveDate;

use super::{error::BookingError, status::AppointmentStatus};
use crate::models::{Appointment, AppointmentView, Doctor, NewAppointment, Patient};

#[async_trait]
pub trait DoctorDirectory: Send + Sync {
    async fn find_doctor_by_id(&self, doctor_id: i64) -> Result<Option<Doctor>, BookingError>;
}

#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Opens the serialization point for one `(doctor, day)` key. While the
    /// returned unit is alive no other unit for the same key can read a count
    /// or insert. Dropping it without `commit` discards everything it staged.
    async fn begin_booking(
        &self,
        doctor_id: i64,
        day: NaiveDate,
    ) -> Result<Box<dyn BookingUnit>, BookingError>;

    /// Ascending by appointment time, ties by id.
    async fn list_for_patient_ordered_by_time(
        &self,
        patient_id: i64,
    ) -> Result<Vec<AppointmentView>, BookingError>;

    async fn list_all(&self) -> Result<Vec<AppointmentView>, BookingError>;

    /// Returns false when no appointment has this id.
    async fn update_status(
        &self,
        appointment_id: i64,
        status: AppointmentStatus,
    ) -> Result<bool, BookingError>;
}

/// Count-then-insert for a single `(doctor, day)` key.
#[async_trait]
pub trait BookingUnit: Send {
    /// Appointments of the unit's doctor on the unit's day, every status included.
    async fn count_for_doctor_on_day(&mut self) -> Result<i64, BookingError>;

    async fn find_patient(&mut self, patient_id: i64) -> Result<Option<Patient>, BookingError>;

    async fn insert(&mut self, new: NewAppointment) -> Result<Appointment, BookingError>;

    async fn commit(self: Box<Self>) -> Result<(), BookingError>;
}

/// Half-open `[day 00:00, next day 00:00)` bounds used by the day count.
pub fn day_bounds(day: NaiveDate) -> (chrono::NaiveDateTime, chrono::NaiveDateTime) {
    let start = day.and_time(chrono::NaiveTime::MIN);
    (start, start + chrono::Duration::days(1))
}
