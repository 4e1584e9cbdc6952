use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use sqlx::{PgPool, Postgres, Transaction};

use super::{
    error::BookingError,
    status::AppointmentStatus,
    store::{day_bounds, AppointmentStore, BookingUnit, DoctorDirectory},
};
use crate::models::{Appointment, AppointmentView, Doctor, NewAppointment, Patient, ROLE_PATIENT};

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AppointmentViewRow {
    appointment_id: i64,
    doctor_id: i64,
    doctor_name: String,
    specialization: String,
    patient_id: i64,
    patient_name: String,
    appointment_time: NaiveDateTime,
    status: String,
}

impl TryFrom<AppointmentViewRow> for AppointmentView {
    type Error = BookingError;

    fn try_from(r: AppointmentViewRow) -> Result<Self, Self::Error> {
        let status = r
            .status
            .parse::<AppointmentStatus>()
            .map_err(|_| BookingError::Storage(format!("unknown status in db: {}", r.status)))?;
        Ok(AppointmentView {
            id: r.appointment_id,
            doctor_id: r.doctor_id,
            doctor_name: r.doctor_name,
            specialization: r.specialization,
            patient_id: r.patient_id,
            patient_name: r.patient_name,
            appointment_time: r.appointment_time,
            status,
        })
    }
}

const VIEW_SELECT: &str = r#"
    SELECT
      a.appointment_id,
      a.doctor_id,
      d.name AS doctor_name,
      d.specialization,
      a.patient_id,
      u.full_name AS patient_name,
      a.appointment_time,
      a.status
    FROM appointment a
    JOIN doctor d ON d.doctor_id = a.doctor_id
    JOIN app_user u ON u.user_id = a.patient_id
"#;

fn into_views(rows: Vec<AppointmentViewRow>) -> Result<Vec<AppointmentView>, BookingError> {
    rows.into_iter().map(AppointmentView::try_from).collect()
}

#[async_trait]
impl DoctorDirectory for PgStore {
    async fn find_doctor_by_id(&self, doctor_id: i64) -> Result<Option<Doctor>, BookingError> {
        let doctor = sqlx::query_as::<_, Doctor>(
            r#"
            SELECT doctor_id, name, specialization
            FROM doctor
            WHERE doctor_id = $1
            "#,
        )
        .bind(doctor_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(doctor)
    }
}

#[async_trait]
impl AppointmentStore for PgStore {
    async fn begin_booking(
        &self,
        doctor_id: i64,
        day: NaiveDate,
    ) -> Result<Box<dyn BookingUnit>, BookingError> {
        let mut tx = self.db.begin().await?;

        // Transaction-scoped: released on commit or rollback, including when
        // the unit is dropped uncommitted.
        sqlx::query(r#"SELECT pg_advisory_xact_lock(hashtext('doctor:' || $1::text), $2)"#)
            .bind(doctor_id)
            .bind(day.num_days_from_ce())
            .execute(&mut *tx)
            .await?;

        Ok(Box::new(PgBookingUnit { tx, doctor_id, day }))
    }

    async fn list_for_patient_ordered_by_time(
        &self,
        patient_id: i64,
    ) -> Result<Vec<AppointmentView>, BookingError> {
        let sql = format!(
            "{VIEW_SELECT} WHERE a.patient_id = $1 ORDER BY a.appointment_time ASC, a.appointment_id ASC"
        );
        let rows = sqlx::query_as::<_, AppointmentViewRow>(&sql)
            .bind(patient_id)
            .fetch_all(&self.db)
            .await?;
        into_views(rows)
    }

    async fn list_all(&self) -> Result<Vec<AppointmentView>, BookingError> {
        let sql = format!("{VIEW_SELECT} ORDER BY a.appointment_time ASC, a.appointment_id ASC");
        let rows = sqlx::query_as::<_, AppointmentViewRow>(&sql)
            .fetch_all(&self.db)
            .await?;
        into_views(rows)
    }

    async fn update_status(
        &self,
        appointment_id: i64,
        status: AppointmentStatus,
    ) -> Result<bool, BookingError> {
        let res = sqlx::query(
            r#"
            UPDATE appointment
            SET status = $2,
                updated_at = now()
            WHERE appointment_id = $1
            "#,
        )
        .bind(appointment_id)
        .bind(status.as_str())
        .execute(&self.db)
        .await?;

        Ok(res.rows_affected() > 0)
    }
}

pub struct PgBookingUnit {
    tx: Transaction<'static, Postgres>,
    doctor_id: i64,
    day: NaiveDate,
}

#[async_trait]
impl BookingUnit for PgBookingUnit {
    async fn count_for_doctor_on_day(&mut self) -> Result<i64, BookingError> {
        let (start, end) = day_bounds(self.day);
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM appointment
            WHERE doctor_id = $1
              AND appointment_time >= $2
              AND appointment_time <  $3
            "#,
        )
        .bind(self.doctor_id)
        .bind(start)
        .bind(end)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(count)
    }

    async fn find_patient(&mut self, patient_id: i64) -> Result<Option<Patient>, BookingError> {
        let patient = sqlx::query_as::<_, Patient>(
            r#"
            SELECT user_id, username, full_name
            FROM app_user
            WHERE user_id = $1
              AND roles = $2
              AND is_active = true
            "#,
        )
        .bind(patient_id)
        .bind(ROLE_PATIENT)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(patient)
    }

    async fn insert(&mut self, new: NewAppointment) -> Result<Appointment, BookingError> {
        if new.doctor_id != self.doctor_id || new.appointment_time.date() != self.day {
            return Err(BookingError::Storage(
                "appointment does not belong to this booking unit".into(),
            ));
        }

        let appointment_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO appointment (doctor_id, patient_id, appointment_time, status)
            VALUES ($1, $2, $3, $4)
            RETURNING appointment_id
            "#,
        )
        .bind(new.doctor_id)
        .bind(new.patient_id)
        .bind(new.appointment_time)
        .bind(new.status.as_str())
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(Appointment {
            id: appointment_id,
            doctor_id: new.doctor_id,
            patient_id: new.patient_id,
            appointment_time: new.appointment_time,
            status: new.status,
        })
    }

    async fn commit(self: Box<Self>) -> Result<(), BookingError> {
        self.tx.commit().await?;
        Ok(())
    }
}
