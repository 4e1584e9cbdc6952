use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::{Mutex as GateMutex, OwnedMutexGuard};

use super::{
    error::BookingError,
    status::AppointmentStatus,
    store::{AppointmentStore, BookingUnit, DoctorDirectory},
};
use crate::models::{Appointment, AppointmentView, Doctor, NewAppointment, Patient};

#[derive(Default)]
struct Tables {
    doctors: BTreeMap<i64, Doctor>,
    patients: BTreeMap<i64, Patient>,
    appointments: Vec<Appointment>,
    next_id: i64,
}

impl Tables {
    fn view(&self, a: &Appointment) -> Option<AppointmentView> {
        let doctor = self.doctors.get(&a.doctor_id)?;
        let patient = self.patients.get(&a.patient_id)?;
        Some(AppointmentView::new(a, doctor, patient))
    }

    fn count(&self, doctor_id: i64, day: NaiveDate) -> i64 {
        self.appointments
            .iter()
            .filter(|a| a.doctor_id == doctor_id && a.appointment_time.date() == day)
            .count() as i64
    }
}

/// Store kept in process memory, with one async gate per `(doctor, day)` key.
#[derive(Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    gates: Mutex<HashMap<(i64, NaiveDate), Arc<GateMutex<()>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_doctor(&self, id: i64, name: &str, specialization: &str) {
        let mut t = self.tables.lock().unwrap();
        t.doctors.insert(
            id,
            Doctor {
                id,
                name: name.to_string(),
                specialization: specialization.to_string(),
            },
        );
    }

    pub fn add_patient(&self, id: i64, username: &str, full_name: &str) {
        let mut t = self.tables.lock().unwrap();
        t.patients.insert(
            id,
            Patient {
                id,
                username: username.to_string(),
                full_name: full_name.to_string(),
            },
        );
    }

    pub fn appointments(&self) -> Vec<Appointment> {
        self.tables.lock().unwrap().appointments.clone()
    }

    pub fn count_committed(&self, doctor_id: i64, day: NaiveDate) -> i64 {
        self.tables.lock().unwrap().count(doctor_id, day)
    }

    fn gate(&self, doctor_id: i64, day: NaiveDate) -> Arc<GateMutex<()>> {
        let mut gates = self.gates.lock().unwrap();
        gates
            .entry((doctor_id, day))
            .or_insert_with(|| Arc::new(GateMutex::new(())))
            .clone()
    }
}

#[async_trait]
impl DoctorDirectory for MemoryStore {
    async fn find_doctor_by_id(&self, doctor_id: i64) -> Result<Option<Doctor>, BookingError> {
        Ok(self.tables.lock().unwrap().doctors.get(&doctor_id).cloned())
    }
}

#[async_trait]
impl AppointmentStore for MemoryStore {
    async fn begin_booking(
        &self,
        doctor_id: i64,
        day: NaiveDate,
    ) -> Result<Box<dyn BookingUnit>, BookingError> {
        let guard = self.gate(doctor_id, day).lock_owned().await;
        Ok(Box::new(MemoryBookingUnit {
            _guard: guard,
            tables: Arc::clone(&self.tables),
            doctor_id,
            day,
            staged: Vec::new(),
        }))
    }

    async fn list_for_patient_ordered_by_time(
        &self,
        patient_id: i64,
    ) -> Result<Vec<AppointmentView>, BookingError> {
        let t = self.tables.lock().unwrap();
        let mut views: Vec<AppointmentView> = t
            .appointments
            .iter()
            .filter(|a| a.patient_id == patient_id)
            .filter_map(|a| t.view(a))
            .collect();
        views.sort_by_key(|v| (v.appointment_time, v.id));
        Ok(views)
    }

    async fn list_all(&self) -> Result<Vec<AppointmentView>, BookingError> {
        let t = self.tables.lock().unwrap();
        let mut views: Vec<AppointmentView> =
            t.appointments.iter().filter_map(|a| t.view(a)).collect();
        views.sort_by_key(|v| (v.appointment_time, v.id));
        Ok(views)
    }

    async fn update_status(
        &self,
        appointment_id: i64,
        status: AppointmentStatus,
    ) -> Result<bool, BookingError> {
        let mut t = self.tables.lock().unwrap();
        match t.appointments.iter_mut().find(|a| a.id == appointment_id) {
            Some(a) => {
                a.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

struct MemoryBookingUnit {
    _guard: OwnedMutexGuard<()>,
    tables: Arc<Mutex<Tables>>,
    doctor_id: i64,
    day: NaiveDate,
    staged: Vec<Appointment>,
}

#[async_trait]
impl BookingUnit for MemoryBookingUnit {
    async fn count_for_doctor_on_day(&mut self) -> Result<i64, BookingError> {
        let committed = self.tables.lock().unwrap().count(self.doctor_id, self.day);
        // Give racing bookings a chance to interleave between count and insert.
        tokio::task::yield_now().await;
        Ok(committed + self.staged.len() as i64)
    }

    async fn find_patient(&mut self, patient_id: i64) -> Result<Option<Patient>, BookingError> {
        Ok(self.tables.lock().unwrap().patients.get(&patient_id).cloned())
    }

    async fn insert(&mut self, new: NewAppointment) -> Result<Appointment, BookingError> {
        if new.doctor_id != self.doctor_id || new.appointment_time.date() != self.day {
            return Err(BookingError::Storage(
                "appointment does not belong to this booking unit".into(),
            ));
        }

        let id = {
            let mut t = self.tables.lock().unwrap();
            t.next_id += 1;
            t.next_id
        };
        let appointment = Appointment {
            id,
            doctor_id: new.doctor_id,
            patient_id: new.patient_id,
            appointment_time: new.appointment_time,
            status: new.status,
        };
        self.staged.push(appointment.clone());
        Ok(appointment)
    }

    async fn commit(self: Box<Self>) -> Result<(), BookingError> {
        let unit = *self;
        let mut t = unit.tables.lock().unwrap();
        t.appointments.extend(unit.staged);
        Ok(())
    }
}
