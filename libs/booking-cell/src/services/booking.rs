use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use shared_database::{ProfileRepository, Reservation, ScheduleRepository};
use shared_models::profile::DoctorStatus;
use shared_models::schedule::ScheduledBooking;
use shared_utils::AppState;

use crate::models::BookingError;

/// Patient-side booking. Capacity is enforced inside
/// `ScheduleRepository::reserve`, never here.
pub struct BookingService {
    profiles: Arc<dyn ProfileRepository>,
    schedules: Arc<dyn ScheduleRepository>,
}

impl BookingService {
    pub fn new(state: &AppState) -> Self {
        Self {
            profiles: state.repos.profiles.clone(),
            schedules: state.repos.schedules.clone(),
        }
    }

    #[instrument(skip(self))]
    pub async fn book(&self, patient_id: Uuid, doctor_id: Uuid, date: NaiveDate) -> Result<ScheduledBooking, BookingError> {
        if date < Utc::now().date_naive() {
            return Err(BookingError::InvalidDate);
        }

        let profile = self
            .profiles
            .find_doctor_profile(doctor_id)
            .await?
            .ok_or(BookingError::DoctorNotFound)?;
        if profile.status != DoctorStatus::Active {
            debug!("Doctor {} is {}, refusing booking", doctor_id, profile.status.as_str());
            return Err(BookingError::DoctorUnavailable);
        }

        match self.schedules.reserve(patient_id, doctor_id, date).await? {
            Reservation::Booked(booked) => {
                info!(
                    "Booking {} created for {} on {} ({} taken)",
                    booked.booking.id, doctor_id, date, booked.schedule.booking_count
                );
                Ok(booked)
            }
            Reservation::DoctorUnavailable => Err(BookingError::DoctorUnavailable),
            Reservation::ScheduleUnavailable => Err(BookingError::ScheduleUnavailable),
            Reservation::LimitExceeded => {
                warn!("Doctor {} is fully booked on {}", doctor_id, date);
                Err(BookingError::BookingLimitExceeded)
            }
        }
    }

    pub async fn my_bookings(&self, patient_id: Uuid) -> Result<Vec<ScheduledBooking>, BookingError> {
        Ok(self.schedules.list_patient_bookings(patient_id).await?)
    }
}
