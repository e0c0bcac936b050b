use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use shared_database::ScheduleRepository;
use shared_models::schedule::{DayOfWeek, DoctorAvailability, DoctorSchedule};
use shared_utils::AppState;

use crate::models::{AvailabilityEntry, DoctorError, SetAvailabilityRequest};

/// Weekly templates and the calendar days materialized from them.
pub struct ScheduleService {
    schedules: Arc<dyn ScheduleRepository>,
    max_generation_days: i64,
}

impl ScheduleService {
    pub fn new(state: &AppState) -> Self {
        Self {
            schedules: state.repos.schedules.clone(),
            max_generation_days: state.config.schedule_generation_max_days,
        }
    }

    /// Replaces the whole weekly template. An invalid request replaces nothing.
    #[instrument(skip(self, request))]
    pub async fn set_availability(
        &self,
        doctor_id: Uuid,
        request: SetAvailabilityRequest,
    ) -> Result<Vec<DoctorAvailability>, DoctorError> {
        validate_entries(&request.availabilities)?;

        let rows: Vec<DoctorAvailability> = request
            .availabilities
            .into_iter()
            .map(|entry| DoctorAvailability {
                id: Uuid::new_v4(),
                doctor_id,
                day_of_week: entry.day_of_week,
                start_time: entry.start_time,
                end_time: entry.end_time,
                max_bookings: entry.max_bookings,
                is_available: entry.is_available,
            })
            .collect();

        self.schedules.replace_availability(doctor_id, &rows).await?;

        info!("Doctor {} now has {} availability days", doctor_id, rows.len());
        Ok(rows)
    }

    pub async fn get_availability(&self, doctor_id: Uuid) -> Result<Vec<DoctorAvailability>, DoctorError> {
        let mut rows = self.schedules.list_availability(doctor_id).await?;
        rows.sort_by_key(|row| row.day_of_week);
        Ok(rows)
    }

    /// Fills the gaps in `[start_date, end_date]` for days whose template is
    /// available. Existing rows are never touched, so overlapping runs are
    /// idempotent. Returns only the rows created by this call.
    #[instrument(skip(self))]
    pub async fn generate_schedules(
        &self,
        doctor_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DoctorSchedule>, DoctorError> {
        if start_date > end_date {
            return Err(DoctorError::InvalidRange(
                "Start date must not be after end date".to_string(),
            ));
        }
        let days = (end_date - start_date).num_days() + 1;
        if days > self.max_generation_days {
            return Err(DoctorError::InvalidRange(format!(
                "Cannot generate more than {} days at once",
                self.max_generation_days
            )));
        }

        let open_days: HashSet<DayOfWeek> = self
            .schedules
            .list_availability(doctor_id)
            .await?
            .into_iter()
            .filter(|template| template.is_available)
            .map(|template| template.day_of_week)
            .collect();

        let candidates: Vec<DoctorSchedule> = (0..days)
            .map(|offset| start_date + Duration::days(offset))
            .filter(|date| open_days.contains(&DayOfWeek::of(*date)))
            .map(|date| DoctorSchedule::new(doctor_id, date))
            .collect();

        if candidates.is_empty() {
            debug!("No available template days between {} and {}", start_date, end_date);
            return Ok(Vec::new());
        }

        let created = self.schedules.insert_missing_schedules(&candidates).await?;

        info!(
            "Generated {} of {} candidate days for doctor {}",
            created.len(),
            candidates.len(),
            doctor_id
        );
        Ok(created)
    }

    pub async fn get_schedules(
        &self,
        doctor_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<DoctorSchedule>, DoctorError> {
        Ok(self.schedules.list_schedules(doctor_id, from, to).await?)
    }

    /// Pulls or restores one materialized day without touching the template.
    #[instrument(skip(self))]
    pub async fn set_schedule_availability(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        is_available: bool,
    ) -> Result<DoctorSchedule, DoctorError> {
        self.schedules
            .set_schedule_availability(doctor_id, date, is_available)
            .await?
            .ok_or(DoctorError::ScheduleNotFound(date))
    }
}

fn validate_entries(entries: &[AvailabilityEntry]) -> Result<(), DoctorError> {
    let mut seen = HashSet::new();

    for entry in entries {
        if entry.start_time >= entry.end_time {
            return Err(DoctorError::InvalidAvailability(format!(
                "{}: start time must be before end time",
                entry.day_of_week.as_str()
            )));
        }
        if entry.max_bookings == 0 {
            return Err(DoctorError::InvalidAvailability(format!(
                "{}: maxBookings must be at least 1",
                entry.day_of_week.as_str()
            )));
        }

        if !seen.insert(entry.day_of_week) {
            return Err(DoctorError::DuplicateDay(entry.day_of_week.as_str()));
        }
    }

    Ok(())
}
