use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;

use shared_database::{ProfileRepository, ScheduleRepository, UserRepository};
use shared_models::profile::{DoctorProfile, DoctorStatus};
use shared_models::schedule::{DayOfWeek, DoctorAvailability, DoctorSchedule};
use shared_models::user::User;
use shared_utils::AppState;

use crate::models::{
    AvailableDoctor, BookingError, BookingScreen, CalendarDay, DayStatus, DoctorSummary,
    OpenScheduleResponse, WorkingHours,
};

/// Read-only views patients use to pick a doctor and a day.
pub struct DoctorDirectoryService {
    users: Arc<dyn UserRepository>,
    profiles: Arc<dyn ProfileRepository>,
    schedules: Arc<dyn ScheduleRepository>,
    calendar_days: u32,
}

impl DoctorDirectoryService {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: state.repos.users.clone(),
            profiles: state.repos.profiles.clone(),
            schedules: state.repos.schedules.clone(),
            calendar_days: state.config.booking_calendar_days,
        }
    }

    /// Active doctors whose template covers `date` and who still have room.
    pub async fn available_doctors(&self, date: NaiveDate) -> Result<Vec<AvailableDoctor>, BookingError> {
        let templates = self.schedules.list_availability_for_day(DayOfWeek::of(date)).await?;
        let ids: Vec<Uuid> = templates.iter().map(|t| t.doctor_id).collect();
        let users: HashMap<Uuid, User> = self
            .users
            .find_users_by_ids(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let mut doctors = Vec::new();
        for template in templates {
            let Some(user) = users.get(&template.doctor_id) else {
                continue;
            };
            let Some(profile) = self.active_profile(template.doctor_id).await? else {
                continue;
            };

            let schedule = self
                .schedules
                .list_schedules(template.doctor_id, Some(date), Some(date))
                .await?
                .into_iter()
                .next();
            if day_status(Some(&template), schedule.as_ref()) != DayStatus::Available {
                continue;
            }

            doctors.push(AvailableDoctor {
                doctor: summary(&profile, user),
                start_time: template.start_time,
                end_time: template.end_time,
                max_bookings: template.max_bookings,
                booking_count: schedule.map(|s| s.booking_count).unwrap_or(0),
            });
        }

        doctors.sort_by(|a, b| {
            (&a.doctor.last_name, &a.doctor.first_name).cmp(&(&b.doctor.last_name, &b.doctor.first_name))
        });
        Ok(doctors)
    }

    pub async fn booking_screen(&self, doctor_id: Uuid) -> Result<BookingScreen, BookingError> {
        let profile = self.bookable_profile(doctor_id).await?;
        let user = self
            .users
            .find_user_by_id(doctor_id)
            .await?
            .ok_or(BookingError::DoctorNotFound)?;

        let mut templates = self.schedules.list_availability(doctor_id).await?;
        templates.sort_by_key(|t| t.day_of_week);

        let days = i64::from(self.calendar_days.max(1));
        let today = Utc::now().date_naive();
        let last = today + Duration::days(days - 1);
        let rows: HashMap<NaiveDate, DoctorSchedule> = self
            .schedules
            .list_schedules(doctor_id, Some(today), Some(last))
            .await?
            .into_iter()
            .map(|s| (s.date, s))
            .collect();

        let calendar = (0..days)
            .map(|offset| today + Duration::days(offset))
            .map(|date| {
                let day = DayOfWeek::of(date);
                let template = templates.iter().find(|t| t.day_of_week == day);
                let schedule = rows.get(&date);
                CalendarDay {
                    date,
                    day_of_week: day,
                    booking_count: schedule.map(|s| s.booking_count).unwrap_or(0),
                    max_bookings: template.map(|t| t.max_bookings).unwrap_or(0),
                    status: day_status(template, schedule),
                }
            })
            .collect();

        let working_hours = templates
            .iter()
            .filter(|t| t.is_available)
            .map(|t| WorkingHours {
                day_of_week: t.day_of_week,
                start_time: t.start_time,
                end_time: t.end_time,
                max_bookings: t.max_bookings,
            })
            .collect();

        Ok(BookingScreen {
            doctor: summary(&profile, &user),
            working_hours,
            calendar,
        })
    }

    /// Materialized days from today on that can still take a booking.
    pub async fn open_schedules(&self, doctor_id: Uuid) -> Result<Vec<OpenScheduleResponse>, BookingError> {
        self.bookable_profile(doctor_id).await?;

        let templates = self.schedules.list_availability(doctor_id).await?;
        let rows = self
            .schedules
            .list_schedules(doctor_id, Some(Utc::now().date_naive()), None)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|schedule| {
                let template = templates
                    .iter()
                    .find(|t| t.day_of_week == DayOfWeek::of(schedule.date))?;
                if day_status(Some(template), Some(&schedule)) != DayStatus::Available {
                    return None;
                }
                Some(OpenScheduleResponse {
                    id: schedule.id,
                    date: schedule.date,
                    day_of_week: template.day_of_week,
                    booking_count: schedule.booking_count,
                    max_bookings: template.max_bookings,
                })
            })
            .collect())
    }

    async fn active_profile(&self, doctor_id: Uuid) -> Result<Option<DoctorProfile>, BookingError> {
        Ok(self
            .profiles
            .find_doctor_profile(doctor_id)
            .await?
            .filter(|p| p.status == DoctorStatus::Active))
    }

    /// Doctors that are not active are hidden from patients entirely.
    async fn bookable_profile(&self, doctor_id: Uuid) -> Result<DoctorProfile, BookingError> {
        self.active_profile(doctor_id)
            .await?
            .ok_or(BookingError::DoctorNotFound)
    }
}

/// Mirrors the checks `reserve` makes, without writing anything.
fn day_status(template: Option<&DoctorAvailability>, schedule: Option<&DoctorSchedule>) -> DayStatus {
    let Some(template) = template.filter(|t| t.is_available) else {
        return DayStatus::Closed;
    };
    match schedule {
        Some(s) if !s.is_available => DayStatus::Closed,
        Some(s) if s.booking_count >= template.max_bookings => DayStatus::Full,
        _ => DayStatus::Available,
    }
}

fn summary(profile: &DoctorProfile, user: &User) -> DoctorSummary {
    DoctorSummary {
        id: profile.id,
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        specialization: profile.specialization.clone(),
        personal_identity_photo_url: profile.personal_identity_photo_url.clone(),
    }
}
