use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use shared_database::{ScheduleRepository, UserRepository};
use shared_models::user::User;
use shared_utils::AppState;

use crate::models::{AdminBookingResponse, BookingError, BookingPage, MAX_PAGE_SIZE};

pub struct BookingAdminService {
    users: Arc<dyn UserRepository>,
    schedules: Arc<dyn ScheduleRepository>,
}

impl BookingAdminService {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: state.repos.users.clone(),
            schedules: state.repos.schedules.clone(),
        }
    }

    /// Pages are 1-based; the page size is clamped to `1..=MAX_PAGE_SIZE`.
    /// Offsets past the end saturate and yield an empty page.
    pub async fn list(&self, page: u64, page_size: u64) -> Result<BookingPage, BookingError> {
        let page = page.max(1);
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);

        let (rows, total) = self
            .schedules
            .list_bookings((page - 1).saturating_mul(page_size), page_size)
            .await?;

        let mut ids: Vec<Uuid> = rows
            .iter()
            .flat_map(|r| [r.booking.patient_id, r.schedule.doctor_id])
            .collect();
        ids.sort();
        ids.dedup();
        let users: HashMap<Uuid, User> = self
            .users
            .find_users_by_ids(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let bookings = rows
            .into_iter()
            .map(|row| AdminBookingResponse {
                id: row.booking.id,
                patient_id: row.booking.patient_id,
                patient_name: users.get(&row.booking.patient_id).map(User::full_name).unwrap_or_default(),
                doctor_id: row.schedule.doctor_id,
                doctor_name: users.get(&row.schedule.doctor_id).map(User::full_name).unwrap_or_default(),
                date: row.schedule.date,
                status: row.booking.status,
                created_at: row.booking.created_at,
            })
            .collect();

        Ok(BookingPage {
            page,
            page_size,
            total,
            bookings,
        })
    }
}

