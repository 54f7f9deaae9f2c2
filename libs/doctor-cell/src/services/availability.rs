use chrono::{Datelike, Days, NaiveDate, Utc, Weekday};
use tracing::{debug, warn};

use shared_config::MAX_BOOKING_WINDOW_DAYS;

use crate::models::{format_date, parse_date, DoctorProfile};

/// Decides which calendar dates can be booked, against a snapshot of the
/// doctor directory taken when the booking session started.
#[derive(Debug, Clone)]
pub struct AvailabilityCalculator {
    today: NaiveDate,
    window_days: i64,
    doctors: Vec<DoctorProfile>,
}

impl AvailabilityCalculator {
    pub fn for_today(window_days: i64, doctors: Vec<DoctorProfile>) -> Self {
        Self::anchored(Utc::now().date_naive(), window_days, doctors)
    }

    pub fn anchored(today: NaiveDate, window_days: i64, doctors: Vec<DoctorProfile>) -> Self {
        if window_days > MAX_BOOKING_WINDOW_DAYS {
            warn!("Booking window of {} days capped at {}", window_days, MAX_BOOKING_WINDOW_DAYS);
        }

        Self {
            today,
            window_days: bounded_window(window_days),
            doctors,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn window_days(&self) -> i64 {
        self.window_days
    }

    pub fn doctors(&self) -> &[DoctorProfile] {
        &self.doctors
    }

    pub fn doctor(&self, doctor_id: &str) -> Option<&DoctorProfile> {
        self.doctors.iter().find(|doctor| doctor.id == doctor_id)
    }

    /// Weekdays from tomorrow through `window_days` ahead, as `YYYY-MM-DD`.
    pub fn generate_candidate_dates(&self, window_days: i64) -> Vec<String> {
        candidate_dates(self.today, window_days)
            .into_iter()
            .map(format_date)
            .collect()
    }

    pub fn is_doctor_available(&self, doctor_id: &str, date: &str) -> bool {
        let Some(date) = parse_date(date) else {
            debug!("Availability check with malformed date '{}'", date);
            return false;
        };

        match self.doctor(doctor_id) {
            Some(doctor) => doctor.is_available_on(date),
            None => {
                debug!("Availability check for unknown doctor {}", doctor_id);
                false
            }
        }
    }

    pub fn is_date_selectable(&self, date: &str, selected_doctor: Option<&str>) -> bool {
        let Some(parsed) = parse_date(date) else {
            return false;
        };

        if !self.within_window(parsed) || is_weekend(parsed) {
            return false;
        }

        match selected_doctor {
            Some(doctor_id) => self.is_doctor_available(doctor_id, date),
            None => true,
        }
    }

    /// The date list offered on the schedule step.
    pub fn selectable_dates(&self, selected_doctor: Option<&str>) -> Vec<String> {
        self.generate_candidate_dates(self.window_days)
            .into_iter()
            .filter(|date| self.is_date_selectable(date, selected_doctor))
            .collect()
    }

    /// Past the last representable date counts as outside the window.
    fn within_window(&self, date: NaiveDate) -> bool {
        match days_after(self.today, self.window_days) {
            Some(last) => date > self.today && date <= last,
            None => false,
        }
    }
}

/// Negative windows are empty; anything beyond a year is capped.
fn bounded_window(window_days: i64) -> i64 {
    window_days.clamp(0, MAX_BOOKING_WINDOW_DAYS)
}

fn days_after(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    date.checked_add_days(Days::new(bounded_window(days) as u64))
}

pub fn candidate_dates(today: NaiveDate, window_days: i64) -> Vec<NaiveDate> {
    (1..=bounded_window(window_days))
        .map_while(|offset| days_after(today, offset))
        .filter(|date| !is_weekend(*date))
        .collect()
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
