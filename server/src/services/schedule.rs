//! Scheduling rules shared by the doctor and appointment handlers
//!
//! Weekdays count from Monday = 0 to Sunday = 6. All times are UTC.

use crate::core::AppError;
use crate::dtos::AvailabilityWindowDTO;
use crate::entities::Availability;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};

/// Drops seconds and sub-second precision so stored start times compare as text
pub fn truncate_to_minute(at: DateTime<Utc>) -> DateTime<Utc> {
    at.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(at)
}

pub fn weekday_index(date: NaiveDate) -> i64 {
    date.weekday().num_days_from_monday() as i64
}

/// Rejects windows with a bad weekday, an empty range or an overlap on the same day
pub fn validate_windows(windows: &[AvailabilityWindowDTO]) -> Result<(), AppError> {
    for window in windows {
        if !(0..=6).contains(&window.weekday) {
            return Err(AppError::bad_request("Weekday must be between 0 and 6"));
        }
        if window.start_time >= window.end_time {
            return Err(AppError::bad_request("Window start must be before its end"));
        }
    }

    let mut sorted: Vec<&AvailabilityWindowDTO> = windows.iter().collect();
    sorted.sort_by_key(|w| (w.weekday, w.start_time));
    for pair in sorted.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if a.weekday == b.weekday && b.start_time < a.end_time {
            return Err(AppError::bad_request("Availability windows overlap").with_details(format!(
                "Weekday {}: {}-{} overlaps {}-{}",
                a.weekday, a.start_time, a.end_time, b.start_time, b.end_time
            )));
        }
    }
    Ok(())
}

/// True when `[at, at + slot)` lies entirely inside one window of that weekday
pub fn fits_availability(at: DateTime<Utc>, windows: &[Availability], slot_minutes: i64) -> bool {
    let date = at.date_naive();
    let weekday = weekday_index(date);
    let end = at + Duration::minutes(slot_minutes);
    windows.iter().filter(|w| w.weekday == weekday).any(|w| {
        let window_start = date.and_time(w.start_time).and_utc();
        let window_end = date.and_time(w.end_time).and_utc();
        at >= window_start && end <= window_end
    })
}

/// True when another booking starts less than one slot away from `at`
pub fn clashes(at: DateTime<Utc>, booked: &[DateTime<Utc>], slot_minutes: i64) -> bool {
    booked
        .iter()
        .any(|b| (*b - at).num_minutes().abs() < slot_minutes)
}

/// Bookable start times on `date`: every slot step inside the weekday's
/// windows that ends by the window end, is not taken and is still ahead of `now`
pub fn free_slots(
    date: NaiveDate,
    windows: &[Availability],
    booked: &[DateTime<Utc>],
    slot_minutes: i64,
    now: DateTime<Utc>,
) -> Vec<DateTime<Utc>> {
    let weekday = weekday_index(date);
    let step = Duration::minutes(slot_minutes);
    let mut slots = Vec::new();

    for window in windows.iter().filter(|w| w.weekday == weekday) {
        let mut start = date.and_time(window.start_time).and_utc();
        let window_end = date.and_time(window.end_time).and_utc();
        while start + step <= window_end {
            if start > now && !clashes(start, booked, slot_minutes) {
                slots.push(start);
            }
            start += step;
        }
    }

    slots.sort();
    slots.dedup();
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, TimeZone};

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn window(weekday: i64, start: NaiveTime, end: NaiveTime) -> AvailabilityWindowDTO {
        AvailabilityWindowDTO { weekday, start_time: start, end_time: end }
    }

    fn availability(weekday: i64, start: NaiveTime, end: NaiveTime) -> Availability {
        Availability {
            availability_id: 1,
            doctor_id: 1,
            weekday,
            start_time: start,
            end_time: end,
        }
    }

    // 2030-01-07 is a Monday
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 1, 7).unwrap()
    }

    fn at(date: NaiveDate, h: u32, m: u32) -> DateTime<Utc> {
        date.and_time(time(h, m)).and_utc()
    }

    #[test]
    fn truncation_drops_seconds() {
        let raw = Utc.with_ymd_and_hms(2030, 1, 7, 9, 15, 42).unwrap() + Duration::milliseconds(250);
        assert_eq!(truncate_to_minute(raw), at(monday(), 9, 15));
    }

    #[test]
    fn monday_is_weekday_zero() {
        assert_eq!(weekday_index(monday()), 0);
        assert_eq!(weekday_index(monday() + Duration::days(6)), 6);
    }

    #[test]
    fn overlapping_windows_are_rejected() {
        let windows = vec![
            window(0, time(9, 0), time(12, 0)),
            window(0, time(11, 30), time(14, 0)),
        ];
        assert!(validate_windows(&windows).is_err());
    }

    #[test]
    fn touching_windows_and_other_days_are_fine() {
        let windows = vec![
            window(0, time(9, 0), time(12, 0)),
            window(0, time(12, 0), time(14, 0)),
            window(1, time(10, 0), time(13, 0)),
        ];
        assert!(validate_windows(&windows).is_ok());
    }

    #[test]
    fn bad_weekday_and_empty_range_are_rejected() {
        assert!(validate_windows(&[window(7, time(9, 0), time(10, 0))]).is_err());
        assert!(validate_windows(&[window(2, time(10, 0), time(10, 0))]).is_err());
    }

    #[test]
    fn slot_must_end_inside_the_window() {
        let windows = vec![availability(0, time(9, 0), time(12, 0))];
        assert!(fits_availability(at(monday(), 9, 0), &windows, 30));
        assert!(fits_availability(at(monday(), 11, 30), &windows, 30));
        assert!(!fits_availability(at(monday(), 11, 45), &windows, 30));
        assert!(!fits_availability(at(monday() + Duration::days(1), 9, 0), &windows, 30));
    }

    #[test]
    fn clash_is_strictly_within_one_slot() {
        let booked = vec![at(monday(), 10, 0)];
        assert!(clashes(at(monday(), 10, 15), &booked, 30));
        assert!(clashes(at(monday(), 9, 45), &booked, 30));
        assert!(!clashes(at(monday(), 10, 30), &booked, 30));
    }

    #[test]
    fn free_slots_skip_booked_and_past_times() {
        let windows = vec![availability(0, time(9, 0), time(11, 0))];
        let booked = vec![at(monday(), 10, 0)];
        let now = at(monday(), 9, 10);

        let slots = free_slots(monday(), &windows, &booked, 30, now);

        assert_eq!(slots, vec![at(monday(), 9, 30), at(monday(), 10, 30)]);
    }

    #[test]
    fn no_windows_no_slots() {
        let slots = free_slots(monday(), &[], &[], 30, at(monday(), 0, 0));
        assert!(slots.is_empty());
    }
}
