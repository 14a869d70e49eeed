//! Age threshold calculation.
//!
//! Converts a relative age in hours into the absolute cutoff instant used by
//! the move and deletion phases. A file qualifies for an action when its
//! modification time is strictly earlier than the cutoff.

use crate::utils::to_system_time;
use chrono::{DateTime, TimeDelta, Utc};
use std::time::SystemTime;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Compute the cutoff instant `reference - hours`.
///
/// Negative or NaN hours are treated as zero. Ages too large to represent
/// saturate to the earliest instant chrono can express, so nothing qualifies.
pub fn cutoff_at(hours: f64, reference: DateTime<Utc>) -> DateTime<Utc> {
    let hours = if hours.is_nan() { 0.0 } else { hours.max(0.0) };
    let millis = (hours * MILLIS_PER_HOUR).round();

    // f64 -> i64 casts saturate, so i64::MAX is handled by try_milliseconds
    TimeDelta::try_milliseconds(millis as i64)
        .and_then(|age| reference.checked_sub_signed(age))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Compute the cutoff instant relative to the current time.
///
/// Each phase calls this on its own, so the move and deletion cutoffs of one
/// policy are anchored to the moment that phase started.
pub fn cutoff_from_now(hours: f64) -> DateTime<Utc> {
    cutoff_at(hours, Utc::now())
}

/// Whether a modification time falls strictly before the cutoff.
///
/// The comparison happens between `SystemTime`s, so any timestamp the file
/// system reports is accepted. A cutoff earlier than the platform clock can
/// represent expires nothing.
pub fn is_expired(modified: SystemTime, cutoff: DateTime<Utc>) -> bool {
    to_system_time(cutoff).is_some_and(|cutoff| modified < cutoff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_zero_hours_is_reference() {
        assert_eq!(cutoff_at(0.0, reference()), reference());
    }

    #[test]
    fn test_whole_hours() {
        let cutoff = cutoff_at(24.0, reference());
        assert_eq!(cutoff, Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_fractional_hours() {
        let cutoff = cutoff_at(1.5, reference());
        assert_eq!(cutoff, Utc.with_ymd_and_hms(2024, 3, 10, 10, 30, 0).unwrap());
    }

    #[test]
    fn test_negative_and_nan_clamp_to_reference() {
        assert_eq!(cutoff_at(-5.0, reference()), reference());
        assert_eq!(cutoff_at(f64::NAN, reference()), reference());
    }

    #[test]
    fn test_huge_hours_saturate() {
        assert_eq!(cutoff_at(1e300, reference()), DateTime::<Utc>::MIN_UTC);
        assert_eq!(cutoff_at(f64::INFINITY, reference()), DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn test_cutoff_from_now_is_in_the_past() {
        let before = Utc::now();
        let cutoff = cutoff_from_now(1.0);
        assert!(cutoff < before);
        assert!(cutoff > before - TimeDelta::hours(2));
    }

    #[test]
    fn test_is_expired_is_strict() {
        let cutoff = DateTime::<Utc>::from_timestamp(1_000, 0).unwrap();
        let at_cutoff = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
        let older = SystemTime::UNIX_EPOCH + Duration::from_secs(999);
        let newer = SystemTime::UNIX_EPOCH + Duration::from_secs(1_001);

        assert!(!is_expired(at_cutoff, cutoff));
        assert!(is_expired(older, cutoff));
        assert!(!is_expired(newer, cutoff));
    }

    #[test]
    fn test_is_expired_accepts_out_of_range_mtimes() {
        let cutoff = reference();
        let offset = Duration::from_secs(10_000_000_000_000);

        if let Some(far_future) = SystemTime::UNIX_EPOCH.checked_add(offset) {
            assert!(!is_expired(far_future, cutoff));
        }
        if let Some(far_past) = SystemTime::UNIX_EPOCH.checked_sub(offset) {
            assert!(is_expired(far_past, cutoff));
        }
    }

    #[test]
    fn test_saturated_cutoff_expires_nothing() {
        let cutoff = cutoff_at(f64::INFINITY, reference());
        assert!(!is_expired(SystemTime::UNIX_EPOCH, cutoff));
    }
}
