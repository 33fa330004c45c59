// src/codec/time.rs

//! Время в AD: FILETIME (100-нс интервалы от 1601-01-01) и Generalized Time.

use chrono::{DateTime, NaiveDateTime, TimeDelta, Timelike, Utc};

/// 100-наносекундных интервалов в секунде
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Секунд между 1601-01-01 и 1970-01-01
pub const EPOCH_DIFF_SECS: i64 = 11_644_473_600;

/// accountExpires: «никогда» кодируется 0 или i64::MAX
pub const NEVER: i64 = i64::MAX;

pub fn ticks_to_datetime(ticks: i64) -> Option<DateTime<Utc>> {
    if ticks < 0 {
        return None;
    }
    let secs = ticks / TICKS_PER_SECOND - EPOCH_DIFF_SECS;
    let nanos = ((ticks % TICKS_PER_SECOND) * 100) as u32;
    DateTime::from_timestamp(secs, nanos)
}

pub fn datetime_to_ticks(dt: &DateTime<Utc>) -> Option<i64> {
    let secs = dt.timestamp().checked_add(EPOCH_DIFF_SECS)?;
    if secs < 0 {
        return None;
    }
    let sub = i64::from(dt.timestamp_subsec_nanos()) / 100;
    secs.checked_mul(TICKS_PER_SECOND)?.checked_add(sub)
}

/// Отрицательные интервалы (maxPwdAge и т.п.) сохраняют знак
pub fn ticks_to_interval(ticks: i64) -> Option<TimeDelta> {
    let secs = TimeDelta::try_seconds(ticks / TICKS_PER_SECOND)?;
    secs.checked_add(&TimeDelta::nanoseconds((ticks % TICKS_PER_SECOND) * 100))
}

pub fn interval_to_ticks(delta: &TimeDelta) -> Option<i64> {
    let sub = i64::from(delta.subsec_nanos()) / 100;
    delta.num_seconds().checked_mul(TICKS_PER_SECOND)?.checked_add(sub)
}

/// `20240131235959.0Z`; также понимает UTC Time `240131235959Z`
pub fn parse_generalized_time(s: &str) -> Option<DateTime<Utc>> {
    let body = s.trim().strip_suffix('Z')?;
    let (digits, fraction) = match body.split_once('.') {
        Some((d, f)) => (d, Some(f)),
        None => (body, None),
    };
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let naive = match digits.len() {
        14 => NaiveDateTime::parse_from_str(digits, "%Y%m%d%H%M%S").ok()?,
        12 => NaiveDateTime::parse_from_str(digits, "%y%m%d%H%M%S").ok()?,
        _ => return None,
    };
    let nanos = match fraction {
        Some(f) if !f.is_empty() && f.len() <= 9 && f.bytes().all(|b| b.is_ascii_digit()) => {
            format!("{:0<9}", f).parse::<u32>().ok()?
        }
        Some(_) => return None,
        None => 0,
    };
    naive.with_nanosecond(nanos).map(|n| n.and_utc())
}

/// Доли секунды отбрасываются: `...SS.0Z`
pub fn format_generalized_time(dt: &DateTime<Utc>) -> String {
    dt.format("%Y%m%d%H%M%S.0Z").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn epoch_is_1601() {
        let dt = ticks_to_datetime(0).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(1601, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn unix_epoch_in_ticks() {
        let unix = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(datetime_to_ticks(&unix), Some(116_444_736_000_000_000));
    }

    #[test]
    fn known_timestamp() {
        // 2011-06-15 12:30:45.5 UTC
        let ticks = 129_526_146_455_000_000;
        let dt = ticks_to_datetime(ticks).unwrap();
        assert_eq!(
            dt,
            Utc.with_ymd_and_hms(2011, 6, 15, 12, 30, 45).unwrap() + TimeDelta::milliseconds(500)
        );
        assert_eq!(datetime_to_ticks(&dt), Some(ticks));
    }

    #[test]
    fn never_round_trips() {
        let dt = ticks_to_datetime(NEVER).unwrap();
        assert_eq!(datetime_to_ticks(&dt), Some(NEVER));
    }

    #[test]
    fn negative_ticks_are_not_dates() {
        assert_eq!(ticks_to_datetime(-1), None);
    }

    #[test]
    fn interval_keeps_sign() {
        // maxPwdAge = 42 дня
        let ticks = -36_288_000_000_000;
        let delta = ticks_to_interval(ticks).unwrap();
        assert_eq!(delta, -TimeDelta::days(42));
        assert_eq!(interval_to_ticks(&delta), Some(ticks));
        let min = ticks_to_interval(i64::MIN).unwrap();
        assert_eq!(interval_to_ticks(&min), Some(i64::MIN));
    }

    #[test]
    fn generalized_time_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap();
        assert_eq!(parse_generalized_time("20240131235959.0Z"), Some(expected));
        assert_eq!(parse_generalized_time("20240131235959Z"), Some(expected));
        assert_eq!(parse_generalized_time("240131235959Z"), Some(expected));
        assert_eq!(format_generalized_time(&expected), "20240131235959.0Z");
        assert_eq!(parse_generalized_time("2024-01-31"), None);
        assert_eq!(parse_generalized_time("20241331235959.0Z"), None);
    }
}
