//! Time scale utilities: Julian Date, calendar conversion, GMST.

use chrono::{Datelike, NaiveDate};

use crate::constants::SECONDS_PER_DAY;

/// Julian Date of the J2000.0 epoch (2000-01-01 12:00:00 TT).
pub const J2000_JD: f64 = 2_451_545.0;

/// Days per Julian century.
pub const JULIAN_CENTURY_DAYS: f64 = 36_525.0;

const TWO_PI: f64 = 2.0 * std::f64::consts::PI;

/// Convert a calendar date to Julian Date.
///
/// Standard algorithm from Meeus, "Astronomical Algorithms" Chapter 7;
/// valid for Gregorian dates (after 1582-10-15). `day` may carry a
/// fractional part for the time of day.
pub fn calendar_to_jd(year: i32, month: u32, day: f64) -> f64 {
    let (y, m) = if month <= 2 {
        (f64::from(year) - 1.0, f64::from(month) + 12.0)
    } else {
        (f64::from(year), f64::from(month))
    };

    let a = (y / 100.0).floor();
    let b = 2.0 - a + (a / 4.0).floor();

    (365.25 * (y + 4716.0)).floor() + (30.6001 * (m + 1.0)).floor() + day + b - 1524.5
}

/// Convert a `chrono` date to the Julian Date of its midnight (0h UT).
pub fn date_to_jd(date: NaiveDate) -> f64 {
    calendar_to_jd(date.year(), date.month(), f64::from(date.day()))
}

/// Convert a Julian Date to calendar (year, month, day-with-fraction).
///
/// Inverse Meeus algorithm.
pub fn jd_to_calendar(jd: f64) -> (i32, u32, f64) {
    let z = (jd + 0.5).floor();
    let f = jd + 0.5 - z;

    let a = if z < 2_299_161.0 {
        z
    } else {
        let alpha = ((z - 1_867_216.25) / 36_524.25).floor();
        z + 1.0 + alpha - (alpha / 4.0).floor()
    };

    let b = a + 1524.0;
    let c = ((b - 122.1) / 365.25).floor();
    let d = (365.25 * c).floor();
    let e = ((b - d) / 30.6001).floor();

    let day = b - d - (30.6001 * e).floor() + f;
    let month = if e < 14.0 { e - 1.0 } else { e - 13.0 };
    let year = if month > 2.0 { c - 4716.0 } else { c - 4715.0 };

    (year as i32, month as u32, day)
}

/// Format a Julian Date as an ISO-8601 UTC timestamp for logs and summaries.
pub fn jd_to_iso8601(jd: f64) -> String {
    let (year, month, day) = jd_to_calendar(jd);
    let day_whole = day.floor();
    let mut total_seconds = ((day - day_whole) * SECONDS_PER_DAY + 0.5).floor() as i64;
    // Rounding may spill into the next day; clamp to 23:59:59 rather than
    // carrying across the date boundary.
    if total_seconds >= 86_400 {
        total_seconds = 86_399;
    }
    let hour = total_seconds / 3600;
    let minute = (total_seconds % 3600) / 60;
    let second = total_seconds % 60;

    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        year, month, day_whole as u32, hour, minute, second
    )
}

/// Greenwich Mean Sidereal Time in radians, normalized to [0, 2π).
///
/// IAU 1982 polynomial in Julian centuries since J2000.
pub fn gmst(jd: f64) -> f64 {
    let t = (jd - J2000_JD) / JULIAN_CENTURY_DAYS;

    // GMST in seconds of time.
    let gmst_seconds = 67_310.548_41
        + (876_600.0 * 3600.0 + 8_640_184.812_866) * t
        + 0.093_104 * t * t
        - 6.2e-6 * t * t * t;

    let mut gmst_rad = gmst_seconds * TWO_PI / SECONDS_PER_DAY;
    gmst_rad = gmst_rad.rem_euclid(TWO_PI);
    gmst_rad
}

/// Advance a Julian Date by a number of seconds.
#[inline]
pub fn add_seconds(jd: f64, seconds: f64) -> f64 {
    jd + seconds / SECONDS_PER_DAY
}
