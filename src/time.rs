//! Entry modification timestamps
//!
//! Zip records carry an MS-DOS date and time in local time with two second
//! precision. Since the writer has no notion of the reader's time zone, entry
//! times are supplied as [`UtcDateTime`] and recorded twice: packed into the
//! DOS fields, and as a Unix timestamp inside an extended timestamp extra
//! field (0x5455) which readers prefer when present.
//!
//! ```
//! use streamzip::time::UtcDateTime;
//!
//! let dt = UtcDateTime::from_components(2023, 6, 15, 14, 30, 45, 0).unwrap();
//! assert_eq!(dt.to_unix(), 1686839445);
//! assert_eq!(UtcDateTime::from_unix(1686839445), dt);
//! assert_eq!(dt.to_string(), "2023-06-15T14:30:45Z");
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

/// Extra field id of the extended timestamp ("UT").
pub(crate) const EXTENDED_TIMESTAMP_ID: u16 = 0x5455;

/// A validated UTC date and time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UtcDateTime {
    year: u16,
    month: u8,       // 1-12
    day: u8,         // 1-31
    hour: u8,        // 0-23
    minute: u8,      // 0-59
    second: u8,      // 0-59
    nanosecond: u32, // 0-999,999,999
}

impl UtcDateTime {
    /// Creates a timestamp from date/time components.
    ///
    /// Returns `None` if any component is out of range or the date doesn't
    /// exist (February 30th, April 31st).
    ///
    /// ```
    /// # use streamzip::time::UtcDateTime;
    /// assert!(UtcDateTime::from_components(2024, 2, 29, 0, 0, 0, 0).is_some());
    /// assert!(UtcDateTime::from_components(2023, 2, 29, 0, 0, 0, 0).is_none());
    /// ```
    pub fn from_components(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        nanosecond: u32,
    ) -> Option<Self> {
        if year == 0
            || !(1..=12).contains(&month)
            || day == 0
            || hour > 23
            || minute > 59
            || second > 59
            || nanosecond > 999_999_999
            || day > last_day_of_month(year, month)
        {
            return None;
        }

        Some(UtcDateTime {
            year,
            month,
            day,
            hour,
            minute,
            second,
            nanosecond,
        })
    }

    /// Creates a timestamp from seconds since the Unix epoch.
    pub fn from_unix(seconds: i64) -> Self {
        const SECONDS_PER_DAY: i64 = 86400;
        let days = seconds.div_euclid(SECONDS_PER_DAY);
        let secs_of_day = seconds.rem_euclid(SECONDS_PER_DAY);
        let (year, month, day) = civil_from_days(days);

        UtcDateTime {
            year,
            month,
            day,
            hour: (secs_of_day / 3600) as u8,
            minute: ((secs_of_day % 3600) / 60) as u8,
            second: (secs_of_day % 60) as u8,
            nanosecond: 0,
        }
    }

    /// The current system time.
    ///
    /// Clocks set before the Unix epoch are reported as the epoch.
    pub fn now() -> Self {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let mut result = Self::from_unix(elapsed.as_secs() as i64);
        result.nanosecond = elapsed.subsec_nanos();
        result
    }

    /// Seconds since the Unix epoch. Negative before 1970.
    #[must_use]
    pub fn to_unix(&self) -> i64 {
        i64::from(days_from_civil(self.year, self.month, self.day)) * 86400
            + i64::from(self.hour) * 3600
            + i64::from(self.minute) * 60
            + i64::from(self.second)
    }

    #[must_use]
    pub const fn year(&self) -> u16 {
        self.year
    }

    #[must_use]
    pub const fn month(&self) -> u8 {
        self.month
    }

    #[must_use]
    pub const fn day(&self) -> u8 {
        self.day
    }

    #[must_use]
    pub const fn hour(&self) -> u8 {
        self.hour
    }

    #[must_use]
    pub const fn minute(&self) -> u8 {
        self.minute
    }

    #[must_use]
    pub const fn second(&self) -> u8 {
        self.second
    }

    #[must_use]
    pub const fn nanosecond(&self) -> u32 {
        self.nanosecond
    }
}

impl std::fmt::Display for UtcDateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )?;
        if self.nanosecond != 0 {
            write!(f, ".{:09}", self.nanosecond)?;
        }
        write!(f, "Z")
    }
}

/// An MS-DOS timestamp: packed 16-bit time and date, 1980 to 2107, two
/// second precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DosDateTime {
    time: u16,
    date: u16,
}

impl DosDateTime {
    /// 1980-01-01 00:00:00, recorded for entries without a modification time.
    pub(crate) const EPOCH: DosDateTime = DosDateTime {
        time: 0,
        date: (1 << 5) | 1,
    };

    pub(crate) const fn into_parts(self) -> (u16, u16) {
        (self.time, self.date)
    }
}

impl From<&UtcDateTime> for DosDateTime {
    fn from(dt: &UtcDateTime) -> Self {
        if dt.year < 1980 {
            return DosDateTime::EPOCH;
        }

        let year = dt.year.min(2107);

        // bits 15-9: year-1980, bits 8-5: month, bits 4-0: day
        let date = ((year - 1980) << 9) | (u16::from(dt.month) << 5) | u16::from(dt.day);

        // bits 15-11: hour, bits 10-5: minute, bits 4-0: second/2
        let time =
            (u16::from(dt.hour) << 11) | (u16::from(dt.minute) << 5) | (u16::from(dt.second) / 2);

        DosDateTime { time, date }
    }
}

/// Days since 1970-01-01 for a civil date.
///
/// Howard Hinnant's `days_from_civil`:
/// <https://howardhinnant.github.io/date_algorithms.html#days_from_civil>
const fn days_from_civil(year: u16, month: u8, day: u8) -> i32 {
    let (y, m) = if month <= 2 {
        (year as i32 - 1, month as i32 + 9)
    } else {
        (year as i32, month as i32 - 3)
    };

    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let doy = (153 * m + 2) / 5 + day as i32 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146097 + doe - 719468
}

/// Inverse of [`days_from_civil`]. Years outside of `u16` saturate.
fn civil_from_days(days: i64) -> (u16, u8, u8) {
    let z = days + 719468;
    let era = z.div_euclid(146097);
    let doe = z.rem_euclid(146097);
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u8;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u8;
    let year = era * 400 + yoe + i64::from(month <= 2);
    (year.clamp(0, i64::from(u16::MAX)) as u16, month, day)
}

const fn is_leap(year: u16) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

const fn last_day_of_month(year: u16, month: u8) -> u8 {
    match month {
        2 if is_leap(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}
