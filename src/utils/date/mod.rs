// Date utility functions
// All engine-internal instants are epoch milliseconds; wall-clock math goes
// through a TimeRef so the configured IANA zone (or system local time) is
// applied consistently.

use chrono::{
    DateTime, Datelike, Duration, Local, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeZone,
    Utc,
};
use chrono_tz::Tz;

pub const MS_PER_MINUTE: i64 = 60 * 1000;
pub const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
pub const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;
pub const MS_PER_WEEK: i64 = 7 * MS_PER_DAY;

/// Reference time zone for all wall-clock conversions.
///
/// `Local` follows the system zone; `Zone` pins an IANA zone so every user
/// of a team calendar sees the same wall-clock times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeRef {
    #[default]
    Local,
    Zone(Tz),
}

impl TimeRef {
    /// Parse an IANA zone name; `None` input falls back to system local.
    pub fn from_name(name: Option<&str>) -> Self {
        match name {
            Some(name) => match name.parse::<Tz>() {
                Ok(tz) => TimeRef::Zone(tz),
                Err(_) => {
                    log::warn!("Unknown timezone {:?}, falling back to system local", name);
                    TimeRef::Local
                }
            },
            None => TimeRef::Local,
        }
    }

    pub fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    /// UTC offset in seconds at the given instant.
    pub fn offset_seconds(&self, ms: i64) -> i32 {
        let utc = utc_from_ms(ms);
        match self {
            TimeRef::Local => utc.with_timezone(&Local).offset().fix().local_minus_utc(),
            TimeRef::Zone(tz) => utc.with_timezone(tz).offset().fix().local_minus_utc(),
        }
    }

    /// Wall-clock date/time of an instant in this zone.
    pub fn wall(&self, ms: i64) -> NaiveDateTime {
        let utc = utc_from_ms(ms);
        match self {
            TimeRef::Local => utc.with_timezone(&Local).naive_local(),
            TimeRef::Zone(tz) => utc.with_timezone(tz).naive_local(),
        }
    }

    pub fn wall_date(&self, ms: i64) -> NaiveDate {
        self.wall(ms).date()
    }

    /// Instant for a wall-clock date/time in this zone.
    ///
    /// Ambiguous times (fall-back hour) resolve to the earlier instant;
    /// nonexistent times (spring-forward gap) return `None`.
    pub fn instant(&self, wall: NaiveDateTime) -> Option<i64> {
        match self {
            TimeRef::Local => {
                resolve_local(Local.from_local_datetime(&wall)).map(|dt| dt.timestamp_millis())
            }
            TimeRef::Zone(tz) => {
                resolve_local(tz.from_local_datetime(&wall)).map(|dt| dt.timestamp_millis())
            }
        }
    }

    /// Instant at local midnight for the given date.
    pub fn day_start(&self, date: NaiveDate) -> Option<i64> {
        self.instant(date.and_hms_opt(0, 0, 0)?)
    }

    /// Hours to add to a working end instant so the rendered duration
    /// matches the wall clock when start and end straddle a DST shift.
    /// Zero when both instants share a UTC offset.
    pub fn dst_correction_hours(&self, start_ms: i64, end_ms: i64) -> i64 {
        i64::from(self.offset_seconds(end_ms) - self.offset_seconds(start_ms)) / 3600
    }
}

fn utc_from_ms(ms: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(ms).unwrap_or_else(Utc::now)
}

fn resolve_local<T: TimeZone>(result: LocalResult<DateTime<T>>) -> Option<DateTime<T>> {
    match result {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earlier, _) => Some(earlier),
        LocalResult::None => None,
    }
}

/// Days in the month containing `date`.
pub fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = (date.year(), date.month());
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    match next {
        Some(next) => next
            .signed_duration_since(NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date))
            .num_days() as u32,
        None => 31,
    }
}

pub fn start_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

/// Column offset of the first of the month, relative to the configured
/// first day of the week (0 = Sunday).
pub fn first_weekday_offset(date: NaiveDate, first_day_of_week: u32) -> u32 {
    let weekday = start_of_month(date).weekday().num_days_from_sunday();
    (weekday + 7 - first_day_of_week) % 7
}

/// First date of the week containing `date`.
pub fn week_start(date: NaiveDate, first_day_of_week: u32) -> NaiveDate {
    let back = (date.weekday().num_days_from_sunday() + 7 - first_day_of_week) % 7;
    date - Duration::days(i64::from(back))
}

/// Inclusive date range of the week containing `date`.
pub fn week_range(date: NaiveDate, first_day_of_week: u32) -> (NaiveDate, NaiveDate) {
    let start = week_start(date, first_day_of_week);
    (start, start + Duration::days(6))
}

pub fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
    let total = date.year() * 12 + date.month() as i32 - 1 + months;
    let (year, month) = (total.div_euclid(12), total.rem_euclid(12) as u32 + 1);
    let day = date
        .day()
        .min(days_in_month(NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)));
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(date)
}

/// Parse calendar date input ("YYYY/M/D", unpadded fields allowed).
pub fn parse_date_input(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y/%m/%d").ok()
}

/// Parse time-of-day input ("HH:mm"); "24:00" means end of day and is
/// returned as minutes-from-midnight like every other value.
pub fn parse_time_input(text: &str) -> Option<u32> {
    let trimmed = text.trim();
    let (hours, minutes) = trimmed.split_once(':')?;
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    if minutes > 59 || hours > 24 || (hours == 24 && minutes != 0) {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// Combined date + time input to an instant in the given zone.
pub fn parse_date_time_input(date: &str, time: &str, tz: TimeRef) -> Option<i64> {
    let date = parse_date_input(date)?;
    let minutes = parse_time_input(time)?;
    let base = tz.instant(date.and_hms_opt(0, 0, 0)?)?;
    Some(base + i64::from(minutes) * MS_PER_MINUTE)
}

pub const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub const MONTHS_SHORT: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub const DAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

pub const DAYS_SHORT: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Month display name; `month` is 1-based.
pub fn month_name(month: u32) -> &'static str {
    MONTHS[(month as usize - 1).min(11)]
}

pub fn month_name_short(month: u32) -> &'static str {
    MONTHS_SHORT[(month as usize - 1).min(11)]
}

/// Weekday display name; `weekday` counts from Sunday = 0.
pub fn day_name(weekday: u32) -> &'static str {
    DAYS[(weekday as usize).min(6)]
}

pub fn day_name_short(weekday: u32) -> &'static str {
    DAYS_SHORT[(weekday as usize).min(6)]
}

/// Unpadded "YYYY/M/D", matching the calendar's cell date keys.
pub fn format_date_key(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.year(), date.month(), date.day())
}

/// Display format used in labels and tooltips: "M/D/YYYY HH:mm".
pub fn format_display(wall: NaiveDateTime) -> String {
    use chrono::Timelike;
    format!(
        "{}/{}/{} {:02}:{:02}",
        wall.month(),
        wall.day(),
        wall.year(),
        wall.hour(),
        wall.minute()
    )
}
