//! Rollover schedule: when the current file must be archived
//!
//! A [`RotationClock`] turns a [`RotationInterval`] and a [`Zone`] into
//! concrete rollover instants. For intervals of a day or longer the schedule
//! follows the wall clock of the zone, so an interval that contains a DST
//! transition is an hour longer (fall back) or shorter (spring forward).

use chrono::{
    DateTime, Datelike, FixedOffset, Local, NaiveDateTime, Offset, TimeDelta, Timelike, Utc,
    Weekday,
};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

const SECONDS_PER_DAY: i64 = 86_400;

/// Longest interval a schedule accepts: one hundred years
pub const MAX_INTERVAL_SECONDS: i64 = 100 * 366 * SECONDS_PER_DAY;

/// The unit a rotation interval is counted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RotationUnit {
    /// Fixed-length seconds
    Seconds,
    /// Fixed-length minutes
    Minutes,
    /// Fixed-length hours
    Hours,
    /// Fixed-length days (86 400 s, DST-adjusted in local time)
    Days,
    /// At midnight
    Midnight,
    /// At the midnight that begins the given weekday
    Weekly(Weekday),
}

impl RotationUnit {
    /// Length of one unit in seconds
    pub const fn seconds(self) -> i64 {
        match self {
            Self::Seconds => 1,
            Self::Minutes => 60,
            Self::Hours => 3_600,
            Self::Days | Self::Midnight => SECONDS_PER_DAY,
            Self::Weekly(_) => 7 * SECONDS_PER_DAY,
        }
    }

    /// Whether the unit follows the wall clock (and so DST)
    pub const fn spans_days(self) -> bool {
        matches!(self, Self::Days | Self::Midnight | Self::Weekly(_))
    }
}

impl fmt::Display for RotationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seconds => f.write_str("S"),
            Self::Minutes => f.write_str("M"),
            Self::Hours => f.write_str("H"),
            Self::Days => f.write_str("D"),
            Self::Midnight => f.write_str("MIDNIGHT"),
            Self::Weekly(day) => write!(f, "W{}", day.num_days_from_monday()),
        }
    }
}

/// Unrecognised rotation unit
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown rotation unit {0:?}")]
pub struct ParseRotationUnitError(pub String);

impl FromStr for RotationUnit {
    type Err = ParseRotationUnitError;

    /// Accepts the short codes `S`, `M`, `H`, `D`, `MIDNIGHT`, `W0`..`W6`
    /// (`W0` is Monday) and a few words such as `hourly` or `daily`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        let unit = match code.as_str() {
            "S" | "SECOND" | "SECONDS" => Self::Seconds,
            "M" | "MINUTE" | "MINUTES" => Self::Minutes,
            "H" | "HOUR" | "HOURS" | "HOURLY" => Self::Hours,
            "D" | "DAY" | "DAYS" | "DAILY" => Self::Days,
            "MIDNIGHT" => Self::Midnight,
            "WEEKLY" => Self::Weekly(Weekday::Mon),
            _ => {
                let day = code
                    .strip_prefix('W')
                    .and_then(|n| n.parse::<u8>().ok())
                    .and_then(|n| Weekday::try_from(n).ok())
                    .ok_or_else(|| ParseRotationUnitError(s.to_string()))?;
                Self::Weekly(day)
            }
        };
        Ok(unit)
    }
}

/// A rotation unit times a magnitude, e.g. "every 2 hours"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RotationInterval {
    /// Unit of the interval
    pub unit: RotationUnit,
    /// How many units; always at least 1
    pub magnitude: u32,
}

impl RotationInterval {
    /// Create an interval; a magnitude of 0 is treated as 1
    pub fn new(unit: RotationUnit, magnitude: u32) -> Self {
        Self {
            unit,
            magnitude: magnitude.max(1),
        }
    }

    /// Nominal length of the interval
    pub fn length(&self) -> TimeDelta {
        TimeDelta::seconds(self.unit.seconds() * i64::from(self.magnitude))
    }

    /// Largest magnitude of `unit` that stays within [`MAX_INTERVAL_SECONDS`]
    pub const fn max_magnitude(unit: RotationUnit) -> u32 {
        (MAX_INTERVAL_SECONDS / unit.seconds()) as u32
    }
}

impl Default for RotationInterval {
    fn default() -> Self {
        Self::new(RotationUnit::Days, 1)
    }
}

/// A time zone as far as rollover is concerned: its UTC offset at an instant
pub trait Zone: Send + Sync + 'static {
    /// Offset in effect at `instant`
    fn offset_at(&self, instant: DateTime<Utc>) -> FixedOffset;
}

impl Zone for Utc {
    fn offset_at(&self, _instant: DateTime<Utc>) -> FixedOffset {
        Utc.fix()
    }
}

impl Zone for Local {
    fn offset_at(&self, instant: DateTime<Utc>) -> FixedOffset {
        instant.with_timezone(&Local).offset().fix()
    }
}

impl Zone for FixedOffset {
    fn offset_at(&self, _instant: DateTime<Utc>) -> FixedOffset {
        *self
    }
}

/// Computes rollover instants for one interval in one zone
#[derive(Clone)]
pub struct RotationClock {
    interval: RotationInterval,
    zone: Arc<dyn Zone>,
}

impl fmt::Debug for RotationClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RotationClock")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl RotationClock {
    /// Schedule `interval` in `zone`
    pub fn new(interval: RotationInterval, zone: Arc<dyn Zone>) -> Self {
        Self { interval, zone }
    }

    /// Schedule in UTC; no DST adjustment ever applies
    pub fn utc(interval: RotationInterval) -> Self {
        Self::new(interval, Arc::new(Utc))
    }

    /// Schedule in the system's local time zone
    pub fn local(interval: RotationInterval) -> Self {
        Self::new(interval, Arc::new(Local))
    }

    /// The interval being scheduled
    pub fn interval(&self) -> RotationInterval {
        self.interval
    }

    /// Wall-clock time of `instant` in this clock's zone
    pub fn local_time(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant
            .with_timezone(&self.zone.offset_at(instant))
            .naive_local()
    }

    /// First rollover instant after `base`. Always strictly later than `base`.
    pub fn compute_rollover(&self, base: DateTime<Utc>) -> DateTime<Utc> {
        let extra = i64::from(self.interval.magnitude) - 1;
        let raw = match self.interval.unit {
            RotationUnit::Seconds
            | RotationUnit::Minutes
            | RotationUnit::Hours
            | RotationUnit::Days => shifted(base, self.interval.length()),
            RotationUnit::Midnight => shifted(self.next_midnight(base), TimeDelta::days(extra)),
            RotationUnit::Weekly(day) => {
                let tomorrow = self.local_time(base).weekday().succ();
                let wait = (day.num_days_from_monday() + 7 - tomorrow.num_days_from_monday()) % 7;
                let day = shifted(self.next_midnight(base), TimeDelta::days(i64::from(wait)));
                shifted(day, TimeDelta::weeks(extra))
            }
        };

        let adjusted = shifted(raw, self.dst_shift(base, raw));
        if adjusted > base { adjusted } else { raw }
    }

    /// First rollover instant strictly after `now`, on the schedule that
    /// starts at `anchor`. Missed intervals are skipped, not replayed.
    pub fn next_rollover(&self, anchor: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
        let first = self.compute_rollover(anchor);
        if first > now {
            return first;
        }

        let length = self.interval.length();
        let behind = (now - first).num_seconds() / length.num_seconds() + 1;
        let mut next = shifted(first, TimeDelta::seconds(length.num_seconds() * behind));
        next = shifted(next, self.dst_shift(first, next));
        while next <= now {
            let later = shifted(next, length);
            if later == next {
                break;
            }
            next = later;
        }
        next
    }

    /// Start of the interval that ends at `rollover`, as seen from `now`.
    /// Archive names are derived from this instant.
    pub fn interval_start(&self, rollover: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
        let start = shifted(rollover, -self.interval.length());
        shifted(start, self.dst_shift(now, start))
    }

    /// `offset(from) - offset(to)` for wall-clock units, zero otherwise
    fn dst_shift(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> TimeDelta {
        if !self.interval.unit.spans_days() {
            return TimeDelta::zero();
        }
        let from = self.zone.offset_at(from).local_minus_utc();
        let to = self.zone.offset_at(to).local_minus_utc();
        TimeDelta::seconds(i64::from(from - to))
    }

    /// Next wall-clock midnight after `base`, using the offset at `base`
    fn next_midnight(&self, base: DateTime<Utc>) -> DateTime<Utc> {
        let wall = self.local_time(base).time();
        let elapsed = TimeDelta::seconds(i64::from(wall.num_seconds_from_midnight()))
            + TimeDelta::nanoseconds(i64::from(wall.nanosecond()));
        shifted(base, TimeDelta::days(1) - elapsed)
    }
}

/// `at + delta`, saturating a week inside chrono's range so that zone
/// conversions of the result cannot overflow either
fn shifted(at: DateTime<Utc>, delta: TimeDelta) -> DateTime<Utc> {
    let latest = DateTime::<Utc>::MAX_UTC - TimeDelta::weeks(1);
    let earliest = DateTime::<Utc>::MIN_UTC + TimeDelta::weeks(1);
    match at.checked_add_signed(delta) {
        Some(t) => t.clamp(earliest, latest),
        None if delta > TimeDelta::zero() => latest,
        None => earliest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    /// A zone with a single DST switch
    struct DstZone {
        switch: DateTime<Utc>,
        before: i32,
        after: i32,
    }

    impl Zone for DstZone {
        fn offset_at(&self, instant: DateTime<Utc>) -> FixedOffset {
            let secs = if instant < self.switch {
                self.before
            } else {
                self.after
            };
            FixedOffset::east_opt(secs).unwrap()
        }
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    /// European autumn switch: +01:00 -> +00:00 at 01:00 UTC
    fn fall_back() -> Arc<dyn Zone> {
        Arc::new(DstZone {
            switch: utc(2024, 10, 27, 1, 0, 0),
            before: 3_600,
            after: 0,
        })
    }

    /// European spring switch: +00:00 -> +01:00 at 01:00 UTC
    fn spring_forward() -> Arc<dyn Zone> {
        Arc::new(DstZone {
            switch: utc(2024, 3, 31, 1, 0, 0),
            before: 0,
            after: 3_600,
        })
    }

    #[test]
    fn test_unit_codes() {
        assert_eq!("S".parse(), Ok(RotationUnit::Seconds));
        assert_eq!("m".parse(), Ok(RotationUnit::Minutes));
        assert_eq!("hourly".parse(), Ok(RotationUnit::Hours));
        assert_eq!(" d ".parse(), Ok(RotationUnit::Days));
        assert_eq!("midnight".parse(), Ok(RotationUnit::Midnight));
        assert_eq!("W0".parse(), Ok(RotationUnit::Weekly(Weekday::Mon)));
        assert_eq!("w6".parse(), Ok(RotationUnit::Weekly(Weekday::Sun)));
        assert!("W7".parse::<RotationUnit>().is_err());
        assert!("fortnightly".parse::<RotationUnit>().is_err());

        for unit in ["S", "M", "H", "D", "MIDNIGHT", "W3"] {
            assert_eq!(unit.parse::<RotationUnit>().unwrap().to_string(), unit);
        }
    }

    #[test]
    fn test_zero_magnitude_is_one() {
        assert_eq!(RotationInterval::new(RotationUnit::Hours, 0).magnitude, 1);
        assert_eq!(
            RotationInterval::new(RotationUnit::Minutes, 3).length(),
            TimeDelta::minutes(3)
        );
    }

    #[test]
    fn test_fixed_units_add_interval() {
        let base = utc(2024, 3, 1, 12, 34, 56);
        let clock = RotationClock::utc(RotationInterval::new(RotationUnit::Seconds, 10));
        assert_eq!(clock.compute_rollover(base), base + TimeDelta::seconds(10));

        let clock = RotationClock::utc(RotationInterval::new(RotationUnit::Hours, 2));
        assert_eq!(clock.compute_rollover(base), utc(2024, 3, 1, 14, 34, 56));

        let clock = RotationClock::utc(RotationInterval::new(RotationUnit::Days, 1));
        assert_eq!(clock.compute_rollover(base), utc(2024, 3, 2, 12, 34, 56));
    }

    #[test]
    fn test_daily_rollover_across_fall_back_is_an_hour_later() {
        let base = utc(2024, 10, 26, 10, 0, 0);
        let clock = RotationClock::new(RotationInterval::default(), fall_back());

        let unadjusted = base + TimeDelta::days(1);
        let rollover = clock.compute_rollover(base);
        assert_eq!(rollover - unadjusted, TimeDelta::seconds(3_600));
        // Same wall-clock time of day as the base
        assert_eq!(clock.local_time(rollover).time(), clock.local_time(base).time());
    }

    #[test]
    fn test_daily_rollover_across_spring_forward_is_an_hour_earlier() {
        let base = utc(2024, 3, 30, 10, 0, 0);
        let clock = RotationClock::new(RotationInterval::default(), spring_forward());

        let unadjusted = base + TimeDelta::days(1);
        assert_eq!(
            clock.compute_rollover(base) - unadjusted,
            TimeDelta::seconds(-3_600)
        );
    }

    #[test]
    fn test_utc_mode_never_adjusts() {
        let base = utc(2024, 10, 26, 10, 0, 0);
        let clock = RotationClock::utc(RotationInterval::default());
        assert_eq!(clock.compute_rollover(base), base + TimeDelta::days(1));
    }

    #[test]
    fn test_hourly_units_ignore_dst() {
        let base = utc(2024, 10, 27, 0, 30, 0);
        let clock =
            RotationClock::new(RotationInterval::new(RotationUnit::Hours, 1), fall_back());
        assert_eq!(clock.compute_rollover(base), base + TimeDelta::hours(1));
    }

    #[test]
    fn test_midnight_rollover() {
        let clock = RotationClock::utc(RotationInterval::new(RotationUnit::Midnight, 1));
        let base = utc(2024, 3, 1, 12, 34, 56);
        assert_eq!(clock.compute_rollover(base), utc(2024, 3, 2, 0, 0, 0));
        // Exactly at midnight waits for the next one
        assert_eq!(
            clock.compute_rollover(utc(2024, 3, 2, 0, 0, 0)),
            utc(2024, 3, 3, 0, 0, 0)
        );

        let clock = RotationClock::utc(RotationInterval::new(RotationUnit::Midnight, 2));
        assert_eq!(clock.compute_rollover(base), utc(2024, 3, 3, 0, 0, 0));
    }

    #[test]
    fn test_midnight_follows_zone_wall_clock() {
        let plus_two = FixedOffset::east_opt(2 * 3_600).unwrap();
        let clock = RotationClock::new(
            RotationInterval::new(RotationUnit::Midnight, 1),
            Arc::new(plus_two),
        );
        // 01:30 on 2 March local
        let base = utc(2024, 3, 1, 23, 30, 0);
        assert_eq!(clock.compute_rollover(base), utc(2024, 3, 2, 22, 0, 0));
    }

    #[test]
    fn test_midnight_across_fall_back_lands_on_wall_midnight() {
        let clock = RotationClock::new(
            RotationInterval::new(RotationUnit::Midnight, 2),
            fall_back(),
        );
        // Noon on 26 October at +01:00
        let base = utc(2024, 10, 26, 11, 0, 0);
        let rollover = clock.compute_rollover(base);
        // Midnight starting 28 October is 00:00 UTC once the offset is +00:00
        assert_eq!(rollover, utc(2024, 10, 28, 0, 0, 0));
        assert_eq!(
            clock.local_time(rollover),
            NaiveDateTime::parse_from_str("2024-10-28 00:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
        );
    }

    #[test]
    fn test_weekly_rollover_starts_the_weekday() {
        // 2024-03-01 is a Friday
        let base = utc(2024, 3, 1, 9, 0, 0);
        let weekly = |day| RotationClock::utc(RotationInterval::new(RotationUnit::Weekly(day), 1));

        assert_eq!(
            weekly(Weekday::Mon).compute_rollover(base),
            utc(2024, 3, 4, 0, 0, 0)
        );
        assert_eq!(
            weekly(Weekday::Sat).compute_rollover(base),
            utc(2024, 3, 2, 0, 0, 0)
        );
        // Already inside Friday: next Friday
        assert_eq!(
            weekly(Weekday::Fri).compute_rollover(base),
            utc(2024, 3, 8, 0, 0, 0)
        );

        let fortnightly = RotationClock::utc(RotationInterval::new(
            RotationUnit::Weekly(Weekday::Mon),
            2,
        ));
        assert_eq!(fortnightly.compute_rollover(base), utc(2024, 3, 11, 0, 0, 0));
    }

    #[test]
    fn test_next_rollover_skips_missed_intervals() {
        let clock = RotationClock::utc(RotationInterval::new(RotationUnit::Hours, 1));
        let anchor = utc(2024, 3, 1, 0, 0, 0);

        assert_eq!(
            clock.next_rollover(anchor, utc(2024, 3, 1, 0, 30, 0)),
            utc(2024, 3, 1, 1, 0, 0)
        );
        assert_eq!(
            clock.next_rollover(anchor, utc(2024, 3, 1, 5, 30, 0)),
            utc(2024, 3, 1, 6, 0, 0)
        );
        // A rollover equal to now is not in the future
        assert_eq!(
            clock.next_rollover(anchor, utc(2024, 3, 1, 6, 0, 0)),
            utc(2024, 3, 1, 7, 0, 0)
        );
    }

    #[test]
    fn test_next_rollover_keeps_wall_clock_across_dst() {
        let clock = RotationClock::new(RotationInterval::default(), fall_back());
        let anchor = utc(2024, 10, 24, 10, 0, 0);
        let next = clock.next_rollover(anchor, utc(2024, 10, 28, 12, 0, 0));

        assert!(next > utc(2024, 10, 28, 12, 0, 0));
        assert_eq!(clock.local_time(next).time(), clock.local_time(anchor).time());
    }

    #[test]
    fn test_interval_start() {
        let clock = RotationClock::utc(RotationInterval::new(RotationUnit::Hours, 1));
        let rollover = utc(2024, 3, 1, 6, 0, 0);
        assert_eq!(
            clock.interval_start(rollover, rollover),
            utc(2024, 3, 1, 5, 0, 0)
        );
    }

    #[test]
    fn test_interval_start_across_fall_back() {
        let clock = RotationClock::new(
            RotationInterval::new(RotationUnit::Midnight, 1),
            fall_back(),
        );
        let rollover = utc(2024, 10, 28, 0, 0, 0);
        let start = clock.interval_start(rollover, rollover);

        // The day that just ended began at local midnight, 23:00 UTC the day before
        assert_eq!(start, utc(2024, 10, 26, 23, 0, 0));
        assert_eq!(
            clock.local_time(start).format("%Y%m%dT%H%M%S").to_string(),
            "20241027T000000"
        );
    }

    #[test]
    fn test_oversized_interval_saturates_instead_of_overflowing() {
        let base = utc(2024, 3, 1, 12, 0, 0);
        let units = [
            RotationUnit::Days,
            RotationUnit::Midnight,
            RotationUnit::Weekly(Weekday::Mon),
        ];
        for unit in units {
            let clock = RotationClock::new(RotationInterval::new(unit, u32::MAX), fall_back());

            let rollover = clock.compute_rollover(base);
            assert!(rollover > base);
            assert_eq!(clock.next_rollover(base, base + TimeDelta::days(1)), rollover);
            assert!(clock.interval_start(rollover, base) < rollover);
        }
    }

    #[test]
    fn test_max_magnitude_fits_the_interval_cap() {
        assert_eq!(RotationInterval::max_magnitude(RotationUnit::Days), 36_600);
        let weekly = RotationUnit::Weekly(Weekday::Fri);
        let longest = RotationInterval::new(weekly, RotationInterval::max_magnitude(weekly));
        assert!(longest.length().num_seconds() <= MAX_INTERVAL_SECONDS);
    }
}
