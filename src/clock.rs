use heapless::String;
use ufmt::uwrite;

use crate::timer::Millis;

const SECS_PER_DAY: i64 = 86_400;

/// Wall-clock time of day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl TimeOfDay {
    /// Splits seconds since local midnight into a time of day
    pub fn from_seconds_of_day(seconds: u32) -> Self {
        let seconds = seconds % SECS_PER_DAY as u32;
        Self {
            hour: (seconds / 3600) as u8,
            minute: ((seconds % 3600) / 60) as u8,
            second: (seconds % 60) as u8,
        }
    }

    /// Gets the time in the HH:MM format
    pub fn format_hhmm(&self) -> String<5> {
        let mut out: String<5> = String::new();
        // Five characters always fit
        let _ = uwrite!(
            out,
            "{}:{}",
            Self::pad_number(self.hour).as_str(),
            Self::pad_number(self.minute).as_str()
        );
        out
    }

    /// Pads a number with a zero before it if < 10
    /// NOTE: Only supports values <100
    /// param num: number to be padded
    /// returns: String with formatted value
    fn pad_number(num: u8) -> String<2> {
        let mut padded = String::new();
        let _ = if num < 10 {
            uwrite!(padded, "0{}", num)
        } else {
            uwrite!(padded, "{}", num)
        };
        padded
    }
}

/// Source of wall-clock time that may not be available yet
pub trait ClockSource {
    /// Local time at monotonic instant `now`, None while unsynchronized
    fn time_of_day(&mut self, now: Millis) -> Option<TimeOfDay>;
}

/// Software wall clock.
///
/// Something outside the dashboard (NTP, an RTC, a host link) hands it a Unix
/// time once; from then on it advances with the monotonic counter. Intervals
/// between syncs must stay below one counter period (~49 days).
#[derive(Debug, Clone, Copy)]
pub struct SyncedClock {
    offset_secs: i32,
    anchor: Option<(u64, Millis)>,
}

impl SyncedClock {
    /// param offset_secs: local offset from UTC, daylight saving included
    pub fn new(offset_secs: i32) -> Self {
        Self {
            offset_secs,
            anchor: None,
        }
    }

    /// Anchors the clock
    /// param unix_secs: UTC seconds since the Unix epoch
    /// param now: monotonic time at which `unix_secs` was valid
    pub fn sync(&mut self, unix_secs: u64, now: Millis) {
        info!("Clock synchronized");
        self.anchor = Some((unix_secs, now));
    }

    pub fn is_synced(&self) -> bool {
        self.anchor.is_some()
    }
}

impl ClockSource for SyncedClock {
    fn time_of_day(&mut self, now: Millis) -> Option<TimeOfDay> {
        let (unix_secs, at) = self.anchor?;
        let elapsed = (now.wrapping_sub(at) / 1000) as i64;
        let local = unix_secs as i64 + elapsed + self.offset_secs as i64;
        Some(TimeOfDay::from_seconds_of_day(
            local.rem_euclid(SECS_PER_DAY) as u32,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_zero_padding() {
        let time = TimeOfDay {
            hour: 7,
            minute: 5,
            second: 59,
        };
        assert_eq!(time.format_hhmm().as_str(), "07:05");

        let time = TimeOfDay::from_seconds_of_day(23 * 3600 + 59 * 60);
        assert_eq!(time.format_hhmm().as_str(), "23:59");
    }

    #[test]
    fn unsynced_clock_is_unavailable() {
        let mut clock = SyncedClock::new(7200);
        assert!(!clock.is_synced());
        assert_eq!(clock.time_of_day(1_000), None);
    }

    #[test]
    fn applies_offset_and_elapsed_time() {
        // 2024-01-01 22:30:00 UTC
        let unix = 1_704_148_200;
        let mut clock = SyncedClock::new(7200);
        clock.sync(unix, 10_000);

        let time = clock.time_of_day(10_000).unwrap();
        assert_eq!((time.hour, time.minute), (0, 30));

        let later = clock.time_of_day(10_000 + 90_000).unwrap();
        assert_eq!((later.hour, later.minute, later.second), (0, 31, 30));
    }

    #[test]
    fn negative_offsets_wrap_to_previous_day() {
        let mut clock = SyncedClock::new(-3600);
        clock.sync(0, 0);
        let time = clock.time_of_day(0).unwrap();
        assert_eq!((time.hour, time.minute), (23, 0));
    }

    #[test]
    fn keeps_time_across_counter_rollover() {
        let mut clock = SyncedClock::new(0);
        let anchor = u32::MAX - 999;
        clock.sync(0, anchor);
        let time = clock.time_of_day(anchor.wrapping_add(61_000)).unwrap();
        assert_eq!((time.minute, time.second), (1, 1));
    }
}
