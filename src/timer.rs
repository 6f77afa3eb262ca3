//! Cadence gating for the control loop.
//!
//! Timestamps are milliseconds from a free-running monotonic counter that is
//! allowed to wrap; every comparison goes through `wrapping_sub`.

/// Monotonic milliseconds
pub type Millis = u32;

/// Refresh intervals of the two periodic jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Cadence {
    pub clock_interval_ms: Millis,
    pub sensor_interval_ms: Millis,
}

/// What a single tick asks the loop to do
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickFlags {
    pub redraw_clock: bool,
    pub redraw_sensors: bool,
}

impl TickFlags {
    pub fn any(&self) -> bool {
        self.redraw_clock || self.redraw_sensors
    }
}

/// One periodic job: fires on its first check, then whenever its interval has elapsed
#[derive(Debug, Clone, Copy)]
struct Interval {
    period: Millis,
    last: Millis,
    first: bool,
}

impl Interval {
    fn new(period: Millis) -> Self {
        Self {
            period,
            last: 0,
            first: true,
        }
    }

    /// Checks the job against `now`; a due job is rearmed from `now`, not from its ideal deadline
    fn poll(&mut self, now: Millis) -> bool {
        if self.first || now.wrapping_sub(self.last) >= self.period {
            self.first = false;
            self.last = now;
            true
        } else {
            false
        }
    }
}

/// Decides on every tick whether the clock and the sensors are due.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    clock: Interval,
    sensors: Interval,
}

impl Scheduler {
    pub fn new(cadence: Cadence) -> Self {
        Self {
            clock: Interval::new(cadence.clock_interval_ms),
            sensors: Interval::new(cadence.sensor_interval_ms),
        }
    }

    /// Advances the schedule to `now`
    /// param now: current monotonic time
    /// returns which periodic jobs are due
    pub fn tick(&mut self, now: Millis) -> TickFlags {
        TickFlags {
            redraw_clock: self.clock.poll(now),
            redraw_sensors: self.sensors.poll(now),
        }
    }

    /// Time of the last clock refresh, `None` before the first tick
    pub fn last_clock_refresh(&self) -> Option<Millis> {
        (!self.clock.first).then_some(self.clock.last)
    }

    /// Time of the last sensor sample, `None` before the first tick
    pub fn last_sensor_sample(&self) -> Option<Millis> {
        (!self.sensors.first).then_some(self.sensors.last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cadence() -> Cadence {
        Cadence {
            clock_interval_ms: 30_000,
            sensor_interval_ms: 5_000,
        }
    }

    #[test]
    fn first_tick_fires_everything() {
        let mut scheduler = Scheduler::new(cadence());
        assert_eq!(scheduler.last_sensor_sample(), None);

        let flags = scheduler.tick(0);
        assert!(flags.redraw_clock);
        assert!(flags.redraw_sensors);
        assert_eq!(scheduler.last_sensor_sample(), Some(0));
        assert_eq!(scheduler.last_clock_refresh(), Some(0));
    }

    #[test]
    fn sensors_follow_their_interval() {
        let mut scheduler = Scheduler::new(cadence());
        assert!(scheduler.tick(0).redraw_sensors);
        assert!(!scheduler.tick(4_999).redraw_sensors);

        let flags = scheduler.tick(5_000);
        assert!(flags.redraw_sensors);
        assert!(!flags.redraw_clock);
        assert_eq!(scheduler.last_sensor_sample(), Some(5_000));

        assert!(!scheduler.tick(9_999).redraw_sensors);
    }

    #[test]
    fn late_ticks_rearm_from_now() {
        let mut scheduler = Scheduler::new(cadence());
        scheduler.tick(0);
        assert!(scheduler.tick(7_300).redraw_sensors);
        // Next deadline is 12_300, not 10_000
        assert!(!scheduler.tick(12_299).redraw_sensors);
        assert!(scheduler.tick(12_300).redraw_sensors);
    }

    #[test]
    fn clock_refreshes_every_thirty_seconds() {
        let mut scheduler = Scheduler::new(cadence());
        scheduler.tick(1_000);
        assert!(!scheduler.tick(30_999).redraw_clock);
        assert!(scheduler.tick(31_000).redraw_clock);
    }

    #[test]
    fn survives_counter_rollover() {
        let mut scheduler = Scheduler::new(cadence());
        let start = u32::MAX - 100;
        scheduler.tick(start);

        assert!(!scheduler.tick(start.wrapping_add(4_999)).redraw_sensors);
        assert!(scheduler.tick(start.wrapping_add(5_000)).redraw_sensors);
    }

    proptest! {
        #[test]
        fn due_exactly_at_interval(start in any::<u32>(), interval in 1u32..100_000) {
            let mut scheduler = Scheduler::new(Cadence {
                clock_interval_ms: interval,
                sensor_interval_ms: interval,
            });
            scheduler.tick(start);

            let early = scheduler.tick(start.wrapping_add(interval - 1));
            prop_assert!(!early.any());

            let due = scheduler.tick(start.wrapping_add(interval));
            prop_assert!(due.redraw_clock && due.redraw_sensors);
        }
    }
}
