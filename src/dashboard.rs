//! The control loop: one call to [`Dashboard::tick`] per loop iteration.
//!
//! A tick checks the button once, asks the scheduler what is due, refreshes
//! the clock and/or samples the sensors, and issues exactly one render
//! command. Nothing in here blocks beyond what the drivers themselves do, and
//! no failure escapes a tick: every fault degrades to "keep the last value".

use crate::calibration::{self, BaselineStorage, CalibrationStore};
use crate::clock::{ClockSource, TimeOfDay};
use crate::preferences::Preferences;
use crate::rendering::{self, RenderSurface};
use crate::screen::{RenderCommand, Screen, ScreenState};
use crate::sensors::{ClimateSensor, GasSensor, MetricEngine, Snapshot};
use crate::timer::{Millis, Scheduler};

/// Outcome of the boot sequence, one flag per collaborator
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BootReport {
    pub storage: bool,
    pub climate: bool,
    pub gas: bool,
    pub calibration: bool,
}

/// Mutable state of the control loop
#[derive(Debug, Clone, Copy)]
pub struct EngineState {
    pub scheduler: Scheduler,
    pub screen: ScreenState,
    pub snapshot: Snapshot,
    pub time: Option<TimeOfDay>,
}

impl EngineState {
    pub fn new(preferences: &Preferences) -> Self {
        Self {
            scheduler: Scheduler::new(preferences.cadence()),
            screen: ScreenState::new(),
            snapshot: Snapshot::default(),
            time: None,
        }
    }
}

pub struct Dashboard<C, G, K, S> {
    preferences: Preferences,
    engine: MetricEngine<C, G>,
    clock: K,
    surface: S,
    state: EngineState,
}

impl<C, G, K, S> Dashboard<C, G, K, S>
where
    C: ClimateSensor,
    G: GasSensor,
    K: ClockSource,
    S: RenderSurface,
{
    pub fn new(preferences: Preferences, climate: C, gas: G, clock: K, surface: S) -> Self {
        Self {
            preferences,
            engine: MetricEngine::new(climate, gas),
            clock,
            surface,
            state: EngineState::new(&preferences),
        }
    }

    /// Brings up storage and sensors, restores the gas baseline and reports
    /// each step as a status line. Leaves the surface cleared.
    pub fn boot<T: BaselineStorage>(&mut self, mut storage: T) -> BootReport {
        let mut report = BootReport::default();

        report.storage = calibration::init_storage(&mut storage, self.preferences.format_storage_if_failed);
        self.status(if report.storage { "Storage OK" } else { "Storage FAIL" }, report.storage);

        report.climate = self
            .engine
            .climate_mut()
            .begin(self.preferences.climate_address)
            .is_ok();
        self.status(if report.climate { "Climate sensor OK" } else { "Climate sensor FAIL" }, report.climate);

        report.gas = self.engine.gas_mut().begin().is_ok();
        self.status(if report.gas { "Gas sensor OK" } else { "Gas sensor FAIL" }, report.gas);

        let mut store = CalibrationStore::new(storage);
        let line = match store.load() {
            Some(baseline) => {
                report.calibration = calibration::apply(&baseline, self.engine.gas_mut());
                if report.calibration {
                    "Calibration found"
                } else {
                    "Calibration rejected"
                }
            }
            None => "Calibration not found",
        };
        self.status(line, report.calibration);

        info!("Boot finished: {:?}", report);
        if self.surface.clear().is_err() {
            warn!("Render surface rejected clear");
        }
        report
    }

    fn status(&mut self, line: &str, ok: bool) {
        if ok {
            info!("{}", line);
        } else {
            warn!("{}", line);
        }
        if self.surface.draw_status(line, ok).is_err() {
            warn!("Render surface rejected status line");
        }
    }

    /// Runs one control loop iteration
    /// param now: monotonic time
    /// param button_high: current level of the active-low button
    /// returns the render command that was executed
    pub fn tick(&mut self, now: Millis, button_high: bool) -> RenderCommand {
        let mut flags = self.state.scheduler.tick(now);

        if flags.redraw_clock {
            match self.clock.time_of_day(now) {
                Some(time) => self.state.time = Some(time),
                None => {
                    debug!("Clock unavailable, skipping clock redraw");
                    flags.redraw_clock = false;
                }
            }
        }

        if flags.redraw_sensors {
            self.state.snapshot = self.engine.sample(&self.state.snapshot);
        }

        let command = self.state.screen.on_tick(button_high, flags);
        self.draw(command);
        command
    }

    fn draw(&mut self, command: RenderCommand) {
        let result = rendering::render(
            command,
            self.state.screen.active(),
            &self.state.snapshot,
            self.state.time.as_ref(),
            &mut self.surface,
        );
        if result.is_err() {
            warn!("Render surface rejected {:?}", command);
        }
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn active_screen(&self) -> Screen {
        self.state.screen.active()
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.state.snapshot
    }

    pub fn clock_mut(&mut self) -> &mut K {
        &mut self.clock
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn engine_mut(&mut self) -> &mut MetricEngine<C, G> {
        &mut self.engine
    }
}
