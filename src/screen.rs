//! Which view is on the display, and what has to be drawn on each tick.

use crate::timer::TickFlags;

/// The two layouts the button cycles through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Screen {
    /// Clock, climate readings and air-quality index
    Dashboard,
    /// Raw gas readings
    DetailView,
}

impl Screen {
    pub fn toggled(&self) -> Self {
        match self {
            Screen::Dashboard => Screen::DetailView,
            Screen::DetailView => Screen::Dashboard,
        }
    }
}

/// Regions a partial redraw has to overwrite
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RedrawFields {
    pub clock: bool,
    pub sensors: bool,
}

/// Exactly one of these is produced per tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RenderCommand {
    NoOp,
    /// Overwrite the listed regions in place, without clearing
    PartialRedraw(RedrawFields),
    /// Clear the surface and draw every field of the active screen
    FullClearAndRedraw,
}

/// Screen state, switched by falling edges of the active-low button
#[derive(Debug, Clone, Copy)]
pub struct ScreenState {
    active: Screen,
    last_button_high: bool,
}

impl Default for ScreenState {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenState {
    pub fn new() -> Self {
        Self {
            active: Screen::Dashboard,
            // Pulled up, so released
            last_button_high: true,
        }
    }

    pub fn active(&self) -> Screen {
        self.active
    }

    /// Feeds one tick of input into the state machine
    /// param button_high: current level of the button pin
    /// param flags: what the scheduler refreshed this tick
    /// returns the single render command for this tick
    pub fn on_tick(&mut self, button_high: bool, flags: TickFlags) -> RenderCommand {
        let pressed = self.last_button_high && !button_high;
        self.last_button_high = button_high;

        if pressed {
            self.active = self.active.toggled();
            info!("Screen switched to {:?}", self.active);
            return RenderCommand::FullClearAndRedraw;
        }

        if flags.any() {
            RenderCommand::PartialRedraw(RedrawFields {
                clock: flags.redraw_clock,
                sensors: flags.redraw_sensors,
            })
        } else {
            RenderCommand::NoOp
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDLE: TickFlags = TickFlags {
        redraw_clock: false,
        redraw_sensors: false,
    };

    #[test]
    fn starts_on_dashboard() {
        assert_eq!(ScreenState::new().active(), Screen::Dashboard);
    }

    #[test]
    fn one_press_is_one_toggle() {
        let mut screen = ScreenState::new();
        let commands: heapless::Vec<RenderCommand, 5> = [true, true, false, false, true]
            .iter()
            .map(|&level| screen.on_tick(level, IDLE))
            .collect();

        let toggles: heapless::Vec<usize, 5> = commands
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == RenderCommand::FullClearAndRedraw)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(toggles.as_slice(), &[2]);
        assert_eq!(screen.active(), Screen::DetailView);
    }

    #[test]
    fn second_press_returns_to_dashboard() {
        let mut screen = ScreenState::new();
        for level in [false, true, false] {
            screen.on_tick(level, IDLE);
        }
        assert_eq!(screen.active(), Screen::Dashboard);
    }

    #[test]
    fn rising_edge_does_nothing() {
        let mut screen = ScreenState::new();
        screen.on_tick(false, IDLE);
        assert_eq!(screen.on_tick(true, IDLE), RenderCommand::NoOp);
        assert_eq!(screen.active(), Screen::DetailView);
    }

    #[test]
    fn scheduler_flags_collapse_into_one_partial_redraw() {
        let mut screen = ScreenState::new();
        let both = TickFlags {
            redraw_clock: true,
            redraw_sensors: true,
        };
        assert_eq!(
            screen.on_tick(true, both),
            RenderCommand::PartialRedraw(RedrawFields {
                clock: true,
                sensors: true
            })
        );

        let sensors_only = TickFlags {
            redraw_clock: false,
            redraw_sensors: true,
        };
        assert_eq!(
            screen.on_tick(true, sensors_only),
            RenderCommand::PartialRedraw(RedrawFields {
                clock: false,
                sensors: true
            })
        );
        assert_eq!(screen.on_tick(true, IDLE), RenderCommand::NoOp);
    }

    #[test]
    fn toggle_wins_over_partial_redraw() {
        let mut screen = ScreenState::new();
        let flags = TickFlags {
            redraw_clock: true,
            redraw_sensors: true,
        };
        assert_eq!(screen.on_tick(false, flags), RenderCommand::FullClearAndRedraw);
    }
}
