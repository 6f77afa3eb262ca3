use core::fmt::Write;

use embedded_graphics::mono_font::ascii::{FONT_10X20, FONT_6X10, FONT_9X18};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use heapless::String;

use crate::clock::TimeOfDay;
use crate::metrics::AqiBand;
use crate::screen::{RenderCommand, Screen};
use crate::sensors::Snapshot;

/// Value slots of the two screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Field {
    Temperature,
    Humidity,
    Pressure,
    AirQuality,
    Eco2,
    Tvoc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Color {
    White,
    Red,
    Green,
    GreenYellow,
    Yellow,
    Orange,
    Blue,
    Magenta,
}

impl From<AqiBand> for Color {
    fn from(band: AqiBand) -> Self {
        match band {
            AqiBand::Good => Color::Green,
            AqiBand::Fair => Color::GreenYellow,
            AqiBand::Moderate => Color::Yellow,
            AqiBand::Poor => Color::Orange,
            AqiBand::Severe => Color::Red,
        }
    }
}

impl From<Color> for Rgb565 {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Rgb565::WHITE,
            Color::Red => Rgb565::RED,
            Color::Green => Rgb565::GREEN,
            Color::GreenYellow => Rgb565::new(21, 63, 5),
            Color::Yellow => Rgb565::YELLOW,
            Color::Orange => Rgb565::new(31, 41, 0),
            Color::Blue => Rgb565::BLUE,
            Color::Magenta => Rgb565::MAGENTA,
        }
    }
}

/// Something the dashboard can draw on. Layout is up to the implementation.
pub trait RenderSurface {
    type Error;

    fn clear(&mut self) -> Result<(), Self::Error>;

    /// Draws a value with one decimal, followed by `unit` in `color`
    fn draw_value(&mut self, field: Field, value: f32, unit: &str, color: Color) -> Result<(), Self::Error>;

    fn draw_clock(&mut self, time: &TimeOfDay) -> Result<(), Self::Error>;

    /// Appends a boot status line, green when `ok`, red otherwise
    fn draw_status(&mut self, line: &str, ok: bool) -> Result<(), Self::Error>;
}

/// Executes a render command
/// param command: what the screen state machine asked for
/// param screen: the active screen
/// param snapshot: latest readings
/// param time: latest wall-clock time, None if the clock never synced
/// param surface: where to draw
pub fn render<S: RenderSurface>(
    command: RenderCommand,
    screen: Screen,
    snapshot: &Snapshot,
    time: Option<&TimeOfDay>,
    surface: &mut S,
) -> Result<(), S::Error> {
    let (clock, sensors) = match command {
        RenderCommand::NoOp => return Ok(()),
        RenderCommand::PartialRedraw(fields) => (fields.clock, fields.sensors),
        RenderCommand::FullClearAndRedraw => {
            surface.clear()?;
            (true, true)
        }
    };

    // The detail view has no clock
    if clock && screen == Screen::Dashboard {
        if let Some(time) = time {
            surface.draw_clock(time)?;
        }
    }

    if sensors {
        render_sensors(screen, snapshot, surface)?;
    }
    Ok(())
}

/// Draws the sensor block of the active screen
fn render_sensors<S: RenderSurface>(screen: Screen, snapshot: &Snapshot, surface: &mut S) -> Result<(), S::Error> {
    match screen {
        Screen::Dashboard => {
            let climate = &snapshot.climate;
            surface.draw_value(Field::Temperature, climate.temperature, " C", Color::Red)?;
            surface.draw_value(Field::Humidity, climate.humidity, " %", Color::Blue)?;
            surface.draw_value(Field::Pressure, climate.pressure, " mmHg", Color::Green)?;
            surface.draw_value(
                Field::AirQuality,
                snapshot.metrics.air_quality_index,
                " IAQ",
                snapshot.metrics.band().into(),
            )
        }
        Screen::DetailView => {
            let gas = &snapshot.gas.reading;
            surface.draw_value(Field::Eco2, gas.eco2 as f32, " eCO2", Color::Blue)?;
            surface.draw_value(Field::Tvoc, gas.tvoc as f32, " TVOC", Color::Magenta)
        }
    }
}

const VALUE_FONT: &MonoFont = &FONT_9X18;
const CLOCK_FONT: &MonoFont = &FONT_10X20;
const STATUS_FONT: &MonoFont = &FONT_6X10;
/// Characters per value slot; shorter text is padded so stale glyphs get overwritten
const SLOT_CHARS: usize = 12;

/// Render surface on top of any RGB565 `embedded-graphics` target, laid out
/// for a 240x135 landscape panel.
pub struct GraphicsSurface<D> {
    display: D,
    status_row: i32,
}

impl<D> GraphicsSurface<D>
where
    D: DrawTarget<Color = Rgb565>,
{
    pub fn new(display: D) -> Self {
        Self {
            display,
            status_row: 0,
        }
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    fn slot(field: Field) -> Point {
        match field {
            Field::Temperature | Field::Eco2 => Point::new(8, 50),
            Field::Humidity | Field::Tvoc => Point::new(8, 85),
            Field::Pressure => Point::new(124, 50),
            Field::AirQuality => Point::new(124, 85),
        }
    }

    fn style(font: &'static MonoFont<'static>, color: Rgb565) -> MonoTextStyle<'static, Rgb565> {
        MonoTextStyleBuilder::new()
            .font(font)
            .text_color(color)
            .background_color(Rgb565::BLACK)
            .build()
    }
}

impl<D> RenderSurface for GraphicsSurface<D>
where
    D: DrawTarget<Color = Rgb565>,
{
    type Error = D::Error;

    fn clear(&mut self) -> Result<(), D::Error> {
        self.status_row = 0;
        self.display.clear(Rgb565::BLACK)
    }

    fn draw_value(&mut self, field: Field, value: f32, unit: &str, color: Color) -> Result<(), D::Error> {
        let mut number: String<SLOT_CHARS> = String::new();
        let _ = write!(number, "{:.1}", value);

        let mut tail: String<SLOT_CHARS> = String::new();
        let _ = tail.push_str(unit);
        while number.len() + tail.len() < SLOT_CHARS && tail.push(' ').is_ok() {}

        let next = Text::with_baseline(
            &number,
            Self::slot(field),
            Self::style(VALUE_FONT, Rgb565::WHITE),
            Baseline::Top,
        )
        .draw(&mut self.display)?;
        Text::with_baseline(&tail, next, Self::style(VALUE_FONT, color.into()), Baseline::Top)
            .draw(&mut self.display)?;
        Ok(())
    }

    fn draw_clock(&mut self, time: &TimeOfDay) -> Result<(), D::Error> {
        Text::with_baseline(
            &time.format_hhmm(),
            Point::new(95, 10),
            Self::style(CLOCK_FONT, Rgb565::GREEN),
            Baseline::Top,
        )
        .draw(&mut self.display)?;
        Ok(())
    }

    fn draw_status(&mut self, line: &str, ok: bool) -> Result<(), D::Error> {
        let color = if ok { Rgb565::GREEN } else { Rgb565::RED };
        let origin = Point::new(4, 4 + self.status_row * 12);
        Text::with_baseline(line, origin, Self::style(STATUS_FONT, color), Baseline::Top)
            .draw(&mut self.display)?;
        self.status_row += 1;
        Ok(())
    }
}
