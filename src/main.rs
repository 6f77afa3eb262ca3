#![no_std]
#![no_main]

use air_dashboard::board::{Bme680Climate, FlashStorage, Sgp30Gas};
use air_dashboard::clock::SyncedClock;
use air_dashboard::rendering::GraphicsSurface;
use air_dashboard::{Dashboard, Preferences};
use bsp::entry;
use defmt::*;
use defmt_rtt as _;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal_bus::spi::ExclusiveDevice;
use mipidsi::interface::SpiInterface;
use mipidsi::models::ST7789;
use mipidsi::options::{ColorInversion, Orientation, Rotation};
use mipidsi::Builder;
use panic_probe as _;
use rp_pico::hal::Timer;

// Provide an alias for our BSP so we can switch targets quickly.
// Uncomment the BSP you included in Cargo.toml, the rest of the code does not need to change.
use rp_pico as bsp;

use bsp::hal::{
    clocks::{init_clocks_and_plls, Clock},
    pac,
    watchdog::Watchdog,
};
use rp_pico::hal;
use rp_pico::hal::fugit::RateExtU32;
use rp_pico::hal::gpio::{FunctionI2C, FunctionSpi, Pin, PullUp};

const LOOP_DELAY_MS: u32 = 10;

#[entry]
fn main() -> ! {
    info!("Air dashboard starting");
    // Grab our singleton objects
    let mut pac = unwrap!(pac::Peripherals::take());

    // Set up the watchdog driver - needed by the clock setup code
    let mut watchdog = Watchdog::new(pac.WATCHDOG);

    // Configure the clocks
    //
    // The default is to generate a 125 MHz system clock
    let clocks = unwrap!(init_clocks_and_plls(
        rp_pico::XOSC_CRYSTAL_FREQ,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .ok());

    // The single-cycle I/O block controls our GPIO pins
    let sio = hal::Sio::new(pac.SIO);

    // Set the pins up according to their function on this particular board
    let pins = rp_pico::Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );

    let mut timer = Timer::new(pac.TIMER, &mut pac.RESETS, &clocks);

    // Climate sensor on I2C0
    let sda: Pin<_, FunctionI2C, PullUp> = pins.gpio4.reconfigure();
    let scl: Pin<_, FunctionI2C, PullUp> = pins.gpio5.reconfigure();
    let climate_bus = hal::I2C::i2c0(pac.I2C0, sda, scl, 100.kHz(), &mut pac.RESETS, &clocks.system_clock);

    // Gas sensor on I2C1
    let sda: Pin<_, FunctionI2C, PullUp> = pins.gpio2.reconfigure();
    let scl: Pin<_, FunctionI2C, PullUp> = pins.gpio3.reconfigure();
    let gas_bus = hal::I2C::i2c1(pac.I2C1, sda, scl, 100.kHz(), &mut pac.RESETS, &clocks.system_clock);

    // Set up the ST7789 panel
    let sclk = pins.gpio10.into_function::<FunctionSpi>();
    let mosi = pins.gpio11.into_function::<FunctionSpi>();
    let spi_bus = hal::spi::Spi::<_, _, _, 8>::new(pac.SPI1, (mosi, sclk)).init(
        &mut pac.RESETS,
        clocks.peripheral_clock.freq(),
        32.MHz(),
        embedded_hal::spi::MODE_0,
    );
    let cs = pins.gpio9.into_push_pull_output();
    let dc = pins.gpio8.into_push_pull_output();
    let rst = pins.gpio12.into_push_pull_output();
    let mut backlight = pins.gpio13.into_push_pull_output();
    backlight.set_high().ok();

    let spi = unwrap!(ExclusiveDevice::new_no_delay(spi_bus, cs).ok());
    let mut spi_buffer = [0u8; 512];
    let di = SpiInterface::new(spi, dc, &mut spi_buffer);
    let display = unwrap!(Builder::new(ST7789, di)
        .display_size(135, 240)
        .display_offset(52, 40)
        .invert_colors(ColorInversion::Inverted)
        .orientation(Orientation::new().rotate(Rotation::Deg90))
        .reset_pin(rst)
        .init(&mut timer)
        .ok());

    // Set up the screen button
    let mut button = pins.gpio16.into_pull_up_input();

    let preferences = Preferences::default();
    // The board has no time source of its own. The clock stays blank until a
    // host link calls `SyncedClock::sync`; until then the clock job draws nothing.
    let mut dashboard = Dashboard::new(
        preferences,
        Bme680Climate::new(climate_bus, timer),
        Sgp30Gas::new(gas_bus, timer),
        SyncedClock::new(preferences.local_offset_secs()),
        GraphicsSurface::new(display),
    );

    let report = dashboard.boot(FlashStorage::new());
    info!("Boot report: {:?}", report);

    // Leave the status lines up for a moment
    timer.delay_ms(2000);

    info!("Air dashboard ready");

    loop {
        let now = (timer.get_counter().ticks() / 1000) as u32;
        // A read error counts as released
        let level = button.is_high().unwrap_or(true);

        let command = dashboard.tick(now, level);
        debug!("command: {:?}", command);

        timer.delay_ms(LOOP_DELAY_MS);
    }
}
