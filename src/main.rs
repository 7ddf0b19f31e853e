#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]

use core::cell::RefCell;
use defmt::info;
use embassy_executor::Spawner;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::{Duration, Instant, Timer};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Level, Output, OutputConfig};
use esp_hal::timer::timg::TimerGroup;
use static_cell::StaticCell;
use {esp_backtrace as _, esp_println as _};

use esp_photo_frame::app::{App, HEARTBEAT_MS, LOOP_PERIOD_MS};
use esp_photo_frame::embedded::EMBEDDED_IMAGES;
use esp_photo_frame::jpeg::ZuneDecoder;
use esp_photo_frame::{DISPLAY_HEIGHT, DISPLAY_WIDTH};

mod button;
mod led;
mod screen;
mod sdcard;
mod spi;
mod st7789;

extern crate alloc;

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

static SD_BUS: StaticCell<sdcard::SdBus> = StaticCell::new();

#[esp_rtos::main]
async fn main(_spawner: Spawner) -> ! {
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    esp_alloc::heap_allocator!(#[unsafe(link_section = ".dram2_uninit")] size: 73744);
    // 解码缓冲和目录中的整帧图片都放在 PSRAM
    esp_alloc::psram_allocator!(peripherals.PSRAM, esp_hal::psram);

    let time_g0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(time_g0.timer0);

    info!("Embassy initialized!");

    led::init(peripherals.GPIO2).await;
    led::flash(3).await;

    button::init(peripherals.GPIO0).await;

    // LCD：SCK=12 MOSI=11 CS=10 DC=8 RST=9 BL=7
    let lcd_spi = spi::lcd_bus(peripherals.SPI2, peripherals.GPIO12, peripherals.GPIO11)
        .expect("failed to initialize LCD SPI");
    let mut lcd = st7789::ST7789::new(
        lcd_spi,
        peripherals.GPIO10,
        peripherals.GPIO8,
        Some(peripherals.GPIO9),
        DISPLAY_WIDTH as u16,
        DISPLAY_HEIGHT as u16,
    )
    .with_backlight(peripherals.GPIO7);
    lcd.init().expect("failed to initialize display");
    lcd.set_backlight(true);
    lcd.clear(Rgb565::BLACK).expect("failed to clear display");
    info!("Display initialized");

    // SD 卡：SCK=36 MOSI=35 MISO=37 CS=34
    let sd_spi = spi::sd_bus(
        peripherals.SPI3,
        peripherals.GPIO36,
        peripherals.GPIO35,
        peripherals.GPIO37,
    )
    .expect("failed to initialize SD SPI");
    let sd_bus = SD_BUS.init(Mutex::new(RefCell::new(sd_spi)));
    let sd_cs = Output::new(peripherals.GPIO34, Level::High, OutputConfig::default());
    let storage = sdcard::SdStorage::new(sd_bus, sd_cs);

    let mut screen = screen::LcdScreen::new(lcd);
    let mut app = App::new(storage, ZuneDecoder::new(), EMBEDDED_IMAGES);
    app.boot(Instant::now().as_millis(), &mut screen);

    let mut last_heartbeat = 0;
    loop {
        let now = Instant::now().as_millis();
        let pressed = button::is_pressed().await;
        app.tick(now, pressed, &mut screen);

        if now.saturating_sub(last_heartbeat) >= HEARTBEAT_MS {
            last_heartbeat = now;
            led::toggle().await;
        }
        Timer::after(Duration::from_millis(LOOP_PERIOD_MS)).await;
    }
}
