use defmt::info;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex as EmbassyMutex;
use embassy_time::Timer;
use esp_hal::gpio::{Level, Output, OutputConfig, OutputPin};

/// 心跳 LED
pub static LED: EmbassyMutex<CriticalSectionRawMutex, Option<Output<'static>>> =
    EmbassyMutex::new(None);

pub async fn init(led: impl OutputPin + 'static) {
    let led = Output::new(led, Level::Low, OutputConfig::default());
    LED.lock().await.replace(led);
    info!("LED init done");
}

pub async fn toggle() {
    if let Some(led) = LED.lock().await.as_mut() {
        led.toggle();
    }
}

/// 开机闪烁 `times` 次
pub async fn flash(times: usize) {
    for _ in 0..times {
        set(true).await;
        Timer::after_millis(100).await;
        set(false).await;
        Timer::after_millis(100).await;
    }
}

async fn set(on: bool) {
    if let Some(led) = LED.lock().await.as_mut() {
        led.set_level(Level::from(on));
    }
}
