use defmt::info;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex as EmbassyMutex;
use esp_hal::gpio::{Input, InputConfig, InputPin, Pull};

/// BOOT 按键（GPIO0，低电平有效）
pub static BOOT_BUTTON: EmbassyMutex<CriticalSectionRawMutex, Option<Input<'static>>> =
    EmbassyMutex::new(None);

pub async fn init(button: impl InputPin + 'static) {
    let button = Input::new(button, InputConfig::default().with_pull(Pull::Up));
    BOOT_BUTTON.lock().await.replace(button);
    info!("Boot button initialized")
}

/// 读取原始电平，消抖由手势状态机完成
pub async fn is_pressed() -> bool {
    BOOT_BUTTON
        .lock()
        .await
        .as_ref()
        .is_some_and(|button| button.is_low())
}
