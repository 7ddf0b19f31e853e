use defmt::error;

use esp_photo_frame::app::Screen;
use esp_photo_frame::overlay::SpeedIndicator;
use esp_photo_frame::ui::{self, StatusScreen};

use crate::st7789::ST7789;

/// 把应用层的显示请求落到 ST7789 上
pub struct LcdScreen<'d> {
    lcd: ST7789<'d>,
}

impl<'d> LcdScreen<'d> {
    pub fn new(lcd: ST7789<'d>) -> Self {
        Self { lcd }
    }
}

impl Screen for LcdScreen<'_> {
    fn show_raster(&mut self, pixels: &[u16]) {
        if let Err(e) = self.lcd.write_frame(pixels) {
            error!("Failed to write frame: {}", e);
        }
    }

    fn show_status(&mut self, status: StatusScreen) {
        if let Err(e) = ui::draw_status(&mut self.lcd, status) {
            error!("Failed to draw status {}: {}", status, e);
        }
    }

    fn show_speed(&mut self, indicator: &SpeedIndicator) {
        if let Err(e) = ui::draw_speed(&mut self.lcd, indicator) {
            error!("Failed to draw speed indicator: {}", e);
        }
    }
}
