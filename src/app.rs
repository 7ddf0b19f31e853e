//! 应用状态与主循环节拍
//!
//! 所有可变状态集中在 [`App`] 中，由固件主循环每个周期调用一次
//! [`App::tick`]，时间和按键电平都由调用方注入。

use crate::catalog::Catalog;
use crate::decode::JpegDecoder;
use crate::embedded::EmbeddedImage;
use crate::gesture::{Gesture, GestureMachine};
use crate::overlay::{OverlayUpdate, Overlays, SpeedIndicator};
use crate::slideshow::{Mode, Slideshow};
use crate::storage::Storage;
use crate::ui::StatusScreen;

/// SD 卡插拔检测间隔
pub const CARD_CHECK_INTERVAL_MS: u64 = 3000;
/// 心跳 LED 翻转间隔
pub const HEARTBEAT_MS: u64 = 1000;
/// 主循环周期
pub const LOOP_PERIOD_MS: u64 = 10;

/// 显示能力
///
/// 固件用 ST7789 实现，测试里用记录调用的假屏幕。
pub trait Screen {
    /// 整帧显示一张 135x240 的图片
    fn show_raster(&mut self, pixels: &[u16]);
    /// 全屏状态画面
    fn show_status(&mut self, status: StatusScreen);
    /// 在当前画面上叠加速度指示
    fn show_speed(&mut self, indicator: &SpeedIndicator);
}

pub struct App<S, J> {
    storage: S,
    decoder: J,
    embedded: &'static [EmbeddedImage],
    catalog: Catalog,
    gesture: GestureMachine,
    slideshow: Slideshow,
    overlays: Overlays,
    card_present: bool,
    last_card_check: u64,
}

impl<S, J> App<S, J>
where
    S: Storage,
    J: JpegDecoder,
{
    pub fn new(storage: S, decoder: J, embedded: &'static [EmbeddedImage]) -> Self {
        Self {
            storage,
            decoder,
            embedded,
            catalog: Catalog::new(),
            gesture: GestureMachine::new(),
            slideshow: Slideshow::new(),
            overlays: Overlays::new(),
            card_present: false,
            last_card_check: 0,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn slideshow(&self) -> &Slideshow {
        &self.slideshow
    }

    pub fn overlays(&self) -> &Overlays {
        &self.overlays
    }

    pub fn card_present(&self) -> bool {
        self.card_present
    }

    #[cfg(test)]
    pub(crate) fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// 开机扫描：内置图片、挂载 SD 卡并扫描根目录，然后显示第一张
    pub fn boot(&mut self, now: u64, screen: &mut impl Screen) {
        self.catalog.scan_embedded(self.embedded);

        self.card_present = self.storage.mount();
        if self.card_present {
            info!("SD card mounted");
            screen.show_status(StatusScreen::Scanning);
            if self
                .catalog
                .scan_directory(&mut self.storage, &mut self.decoder)
                .is_err()
            {
                warn!("failed to list SD card root");
            }
        } else {
            warn!("no SD card, continuing with embedded images");
        }

        self.log_catalog();
        self.slideshow.restart_timer(now);
        self.last_card_check = now;
        self.show_current(screen);
        info!(
            "ready: manual mode, interval {} ms",
            self.slideshow.interval_ms()
        );
    }

    /// 主循环的一个节拍
    ///
    /// 顺序固定：插拔检测、叠加层到期、自动切换、手势轮询、手势处理。
    pub fn tick(&mut self, now: u64, button_pressed: bool, screen: &mut impl Screen) {
        if now.saturating_sub(self.last_card_check) >= CARD_CHECK_INTERVAL_MS {
            self.last_card_check = now;
            self.check_card(now, screen);
        }

        if let Some(update) = self.overlays.poll(now) {
            self.on_overlay(now, update, screen);
        }

        if self.catalog.len() > 1
            && self.overlays.banner().is_none()
            && self.slideshow.due(now)
        {
            self.advance(screen);
        }

        if let Some(gesture) = self.gesture.poll(now, button_pressed) {
            self.on_gesture(now, gesture, screen);
        }
    }

    fn check_card(&mut self, now: u64, screen: &mut impl Screen) {
        let present = self.storage.mount();
        if present == self.card_present {
            return;
        }
        self.card_present = present;
        self.overlays.clear();

        if present {
            info!("SD card inserted, rescanning");
            screen.show_status(StatusScreen::Scanning);
            if self
                .catalog
                .rebuild_on_card_inserted(&mut self.storage, &mut self.decoder)
                .is_err()
            {
                warn!("failed to list SD card root");
            }
        } else {
            self.catalog.rebuild_on_card_removed();
        }

        self.log_catalog();
        self.slideshow.restart_timer(now);
        self.show_current(screen);
    }

    fn on_overlay(&mut self, now: u64, update: OverlayUpdate, screen: &mut impl Screen) {
        match update {
            OverlayUpdate::BannerExpired => {
                self.slideshow.restart_timer(now);
                self.show_current(screen);
            }
            OverlayUpdate::SpeedExpired | OverlayUpdate::BlinkOff => self.show_current(screen),
            OverlayUpdate::BlinkOn => {
                if let Some(indicator) = self.overlays.speed() {
                    screen.show_speed(indicator);
                }
            }
        }
    }

    fn on_gesture(&mut self, now: u64, gesture: Gesture, screen: &mut impl Screen) {
        debug!("gesture {}", gesture);
        match (self.slideshow.mode(), gesture) {
            (_, Gesture::Hold) => {
                let mode = self.slideshow.toggle_mode(now);
                self.overlays.show_banner(now, mode);
                screen.show_status(StatusScreen::for_mode(mode));
            }
            // 手动模式下双击和单击一样只前进一张
            (Mode::Manual, Gesture::SingleClick | Gesture::DoubleClick) => self.advance(screen),
            (Mode::Slideshow, click) => {
                let change = if click == Gesture::DoubleClick {
                    self.slideshow.faster()
                } else {
                    self.slideshow.slower()
                };
                // 横幅还在时先擦掉，速度面板要叠在图片上
                if self.overlays.banner().is_some() {
                    self.show_current(screen);
                }
                let indicator = self.overlays.show_speed(now, change);
                screen.show_speed(&indicator);
            }
        }
    }

    fn advance(&mut self, screen: &mut impl Screen) {
        if self.catalog.next().is_none() {
            return;
        }
        self.show_current(screen);
        // 新图片盖住了速度面板，显示相位内要补画
        if let Some(indicator) = self.overlays.visible_speed() {
            screen.show_speed(indicator);
        }
    }

    /// 重绘当前图片，目录为空时显示对应的状态画面
    fn show_current(&self, screen: &mut impl Screen) {
        match self.catalog.current() {
            Some(image) => {
                info!(
                    "showing {}/{}: {}",
                    self.catalog.current_index() + 1,
                    self.catalog.len(),
                    image.name()
                );
                screen.show_raster(image.pixels());
            }
            None if self.card_present => screen.show_status(StatusScreen::NoImages),
            None => screen.show_status(StatusScreen::NoCard),
        }
    }

    fn log_catalog(&self) {
        info!("catalog: {} images", self.catalog.len());
        for (i, image) in self.catalog.iter().enumerate() {
            info!("  [{}] {} {}x{}", i, image.name(), image.width(), image.height());
        }
    }
}
