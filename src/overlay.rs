//! 非阻塞叠加层：模式横幅与速度指示
//!
//! 每个叠加层记录自己的开始时间，主循环每个 tick 调用 [`Overlays::poll`]，
//! 到期后由调用方重绘当前图片把叠加层擦掉。

use crate::slideshow::{Mode, SPEED_LABELS, SPEED_LADDER_MS, SpeedChange, SpeedDirection};

/// 模式横幅显示时长
pub const MODE_BANNER_MS: u64 = 2000;
/// 普通速度指示显示时长
pub const SPEED_INDICATOR_MS: u64 = 1500;
/// 到达档位尽头时闪烁的半周期
pub const BLINK_PHASE_MS: u64 = 300;
/// 到达档位尽头时闪烁次数
pub const LIMIT_BLINKS: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModeBanner {
    pub started: u64,
    pub mode: Mode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpeedIndicator {
    pub started: u64,
    pub direction: SpeedDirection,
    pub index: usize,
    pub limit_hit: bool,
    /// 已显示的闪烁次数
    pub blinks: u8,
}

impl SpeedIndicator {
    pub fn new(started: u64, change: SpeedChange) -> Self {
        Self {
            started,
            direction: change.direction,
            index: change.index,
            limit_hit: change.limit_hit,
            blinks: if change.limit_hit { 1 } else { 0 },
        }
    }

    pub fn duration(&self) -> u64 {
        if self.limit_hit {
            2 * BLINK_PHASE_MS * u64::from(LIMIT_BLINKS)
        } else {
            SPEED_INDICATOR_MS
        }
    }

    /// 闪烁时奇数半周期隐藏
    pub fn visible_at(&self, now: u64) -> bool {
        !self.limit_hit || (now.saturating_sub(self.started) / BLINK_PHASE_MS) % 2 == 0
    }

    pub fn label(&self) -> &'static str {
        SPEED_LABELS[self.index]
    }

    pub fn interval_ms(&self) -> u32 {
        SPEED_LADDER_MS[self.index]
    }
}

/// `poll` 的结果，调用方据此重绘
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OverlayUpdate {
    BannerExpired,
    SpeedExpired,
    BlinkOn,
    BlinkOff,
}

#[derive(Debug, Default)]
pub struct Overlays {
    banner: Option<ModeBanner>,
    speed: Option<SpeedIndicator>,
    speed_visible: bool,
}

impl Overlays {
    pub const fn new() -> Self {
        Self {
            banner: None,
            speed: None,
            speed_visible: false,
        }
    }

    pub fn banner(&self) -> Option<&ModeBanner> {
        self.banner.as_ref()
    }

    pub fn speed(&self) -> Option<&SpeedIndicator> {
        self.speed.as_ref()
    }

    /// 当前处于显示相位的速度指示
    pub fn visible_speed(&self) -> Option<&SpeedIndicator> {
        self.speed.as_ref().filter(|_| self.speed_visible)
    }

    pub fn is_empty(&self) -> bool {
        self.banner.is_none() && self.speed.is_none()
    }

    /// 显示模式横幅，替换正在显示的速度指示
    pub fn show_banner(&mut self, now: u64, mode: Mode) -> ModeBanner {
        let banner = ModeBanner { started: now, mode };
        self.speed = None;
        self.banner = Some(banner);
        banner
    }

    /// 显示速度指示，替换正在显示的模式横幅
    pub fn show_speed(&mut self, now: u64, change: SpeedChange) -> SpeedIndicator {
        let indicator = SpeedIndicator::new(now, change);
        self.banner = None;
        self.speed = Some(indicator);
        self.speed_visible = true;
        indicator
    }

    pub fn clear(&mut self) {
        self.banner = None;
        self.speed = None;
        self.speed_visible = false;
    }

    /// 检查到期与闪烁相位，每次最多返回一个变化
    pub fn poll(&mut self, now: u64) -> Option<OverlayUpdate> {
        if let Some(banner) = self.banner {
            if now.saturating_sub(banner.started) >= MODE_BANNER_MS {
                self.banner = None;
                return Some(OverlayUpdate::BannerExpired);
            }
        }

        let speed = self.speed.as_mut()?;
        if now.saturating_sub(speed.started) >= speed.duration() {
            self.speed = None;
            self.speed_visible = false;
            return Some(OverlayUpdate::SpeedExpired);
        }

        let visible = speed.visible_at(now);
        if visible == self.speed_visible {
            return None;
        }
        self.speed_visible = visible;
        if visible {
            speed.blinks += 1;
            Some(OverlayUpdate::BlinkOn)
        } else {
            Some(OverlayUpdate::BlinkOff)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn change(limit_hit: bool) -> SpeedChange {
        SpeedChange {
            direction: SpeedDirection::Slower,
            index: 7,
            limit_hit,
        }
    }

    #[test]
    fn banner_lasts_exactly_two_seconds() {
        let mut overlays = Overlays::new();
        overlays.show_banner(1000, Mode::Slideshow);
        assert_eq!(overlays.poll(1000), None);
        assert_eq!(overlays.poll(2999), None);
        assert!(overlays.banner().is_some());
        assert_eq!(overlays.poll(3000), Some(OverlayUpdate::BannerExpired));
        assert!(overlays.is_empty());
        assert_eq!(overlays.poll(3010), None);
    }

    #[test]
    fn speed_indicator_expires_without_blinking() {
        let mut overlays = Overlays::new();
        overlays.show_speed(0, change(false));
        let mut updates = Vec::new();
        for now in (0..=2000).step_by(10) {
            if let Some(update) = overlays.poll(now) {
                updates.push((now, update));
            }
        }
        assert_eq!(updates, [(SPEED_INDICATOR_MS, OverlayUpdate::SpeedExpired)]);
    }

    #[test]
    fn limit_indicator_blinks_twice() {
        let mut overlays = Overlays::new();
        overlays.show_speed(0, change(true));
        let mut updates = Vec::new();
        for now in (0..=2000).step_by(10) {
            if let Some(update) = overlays.poll(now) {
                updates.push((now, update));
            }
        }
        assert_eq!(
            updates,
            [
                (300, OverlayUpdate::BlinkOff),
                (600, OverlayUpdate::BlinkOn),
                (900, OverlayUpdate::BlinkOff),
                (1200, OverlayUpdate::SpeedExpired),
            ]
        );
    }

    #[test]
    fn blink_count_tracks_visible_phases() {
        let mut overlays = Overlays::new();
        overlays.show_speed(0, change(true));
        assert_eq!(overlays.speed().unwrap().blinks, 1);
        overlays.poll(300);
        assert!(overlays.visible_speed().is_none());
        overlays.poll(600);
        assert_eq!(overlays.speed().unwrap().blinks, LIMIT_BLINKS);
        assert_eq!(overlays.speed().unwrap().label(), "30s");
    }

    #[test]
    fn newest_overlay_replaces_the_other() {
        let mut overlays = Overlays::new();
        overlays.show_banner(0, Mode::Manual);
        overlays.show_speed(100, change(false));
        assert!(overlays.banner().is_none());
        overlays.show_banner(200, Mode::Slideshow);
        assert!(overlays.speed().is_none());
        assert_eq!(overlays.banner().unwrap().mode, Mode::Slideshow);
    }
}
