//! 手动 / 幻灯片模式与速度档位

/// 自动切换间隔档位（毫秒），下标越小越快
pub const SPEED_LADDER_MS: [u32; 8] = [500, 1000, 2000, 3000, 5000, 10000, 15000, 30000];
/// 开机默认档位（5 秒）
pub const DEFAULT_SPEED_INDEX: usize = 4;

/// 档位对应的显示文字
pub const SPEED_LABELS: [&str; 8] = ["0.5s", "1s", "2s", "3s", "5s", "10s", "15s", "30s"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    #[default]
    Manual,
    Slideshow,
}

impl Mode {
    pub fn toggled(self) -> Mode {
        match self {
            Mode::Manual => Mode::Slideshow,
            Mode::Slideshow => Mode::Manual,
        }
    }
}

/// 调速方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpeedDirection {
    /// 间隔变短
    Faster,
    /// 间隔变长
    Slower,
}

/// 一次调速的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpeedChange {
    pub direction: SpeedDirection,
    pub index: usize,
    /// 已在档位尽头，本次调整没有生效
    pub limit_hit: bool,
}

#[derive(Debug)]
pub struct Slideshow {
    mode: Mode,
    speed_index: usize,
    last_advance: u64,
}

impl Default for Slideshow {
    fn default() -> Self {
        Self::new()
    }
}

impl Slideshow {
    pub const fn new() -> Self {
        Self {
            mode: Mode::Manual,
            speed_index: DEFAULT_SPEED_INDEX,
            last_advance: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn speed_index(&self) -> usize {
        self.speed_index
    }

    pub fn interval_ms(&self) -> u32 {
        SPEED_LADDER_MS[self.speed_index]
    }

    pub fn toggle_mode(&mut self, now: u64) -> Mode {
        self.mode = self.mode.toggled();
        self.last_advance = now;
        info!("mode -> {}", self.mode);
        self.mode
    }

    pub fn faster(&mut self) -> SpeedChange {
        let limit_hit = self.speed_index == 0;
        if !limit_hit {
            self.speed_index -= 1;
        }
        self.report(SpeedDirection::Faster, limit_hit)
    }

    pub fn slower(&mut self) -> SpeedChange {
        let limit_hit = self.speed_index == SPEED_LADDER_MS.len() - 1;
        if !limit_hit {
            self.speed_index += 1;
        }
        self.report(SpeedDirection::Slower, limit_hit)
    }

    fn report(&self, direction: SpeedDirection, limit_hit: bool) -> SpeedChange {
        if limit_hit {
            info!("speed limit reached at {} ms", self.interval_ms());
        } else {
            info!("slideshow interval {} ms", self.interval_ms());
        }
        SpeedChange {
            direction,
            index: self.speed_index,
            limit_hit,
        }
    }

    /// 重新开始计时
    pub fn restart_timer(&mut self, now: u64) {
        self.last_advance = now;
    }

    /// 幻灯片模式下间隔已到则返回 `true` 并重新计时
    pub fn due(&mut self, now: u64) -> bool {
        if self.mode != Mode::Slideshow {
            return false;
        }
        if now.saturating_sub(self.last_advance) > u64::from(self.interval_ms()) {
            self.last_advance = now;
            return true;
        }
        false
    }
}
