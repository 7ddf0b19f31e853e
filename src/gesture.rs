//! 按键手势状态机
//!
//! 每个 tick 轮询一次按键电平，识别单击、双击和长按。
//! 单击要等双击窗口结束才提交，所以单击有最多 `DOUBLE_CLICK_MS` 的延迟。

/// 长按阈值
pub const HOLD_MS: u64 = 2000;
/// 两次松开之间小于该间隔视为双击
pub const DOUBLE_CLICK_MS: u64 = 1200;
/// 电平变化后在此时间内的再次变化视为抖动
pub const DEBOUNCE_MS: u64 = 30;

/// 识别出的手势
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gesture {
    SingleClick,
    DoubleClick,
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    /// 按下中；`pending_click` 是上一次尚未提交的单击时间
    Pressed { since: u64, pending_click: Option<u64> },
    /// 长按已触发，等待松开
    HoldConfirmed,
    AwaitingDoubleClick { clicked_at: u64 },
}

#[derive(Debug)]
pub struct GestureMachine {
    state: State,
    /// 消抖后的电平，`true` 表示按下
    pressed: bool,
    last_edge: Option<u64>,
}

impl Default for GestureMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureMachine {
    pub const fn new() -> Self {
        Self {
            state: State::Idle,
            pressed: false,
            last_edge: None,
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// 是否有单击在等待双击窗口
    pub fn has_pending_click(&self) -> bool {
        matches!(
            self.state,
            State::AwaitingDoubleClick { .. }
                | State::Pressed {
                    pending_click: Some(_),
                    ..
                }
        )
    }

    /// 轮询一次：先处理双击超时，再处理电平边沿
    ///
    /// `raw_pressed` 为当前按键是否按下（低电平有效的引脚取反后传入）。
    pub fn poll(&mut self, now: u64, raw_pressed: bool) -> Option<Gesture> {
        let mut event = None;

        if let State::AwaitingDoubleClick { clicked_at } = self.state {
            if now.saturating_sub(clicked_at) >= DOUBLE_CLICK_MS {
                self.state = State::Idle;
                event = Some(Gesture::SingleClick);
            }
        }

        let edge = self.debounce(now, raw_pressed);

        match (self.state, edge) {
            (State::Idle, Some(true)) => {
                self.state = State::Pressed {
                    since: now,
                    pending_click: None,
                };
            }
            (State::AwaitingDoubleClick { clicked_at }, Some(true)) => {
                self.state = State::Pressed {
                    since: now,
                    pending_click: Some(clicked_at),
                };
            }
            (State::Pressed { since, pending_click }, None) => {
                if self.pressed && now.saturating_sub(since) > HOLD_MS {
                    if pending_click.is_some() {
                        debug!("pending click cancelled by hold");
                    }
                    self.state = State::HoldConfirmed;
                    event = Some(Gesture::Hold);
                }
            }
            (State::Pressed { pending_click, .. }, Some(false)) => match pending_click {
                Some(clicked_at) if now.saturating_sub(clicked_at) < DOUBLE_CLICK_MS => {
                    self.state = State::Idle;
                    event = Some(Gesture::DoubleClick);
                }
                Some(_) => {
                    // 第二次点击来得太晚：先提交第一次，第二次重新等待
                    self.state = State::AwaitingDoubleClick { clicked_at: now };
                    event = Some(Gesture::SingleClick);
                }
                None => {
                    self.state = State::AwaitingDoubleClick { clicked_at: now };
                }
            },
            (State::HoldConfirmed, Some(false)) => {
                self.state = State::Idle;
            }
            _ => {}
        }

        event
    }

    /// 返回消抖后的边沿：`Some(true)` 按下，`Some(false)` 松开
    fn debounce(&mut self, now: u64, raw_pressed: bool) -> Option<bool> {
        if raw_pressed == self.pressed {
            return None;
        }
        if self
            .last_edge
            .is_some_and(|t| now.saturating_sub(t) < DEBOUNCE_MS)
        {
            return None;
        }
        self.pressed = raw_pressed;
        self.last_edge = Some(now);
        Some(raw_pressed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    const TICK: u64 = 10;

    /// 以 10ms 为周期模拟，`presses` 为按下区间 [start, end)
    fn simulate(presses: &[(u64, u64)], until: u64) -> Vec<(u64, Gesture)> {
        let mut machine = GestureMachine::new();
        let mut events = Vec::new();
        let mut now = 0;
        while now <= until {
            let level = presses.iter().any(|&(start, end)| now >= start && now < end);
            if let Some(gesture) = machine.poll(now, level) {
                events.push((now, gesture));
            }
            now += TICK;
        }
        events
    }

    fn kinds(events: &[(u64, Gesture)]) -> Vec<Gesture> {
        events.iter().map(|&(_, g)| g).collect()
    }

    #[test]
    fn short_press_becomes_single_click_after_window() {
        let events = simulate(&[(100, 200)], 5000);
        assert_eq!(events, [(200 + DOUBLE_CLICK_MS, Gesture::SingleClick)]);
    }

    #[test]
    fn two_quick_presses_are_one_double_click() {
        let events = simulate(&[(100, 200), (500, 600)], 5000);
        assert_eq!(events, [(600, Gesture::DoubleClick)]);
    }

    #[test]
    fn double_click_window_is_measured_between_releases() {
        // 第二次按下在窗口内，但松开时已超过窗口
        let events = simulate(&[(100, 200), (1000, 1500)], 5000);
        assert_eq!(
            events,
            [
                (1500, Gesture::SingleClick),
                (1500 + DOUBLE_CLICK_MS, Gesture::SingleClick)
            ]
        );
    }

    #[test]
    fn hold_fires_once_and_release_is_silent() {
        let events = simulate(&[(100, 4000)], 8000);
        assert_eq!(events, [(100 + HOLD_MS + TICK, Gesture::Hold)]);
    }

    #[test]
    fn hold_cancels_pending_click() {
        let events = simulate(&[(100, 200), (400, 3000)], 8000);
        assert_eq!(kinds(&events), [Gesture::Hold]);
    }

    #[test]
    fn separate_clicks_stay_single() {
        let events = simulate(&[(100, 200), (2000, 2100)], 6000);
        assert_eq!(kinds(&events), [Gesture::SingleClick, Gesture::SingleClick]);
        assert_eq!(events[0].0, 1400);
        assert_eq!(events[1].0, 2100 + DOUBLE_CLICK_MS);
    }

    #[test]
    fn bounce_is_ignored() {
        let mut machine = GestureMachine::new();
        assert_eq!(machine.poll(0, true), None);
        assert!(machine.is_pressed());
        // 抖动：按下后 10ms 出现的松开被忽略
        assert_eq!(machine.poll(10, false), None);
        assert!(machine.is_pressed());
        assert_eq!(machine.poll(20, true), None);
        assert_eq!(machine.poll(100, false), None);
        assert!(!machine.is_pressed());
        assert!(machine.has_pending_click());
        assert_eq!(machine.poll(110, true), None);
        assert_eq!(machine.poll(1299, false), None);
        assert_eq!(machine.poll(1300, false), Some(Gesture::SingleClick));
        assert!(!machine.has_pending_click());
    }

    #[test]
    fn timeout_and_new_press_in_same_tick() {
        let mut machine = GestureMachine::new();
        machine.poll(0, true);
        machine.poll(100, false);
        // 超时与新的按下同时发生：单击不会丢
        assert_eq!(machine.poll(1300, true), Some(Gesture::SingleClick));
        assert!(machine.is_pressed());
        assert_eq!(machine.poll(1400, false), None);
        assert_eq!(machine.poll(2600, false), Some(Gesture::SingleClick));
    }
}
