use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureTrigger {
    Auto,
    Manual,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CapturePhase {
    Idle,
    Tracking { consecutive_in_oval: u32 },
    Countdown { remaining: u32 },
    Stabilizing,
    Captured { trigger: CaptureTrigger },
}

impl CapturePhase {
    pub fn transition(&self, in_oval: bool, config: &CaptureConfig) -> (CapturePhase, CaptureAction) {
        match self {
            CapturePhase::Tracking {
                consecutive_in_oval,
            } => {
                if !in_oval {
                    return (
                        CapturePhase::Tracking {
                            consecutive_in_oval: 0,
                        },
                        CaptureAction::Continue,
                    );
                }

                let new_count = consecutive_in_oval + 1;
                if new_count < config.stability_frames {
                    return (
                        CapturePhase::Tracking {
                            consecutive_in_oval: new_count,
                        },
                        CaptureAction::Continue,
                    );
                }

                match config.countdown_steps {
                    Some(steps) if steps > 0 => (
                        CapturePhase::Countdown { remaining: steps },
                        CaptureAction::StartCountdown(steps),
                    ),
                    _ => (
                        CapturePhase::Stabilizing,
                        CaptureAction::ScheduleCapture(config.settle_delay),
                    ),
                }
            }

            // 倒计时/稳定期间暂停检测，避免重复触发
            other => (other.clone(), CaptureAction::Ignored),
        }
    }

    pub fn is_auto_capturing(&self) -> bool {
        matches!(
            self,
            CapturePhase::Countdown { .. } | CapturePhase::Stabilizing
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CaptureAction {
    Continue,
    /// 当前阶段不接受该事件
    Ignored,
    StartCountdown(u32),
    CountdownStep(u32),
    /// 等待 settle 时长后调用 `on_settle_elapsed`
    ScheduleCapture(Duration),
    Fire(CaptureTrigger),
}

#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub stability_frames: u32,
    pub settle_delay: Duration,
    pub countdown_steps: Option<u32>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            stability_frames: 20,
            settle_delay: Duration::from_millis(300),
            countdown_steps: None,
        }
    }
}

impl CaptureConfig {
    pub fn with_countdown() -> Self {
        Self {
            countdown_steps: Some(3),
            ..Default::default()
        }
    }
}

/// 给 UI 的状态快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureState {
    pub consecutive_in_oval_frames: u32,
    pub auto_capturing: bool,
    pub countdown: Option<u32>,
    pub captured: bool,
}

pub struct CaptureStateMachine {
    phase: CapturePhase,
    config: CaptureConfig,
    tick_counter: u64,
}

impl CaptureStateMachine {
    pub fn new() -> Self {
        Self::with_config(CaptureConfig::default())
    }

    pub fn with_config(config: CaptureConfig) -> Self {
        Self {
            phase: CapturePhase::Idle,
            config,
            tick_counter: 0,
        }
    }

    /// 摄像头流就绪
    pub fn start(&mut self) {
        self.phase = CapturePhase::Tracking {
            consecutive_in_oval: 0,
        };
        self.tick_counter = 0;
    }

    pub fn on_detection(&mut self, in_oval: bool) -> CaptureAction {
        self.tick_counter += 1;

        let (new_phase, action) = self.phase.transition(in_oval, &self.config);
        self.phase = new_phase;
        action
    }

    /// 检测节拍出现断档时清零，避免计数被错误累积
    pub fn reset_streak(&mut self) {
        if let CapturePhase::Tracking { .. } = self.phase {
            self.phase = CapturePhase::Tracking {
                consecutive_in_oval: 0,
            };
        }
    }

    pub fn on_countdown_tick(&mut self) -> CaptureAction {
        match self.phase {
            CapturePhase::Countdown { remaining } => {
                let next = remaining.saturating_sub(1);
                if next == 0 {
                    self.fire(CaptureTrigger::Auto)
                } else {
                    self.phase = CapturePhase::Countdown { remaining: next };
                    CaptureAction::CountdownStep(next)
                }
            }
            _ => CaptureAction::Ignored,
        }
    }

    pub fn on_settle_elapsed(&mut self) -> CaptureAction {
        match self.phase {
            CapturePhase::Stabilizing => self.fire(CaptureTrigger::Auto),
            _ => CaptureAction::Ignored,
        }
    }

    /// 手动拍照，跳过稳定帧要求；自动抓拍进行中时不重复触发
    pub fn manual_capture(&mut self) -> CaptureAction {
        if !self.accepts_manual_capture() {
            return CaptureAction::Ignored;
        }
        self.fire(CaptureTrigger::Manual)
    }

    pub fn accepts_manual_capture(&self) -> bool {
        !self.phase.is_auto_capturing() && !self.is_captured()
    }

    /// 下一次 `on_settle_elapsed` 会触发抓拍
    pub fn settle_will_fire(&self) -> bool {
        matches!(self.phase, CapturePhase::Stabilizing)
    }

    /// 下一次 `on_countdown_tick` 会触发抓拍
    pub fn countdown_will_fire(&self) -> bool {
        matches!(self.phase, CapturePhase::Countdown { remaining } if remaining <= 1)
    }

    fn fire(&mut self, trigger: CaptureTrigger) -> CaptureAction {
        self.phase = CapturePhase::Captured { trigger };
        CaptureAction::Fire(trigger)
    }

    pub fn current_phase(&self) -> &CapturePhase {
        &self.phase
    }

    pub fn is_captured(&self) -> bool {
        matches!(self.phase, CapturePhase::Captured { .. })
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    pub fn snapshot(&self) -> CaptureState {
        let consecutive_in_oval_frames = match self.phase {
            CapturePhase::Tracking {
                consecutive_in_oval,
            } => consecutive_in_oval,
            CapturePhase::Countdown { .. } | CapturePhase::Stabilizing => {
                self.config.stability_frames
            }
            _ => 0,
        };
        let countdown = match self.phase {
            CapturePhase::Countdown { remaining } => Some(remaining),
            _ => None,
        };

        CaptureState {
            consecutive_in_oval_frames,
            auto_capturing: self.phase.is_auto_capturing(),
            countdown,
            captured: self.is_captured(),
        }
    }

    pub fn reset(&mut self) {
        self.phase = CapturePhase::Idle;
        self.tick_counter = 0;
    }
}

impl Default for CaptureStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(config: CaptureConfig) -> CaptureStateMachine {
        let mut sm = CaptureStateMachine::with_config(config);
        sm.start();
        sm
    }

    #[test]
    fn test_idle_ignores_detections() {
        let mut sm = CaptureStateMachine::new();
        assert_eq!(sm.on_detection(true), CaptureAction::Ignored);
        assert_eq!(sm.current_phase(), &CapturePhase::Idle);
    }

    #[test]
    fn test_threshold_boundary() {
        let mut sm = started(CaptureConfig::default());

        for _ in 0..19 {
            assert_eq!(sm.on_detection(true), CaptureAction::Continue);
        }
        assert_eq!(sm.snapshot().consecutive_in_oval_frames, 19);
        assert!(!sm.snapshot().auto_capturing);

        let action = sm.on_detection(true);
        assert_eq!(
            action,
            CaptureAction::ScheduleCapture(Duration::from_millis(300))
        );
        assert!(sm.snapshot().auto_capturing);

        assert_eq!(sm.on_settle_elapsed(), CaptureAction::Fire(CaptureTrigger::Auto));
        assert!(sm.is_captured());
    }

    #[test]
    fn test_false_tick_resets_streak() {
        let mut sm = started(CaptureConfig::default());

        // tick 1..=9 在框内，tick 10 出框
        for _ in 1..10 {
            sm.on_detection(true);
        }
        assert_eq!(sm.on_detection(false), CaptureAction::Continue);
        assert_eq!(sm.snapshot().consecutive_in_oval_frames, 0);

        // tick 11..=29：19 次不触发
        for _ in 11..30 {
            assert_eq!(sm.on_detection(true), CaptureAction::Continue);
        }
        // tick 30 触发
        assert!(matches!(
            sm.on_detection(true),
            CaptureAction::ScheduleCapture(_)
        ));
        assert_eq!(sm.tick_count(), 30);
    }

    #[test]
    fn test_detection_paused_while_stabilizing() {
        let mut sm = started(CaptureConfig {
            stability_frames: 2,
            ..Default::default()
        });
        sm.on_detection(true);
        sm.on_detection(true);

        assert_eq!(sm.on_detection(false), CaptureAction::Ignored);
        assert_eq!(sm.current_phase(), &CapturePhase::Stabilizing);
    }

    #[test]
    fn test_countdown_fires_once_at_zero() {
        let mut sm = started(CaptureConfig {
            stability_frames: 1,
            ..CaptureConfig::with_countdown()
        });

        assert_eq!(sm.on_detection(true), CaptureAction::StartCountdown(3));
        assert_eq!(sm.snapshot().countdown, Some(3));
        assert_eq!(sm.on_detection(true), CaptureAction::Ignored);

        assert_eq!(sm.on_countdown_tick(), CaptureAction::CountdownStep(2));
        assert!(!sm.countdown_will_fire());
        assert_eq!(sm.on_countdown_tick(), CaptureAction::CountdownStep(1));
        assert!(sm.countdown_will_fire());
        assert!(!sm.settle_will_fire());
        assert_eq!(sm.on_countdown_tick(), CaptureAction::Fire(CaptureTrigger::Auto));
        assert_eq!(sm.on_countdown_tick(), CaptureAction::Ignored);
    }

    #[test]
    fn test_manual_capture_skips_stability() {
        let mut sm = started(CaptureConfig::default());
        sm.on_detection(true);

        assert_eq!(sm.manual_capture(), CaptureAction::Fire(CaptureTrigger::Manual));
        assert_eq!(
            sm.current_phase(),
            &CapturePhase::Captured {
                trigger: CaptureTrigger::Manual
            }
        );
        assert_eq!(sm.manual_capture(), CaptureAction::Ignored);
        assert_eq!(sm.on_detection(true), CaptureAction::Ignored);
    }

    #[test]
    fn test_manual_capture_does_not_double_fire() {
        let mut sm = started(CaptureConfig {
            stability_frames: 1,
            ..Default::default()
        });
        sm.on_detection(true);

        assert!(!sm.accepts_manual_capture());
        assert!(sm.settle_will_fire());
        assert_eq!(sm.manual_capture(), CaptureAction::Ignored);
        assert_eq!(sm.on_settle_elapsed(), CaptureAction::Fire(CaptureTrigger::Auto));
        assert_eq!(sm.on_settle_elapsed(), CaptureAction::Ignored);
    }

    #[test]
    fn test_reset_streak_and_restart() {
        let mut sm = started(CaptureConfig::default());
        for _ in 0..15 {
            sm.on_detection(true);
        }
        sm.reset_streak();
        assert_eq!(sm.snapshot().consecutive_in_oval_frames, 0);

        sm.manual_capture();
        sm.reset();
        assert_eq!(sm.current_phase(), &CapturePhase::Idle);
        sm.start();
        assert_eq!(
            sm.current_phase(),
            &CapturePhase::Tracking {
                consecutive_in_oval: 0
            }
        );
    }
}
