//! 自拍引导会话

use std::sync::{Mutex, MutexGuard};

use flutter_rust_bridge::frb;
use log::{debug, info, warn};

use crate::face_guide::{
    CameraError, CameraSession, CaptureAction, CaptureConfig, CaptureState, CaptureTrigger, DetectionResult,
    DetectorConfig, Facing, Frame, FrameFeed, RawFrame,
};

const CAPTURE_JPEG_QUALITY: u8 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideProfile {
    /// 专用拍照引导：阈值更严格
    CaptureGuide,
    /// 常驻后台检测：阈值更宽松
    Background,
}

impl GuideProfile {
    fn config(self, countdown: bool) -> DetectorConfig {
        let mut config = match self {
            GuideProfile::CaptureGuide => DetectorConfig::capture_guide(),
            GuideProfile::Background => DetectorConfig::background(),
        };
        if countdown {
            config.capture.countdown_steps = CaptureConfig::with_countdown().countdown_steps;
        }
        config
    }
}

/// Dart 侧需要执行的动作
#[derive(Debug, Clone, PartialEq)]
pub enum GuideAction {
    Continue,
    Ignored,
    StartCountdown { remaining: u32 },
    CountdownStep { remaining: u32 },
    /// `delay_ms` 后调用 `settle_elapsed`
    ScheduleCapture { delay_ms: u64 },
    Fire { manual: bool },
}

impl From<CaptureAction> for GuideAction {
    fn from(action: CaptureAction) -> Self {
        match action {
            CaptureAction::Continue => GuideAction::Continue,
            CaptureAction::Ignored => GuideAction::Ignored,
            CaptureAction::StartCountdown(remaining) => GuideAction::StartCountdown { remaining },
            CaptureAction::CountdownStep(remaining) => GuideAction::CountdownStep { remaining },
            CaptureAction::ScheduleCapture(delay) => GuideAction::ScheduleCapture {
                delay_ms: delay.as_millis() as u64,
            },
            CaptureAction::Fire(trigger) => GuideAction::Fire {
                manual: trigger == CaptureTrigger::Manual,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct GuideFeedback {
    pub detection: DetectionResult,
    pub action: GuideAction,
    pub state: CaptureState,
}

#[derive(Debug, Clone)]
pub struct CaptureOutcome {
    pub action: GuideAction,
    pub state: CaptureState,
    /// 抓拍触发时的静帧 `data:image/jpeg;base64,...`
    pub captured_image: Option<String>,
}

struct Inner {
    camera: CameraSession<FrameFeed>,
    feed: FrameFeed,
    frames_received: u64,
}

/// 自拍引导会话
///
/// 预览帧由 Dart 推入；抓拍时先停流，再把静帧编码成 JPEG 返回。
///
/// ```dart
/// final session = FaceGuideSession.create(profile: GuideProfile.captureGuide, countdown: false);
/// final feedback = session.processFrame(width: w, height: h, rgba: bytes, timestampMs: ts);
/// showHint(feedback.detection.message);
/// ```
#[frb(opaque)]
pub struct FaceGuideSession {
    inner: Mutex<Inner>,
}

impl FaceGuideSession {
    #[frb(sync)]
    pub fn create(profile: GuideProfile, countdown: bool) -> Self {
        crate::init_logging();
        info!("📷 FaceGuideSession: created ({:?}, countdown={})", profile, countdown);

        let feed = FrameFeed::new();
        let mut camera = CameraSession::new(feed.clone(), profile.config(countdown));
        if let Err(e) = camera.start(Facing::User) {
            warn!("❌ Failed to start frame feed: {}", e);
        }
        Self {
            inner: Mutex::new(Inner {
                camera,
                feed,
                frames_received: 0,
            }),
        }
    }

    /// 处理一帧 RGBA 数据
    #[frb(sync)]
    pub fn process_frame(&self, width: u32, height: u32, rgba: Vec<u8>, timestamp_ms: u64) -> GuideFeedback {
        let mut inner = self.lock();
        let frame_number = inner.frames_received;
        inner.frames_received += 1;
        inner
            .feed
            .push(Frame::new(width, height, rgba, timestamp_ms, frame_number));
        Self::tick(&mut inner, timestamp_ms)
    }

    /// 处理一帧 YUV420 数据（Android 相机原始帧），平面不完整时按无画面处理
    #[frb(sync)]
    pub fn process_yuv_frame(
        &self,
        width: u32,
        height: u32,
        y_plane: Vec<u8>,
        u_plane: Vec<u8>,
        v_plane: Vec<u8>,
        timestamp_ms: u64,
        frame_number: u64,
    ) -> GuideFeedback {
        let raw = RawFrame {
            width,
            height,
            y_plane,
            u_plane,
            v_plane,
            timestamp_ms,
            frame_number,
        };
        let mut inner = self.lock();
        inner.frames_received += 1;
        match raw.to_rgba() {
            Some(frame) => {
                inner.feed.push(frame);
            }
            None => debug!("📭 Incomplete YUV frame {} ({}x{})", frame_number, width, height),
        }
        Self::tick(&mut inner, timestamp_ms)
    }

    /// 用户手动拍照；自动抓拍进行中或还没有画面时忽略
    #[frb(sync)]
    pub fn manual_capture(&self) -> CaptureOutcome {
        let mut inner = self.lock();
        let mut captured_image = None;
        let result = inner
            .camera
            .manual_capture(|frame, trigger| captured_image = encode_capture(&frame, trigger));
        Self::outcome(&inner, result, captured_image)
    }

    /// 倒计时走一步
    #[frb(sync)]
    pub fn countdown_tick(&self) -> CaptureOutcome {
        let mut inner = self.lock();
        let mut captured_image = None;
        let result = inner
            .camera
            .countdown_tick(|frame, trigger| captured_image = encode_capture(&frame, trigger));
        Self::outcome(&inner, result, captured_image)
    }

    /// `ScheduleCapture` 的等待结束
    #[frb(sync)]
    pub fn settle_elapsed(&self) -> CaptureOutcome {
        let mut inner = self.lock();
        let mut captured_image = None;
        let result = inner
            .camera
            .settle_elapsed(|frame, trigger| captured_image = encode_capture(&frame, trigger));
        Self::outcome(&inner, result, captured_image)
    }

    /// 重新开始（摄像头重启或重拍）
    #[frb(sync)]
    pub fn restart(&self) {
        let mut inner = self.lock();
        if let Err(e) = inner.camera.start(Facing::User) {
            warn!("❌ Failed to restart frame feed: {}", e);
        }
        info!("🔄 FaceGuideSession: restarted");
    }

    #[frb(sync, getter)]
    pub fn state(&self) -> CaptureState {
        self.lock().camera.guide().state()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn tick(inner: &mut Inner, timestamp_ms: u64) -> GuideFeedback {
        match inner.camera.tick(timestamp_ms) {
            Ok(feedback) => GuideFeedback {
                detection: feedback.detection,
                action: feedback.action.into(),
                state: feedback.state,
            },
            // 已抓拍，流已释放，等待 restart
            Err(_) => GuideFeedback {
                detection: DetectionResult::not_detected(),
                action: GuideAction::Ignored,
                state: inner.camera.guide().state(),
            },
        }
    }

    fn outcome(
        inner: &Inner,
        result: Result<CaptureAction, CameraError>,
        captured_image: Option<String>,
    ) -> CaptureOutcome {
        let action = match result {
            Ok(action) => action.into(),
            Err(e) => {
                warn!("⚠️ Capture skipped: {}", e);
                GuideAction::Ignored
            }
        };
        CaptureOutcome {
            action,
            state: inner.camera.guide().state(),
            captured_image,
        }
    }
}

fn encode_capture(frame: &Frame, trigger: CaptureTrigger) -> Option<String> {
    match frame.to_data_uri(CAPTURE_JPEG_QUALITY) {
        Ok(uri) => {
            info!(
                "📸 Captured frame {} ({}x{}, {:?})",
                frame.frame_number, frame.width, frame.height, trigger
            );
            Some(uri)
        }
        Err(e) => {
            warn!("❌ Failed to encode captured frame: {}", e);
            None
        }
    }
}

impl Drop for FaceGuideSession {
    fn drop(&mut self) {
        info!("🗑️ FaceGuideSession: released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face_guide::pipeline::tests::face_frame;

    fn feed(session: &FaceGuideSession, frame: &Frame, ts: u64) -> GuideFeedback {
        session.process_frame(frame.width, frame.height, frame.data.clone(), ts)
    }

    fn is_jpeg_uri(outcome: &CaptureOutcome) -> bool {
        outcome
            .captured_image
            .as_deref()
            .map_or(false, |uri| uri.starts_with("data:image/jpeg;base64,"))
    }

    #[test]
    fn test_auto_capture_flow_returns_image() {
        let session = FaceGuideSession::create(GuideProfile::CaptureGuide, false);
        let frame = face_frame(220, 120, 0);

        for i in 0..19 {
            let fb = feed(&session, &frame, i * 200);
            assert!(fb.detection.is_in_oval, "tick {} should be in oval", i);
            assert_eq!(fb.action, GuideAction::Continue);
        }

        let fb = feed(&session, &frame, 19 * 200);
        assert_eq!(fb.action, GuideAction::ScheduleCapture { delay_ms: 300 });
        assert!(fb.state.auto_capturing);

        // 自动抓拍进行中，手动拍照被忽略
        assert_eq!(session.manual_capture().action, GuideAction::Ignored);

        let outcome = session.settle_elapsed();
        assert_eq!(outcome.action, GuideAction::Fire { manual: false });
        assert!(is_jpeg_uri(&outcome));
        assert!(session.state().captured);

        // 抓拍后流已释放，后续帧不再处理
        let fb = feed(&session, &frame, 20 * 200);
        assert_eq!(fb.action, GuideAction::Ignored);
        assert!(!fb.detection.detected);
    }

    #[test]
    fn test_manual_capture_before_first_frame_is_ignored() {
        let session = FaceGuideSession::create(GuideProfile::Background, false);

        let outcome = session.manual_capture();
        assert_eq!(outcome.action, GuideAction::Ignored);
        assert!(outcome.captured_image.is_none());
        assert!(!outcome.state.captured);

        // 画面到达后同一会话可以直接拍
        let frame = face_frame(220, 120, 0);
        feed(&session, &frame, 0);
        let outcome = session.manual_capture();
        assert_eq!(outcome.action, GuideAction::Fire { manual: true });
        assert!(is_jpeg_uri(&outcome));
    }

    #[test]
    fn test_restart_after_capture() {
        let session = FaceGuideSession::create(GuideProfile::CaptureGuide, false);
        let frame = face_frame(220, 120, 0);
        feed(&session, &frame, 0);
        assert_eq!(session.manual_capture().action, GuideAction::Fire { manual: true });

        session.restart();
        assert!(!session.state().captured);
        assert_eq!(session.state().consecutive_in_oval_frames, 0);
        assert!(feed(&session, &frame, 200).detection.is_in_oval);
    }

    #[test]
    fn test_countdown_profile() {
        let session = FaceGuideSession::create(GuideProfile::CaptureGuide, true);
        let frame = face_frame(220, 120, 0);

        let mut last = GuideAction::Continue;
        for i in 0..20 {
            last = feed(&session, &frame, i * 200).action;
        }
        assert_eq!(last, GuideAction::StartCountdown { remaining: 3 });
        assert_eq!(session.countdown_tick().action, GuideAction::CountdownStep { remaining: 2 });
        assert_eq!(session.countdown_tick().action, GuideAction::CountdownStep { remaining: 1 });

        let outcome = session.countdown_tick();
        assert_eq!(outcome.action, GuideAction::Fire { manual: false });
        assert!(is_jpeg_uri(&outcome));
    }

    #[test]
    fn test_incomplete_yuv_frame_not_ready() {
        let session = FaceGuideSession::create(GuideProfile::CaptureGuide, false);
        let fb = session.process_yuv_frame(0, 0, vec![], vec![], vec![], 0, 0);
        assert!(!fb.detection.detected);
        assert_eq!(fb.action, GuideAction::Continue);

        // 尺寸有效但平面为空
        let fb = session.process_yuv_frame(640, 480, vec![], vec![], vec![], 200, 1);
        assert!(!fb.detection.detected);
        assert_eq!(session.manual_capture().action, GuideAction::Ignored);
    }

    #[test]
    fn test_action_conversion() {
        use std::time::Duration;
        assert_eq!(
            GuideAction::from(CaptureAction::ScheduleCapture(Duration::from_millis(300))),
            GuideAction::ScheduleCapture { delay_ms: 300 }
        );
        assert_eq!(
            GuideAction::from(CaptureAction::Fire(CaptureTrigger::Manual)),
            GuideAction::Fire { manual: true }
        );
    }
}
