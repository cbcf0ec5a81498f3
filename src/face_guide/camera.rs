//! 摄像头会话 - 独占持有视频流句柄
//!
//! 同一时刻只有一个活动流，只有开启它的会话能关闭它。
//! 开新流前必须先释放旧流，否则设备会一直被占用。

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, info, warn};
use thiserror::Error;

use crate::core::clock::Sleeper;
use crate::face_guide::frame::Frame;
use crate::face_guide::pipeline::{DetectorConfig, FaceGuide, FrameFeedback};
use crate::face_guide::state_machine::{CaptureAction, CaptureTrigger};

/// 切换前后摄像头时的停顿
const SWITCH_SETTLE: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("camera unavailable: {0}")]
    Unavailable(String),
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("no active camera stream")]
    NotStarted,
    #[error("no frame available to capture")]
    NoFrame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    User,
    Environment,
}

impl Facing {
    pub fn flipped(self) -> Self {
        match self {
            Facing::User => Facing::Environment,
            Facing::Environment => Facing::User,
        }
    }
}

pub trait MediaStream: Send {
    /// 尚未出帧时返回 `None`
    fn current_frame(&mut self) -> Option<Frame>;
    fn stop(&mut self);
}

pub trait CameraDevice {
    type Stream: MediaStream;

    fn open(&mut self, facing: Facing) -> Result<Self::Stream, CameraError>;
}

#[derive(Default)]
struct FeedSlot {
    latest: Option<Frame>,
    streaming: bool,
}

/// 由外部推帧的设备（Flutter 相机插件把预览帧送进来）
///
/// 流开启期间只保留最新一帧；流停止后推入的帧直接丢弃。
#[derive(Clone, Default)]
pub struct FrameFeed {
    slot: Arc<Mutex<FeedSlot>>,
}

impl FrameFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// 返回该帧是否被接收
    pub fn push(&self, frame: Frame) -> bool {
        let mut slot = self.lock();
        if !slot.streaming {
            debug!("📭 Frame {} dropped, no active stream", frame.frame_number);
            return false;
        }
        slot.latest = Some(frame);
        true
    }

    pub fn is_streaming(&self) -> bool {
        self.lock().streaming
    }

    fn lock(&self) -> MutexGuard<'_, FeedSlot> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct FeedStream {
    feed: FrameFeed,
}

impl MediaStream for FeedStream {
    fn current_frame(&mut self) -> Option<Frame> {
        self.feed.lock().latest.take()
    }

    fn stop(&mut self) {
        let mut slot = self.feed.lock();
        slot.streaming = false;
        slot.latest = None;
    }
}

impl CameraDevice for FrameFeed {
    type Stream = FeedStream;

    fn open(&mut self, _facing: Facing) -> Result<FeedStream, CameraError> {
        let mut slot = self.lock();
        slot.streaming = true;
        slot.latest = None;
        Ok(FeedStream { feed: self.clone() })
    }
}

pub struct CameraSession<D: CameraDevice> {
    device: D,
    stream: Option<D::Stream>,
    facing: Facing,
    guide: FaceGuide,
    last_frame: Option<Frame>,
}

impl<D: CameraDevice> CameraSession<D> {
    pub fn new(device: D, config: DetectorConfig) -> Self {
        Self {
            device,
            stream: None,
            facing: Facing::User,
            guide: FaceGuide::with_config(config),
            last_frame: None,
        }
    }

    /// 开流并开始追踪；已有流会先被释放
    pub fn start(&mut self, facing: Facing) -> Result<(), CameraError> {
        self.release();

        let stream = self.device.open(facing)?;
        info!("📷 Camera stream acquired ({:?})", facing);
        self.stream = Some(stream);
        self.facing = facing;
        self.last_frame = None;
        self.guide.reset();
        self.guide.start();
        Ok(())
    }

    pub fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            info!("🗑️ Camera stream released");
        }
    }

    /// 停流 -> 短暂停顿 -> 以新朝向开流，中间会有一段没有画面
    pub fn switch_facing(&mut self, sleeper: &dyn Sleeper) -> Result<(), CameraError> {
        let next = self.facing.flipped();
        self.release();
        sleeper.sleep(SWITCH_SETTLE);
        self.start(next)
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn guide(&self) -> &FaceGuide {
        &self.guide
    }

    /// 一次检测节拍
    pub fn tick(&mut self, timestamp_ms: u64) -> Result<FrameFeedback, CameraError> {
        let stream = self.stream.as_mut().ok_or(CameraError::NotStarted)?;
        let frame = stream
            .current_frame()
            .unwrap_or_else(|| Frame::new(0, 0, Vec::new(), timestamp_ms, 0));

        let feedback = self.guide.process_frame(&frame, timestamp_ms);
        if frame.is_ready() {
            self.last_frame = Some(frame);
        }
        Ok(feedback)
    }

    pub fn settle_elapsed<F>(&mut self, on_capture: F) -> Result<CaptureAction, CameraError>
    where
        F: FnOnce(Frame, CaptureTrigger),
    {
        if self.guide.capture_machine().settle_will_fire() {
            self.ensure_frame()?;
        }
        let action = self.guide.on_settle_elapsed();
        self.handle_action(action, on_capture)
    }

    pub fn countdown_tick<F>(&mut self, on_capture: F) -> Result<CaptureAction, CameraError>
    where
        F: FnOnce(Frame, CaptureTrigger),
    {
        if self.guide.capture_machine().countdown_will_fire() {
            self.ensure_frame()?;
        }
        let action = self.guide.on_countdown_tick();
        self.handle_action(action, on_capture)
    }

    /// 还没有可用画面时返回 `NoFrame`，状态不变，之后可以再按
    pub fn manual_capture<F>(&mut self, on_capture: F) -> Result<CaptureAction, CameraError>
    where
        F: FnOnce(Frame, CaptureTrigger),
    {
        if self.guide.capture_machine().accepts_manual_capture() {
            self.ensure_frame()?;
        }
        let action = self.guide.manual_capture();
        self.handle_action(action, on_capture)
    }

    /// 进入终态前确认手里有一帧可交付
    fn ensure_frame(&mut self) -> Result<(), CameraError> {
        let fresh = self
            .stream
            .as_mut()
            .and_then(|s| s.current_frame())
            .filter(|f| f.is_ready());
        if fresh.is_some() {
            self.last_frame = fresh;
        }

        if self.last_frame.is_some() {
            Ok(())
        } else {
            warn!("⚠️ Capture requested but no frame has arrived yet");
            Err(CameraError::NoFrame)
        }
    }

    // 抓拍即终态：先停流，再回调
    fn handle_action<F>(&mut self, action: CaptureAction, on_capture: F) -> Result<CaptureAction, CameraError>
    where
        F: FnOnce(Frame, CaptureTrigger),
    {
        let trigger = match action {
            CaptureAction::Fire(trigger) => trigger,
            other => return Ok(other),
        };

        let frame = self.last_frame.take();
        self.release();

        match frame {
            Some(frame) => {
                info!("📸 Capture fired ({:?})", trigger);
                on_capture(frame, trigger);
                Ok(action)
            }
            None => {
                warn!("⚠️ Capture fired but no frame was available");
                Err(CameraError::NoFrame)
            }
        }
    }
}

impl<D: CameraDevice> Drop for CameraSession<D> {
    fn drop(&mut self) {
        self.release();
    }
}
