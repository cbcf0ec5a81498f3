use log::debug;
use serde::{Deserialize, Serialize};

use crate::face_guide::frame::{Frame, FrameSampler};
use crate::face_guide::oval::{AlignmentConfig, Guidance, OvalAlignmentEvaluator, OvalTarget};
use crate::face_guide::region::{EstimatorConfig, FaceBox, FaceRegionEstimator};
use crate::face_guide::skin::SkinToneBands;
use crate::face_guide::state_machine::{CaptureAction, CaptureConfig, CaptureState, CaptureStateMachine};

/// 检测器完整配置，不同调用点用不同预设
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub estimator: EstimatorConfig,
    pub alignment: AlignmentConfig,
    pub capture: CaptureConfig,
    pub oval: OvalTarget,
    pub stride: u32,
    pub mirror: bool,
    /// 相邻两次检测间隔超过此值视为断档
    pub max_tick_gap_ms: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::capture_guide()
    }
}

impl DetectorConfig {
    /// 抓拍引导：严格阈值，按命中数判定
    pub fn capture_guide() -> Self {
        Self {
            estimator: EstimatorConfig::default(),
            alignment: AlignmentConfig::default(),
            capture: CaptureConfig::default(),
            oval: OvalTarget::default(),
            stride: 4,
            mirror: true,
            max_tick_gap_ms: 1000,
        }
    }

    /// 常驻后台检测：宽松阈值，按肤色占比判定
    pub fn background() -> Self {
        Self {
            estimator: EstimatorConfig {
                bands: SkinToneBands::loose(),
                min_skin_samples: 50,
                min_skin_ratio: 0.15,
                ..Default::default()
            },
            alignment: AlignmentConfig {
                containment_threshold: 1.5,
                ..Default::default()
            },
            capture: CaptureConfig::default(),
            oval: OvalTarget::default(),
            stride: 8,
            mirror: true,
            max_tick_gap_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub detected: bool,
    pub face_box: Option<FaceBox>,
    pub is_in_oval: bool,
    pub guidance: Guidance,
    pub message: String,
    pub confidence: f32,
}

impl DetectionResult {
    pub fn not_detected() -> Self {
        Self {
            detected: false,
            face_box: None,
            is_in_oval: false,
            guidance: Guidance::NoFace,
            message: Guidance::NoFace.message().to_string(),
            confidence: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FrameFeedback {
    pub detection: DetectionResult,
    pub action: CaptureAction,
    pub state: CaptureState,
}

pub struct FaceGuide {
    sampler: FrameSampler,
    estimator: FaceRegionEstimator,
    evaluator: OvalAlignmentEvaluator,
    state_machine: CaptureStateMachine,
    oval: OvalTarget,
    max_tick_gap_ms: u64,
    last_tick_ms: Option<u64>,
}

impl FaceGuide {
    pub fn new() -> Self {
        Self::with_config(DetectorConfig::default())
    }

    pub fn with_config(config: DetectorConfig) -> Self {
        Self {
            sampler: FrameSampler::new(config.stride, config.mirror),
            estimator: FaceRegionEstimator::new(config.estimator),
            evaluator: OvalAlignmentEvaluator::new(config.alignment),
            state_machine: CaptureStateMachine::with_config(config.capture),
            oval: config.oval,
            max_tick_gap_ms: config.max_tick_gap_ms,
            last_tick_ms: None,
        }
    }

    /// 单帧检测，不推进抓拍状态
    pub fn detect(&mut self, frame: &Frame) -> DetectionResult {
        let stride = self.sampler.stride();
        let canvas = match self.sampler.sample(frame) {
            Some(canvas) => canvas,
            None => return DetectionResult::not_detected(),
        };

        let estimate = self.estimator.estimate(canvas, stride);
        let face_box = match estimate.bounding_box {
            Some(face_box) => face_box,
            None => return DetectionResult::not_detected(),
        };

        let alignment = self
            .evaluator
            .evaluate(&face_box, frame.width, frame.height, &self.oval);

        DetectionResult {
            detected: true,
            face_box: Some(face_box),
            is_in_oval: alignment.is_in_oval,
            guidance: alignment.guidance,
            message: alignment.guidance.message().to_string(),
            confidence: estimate.confidence,
        }
    }

    /// 一次检测节拍：检测 + 推进状态机
    pub fn process_frame(&mut self, frame: &Frame, timestamp_ms: u64) -> FrameFeedback {
        if let Some(last) = self.last_tick_ms {
            if timestamp_ms.saturating_sub(last) > self.max_tick_gap_ms {
                debug!(
                    "⏸️ Detection gap of {}ms, resetting streak",
                    timestamp_ms.saturating_sub(last)
                );
                self.state_machine.reset_streak();
            }
        }
        self.last_tick_ms = Some(timestamp_ms);

        let detection = self.detect(frame);
        let action = self.state_machine.on_detection(detection.is_in_oval);

        debug!(
            "👤 tick {} frame {}: detected={} in_oval={} action={:?}",
            self.state_machine.tick_count(),
            frame.frame_number,
            detection.detected,
            detection.is_in_oval,
            action
        );

        FrameFeedback {
            detection,
            action,
            state: self.state_machine.snapshot(),
        }
    }

    pub fn start(&mut self) {
        self.state_machine.start();
        self.last_tick_ms = None;
    }

    pub fn manual_capture(&mut self) -> CaptureAction {
        self.state_machine.manual_capture()
    }

    pub fn on_countdown_tick(&mut self) -> CaptureAction {
        self.state_machine.on_countdown_tick()
    }

    pub fn on_settle_elapsed(&mut self) -> CaptureAction {
        self.state_machine.on_settle_elapsed()
    }

    pub fn state(&self) -> CaptureState {
        self.state_machine.snapshot()
    }

    pub fn is_captured(&self) -> bool {
        self.state_machine.is_captured()
    }

    pub fn capture_machine(&self) -> &CaptureStateMachine {
        &self.state_machine
    }

    pub fn reset(&mut self) {
        self.state_machine.reset();
        self.last_tick_ms = None;
    }
}

impl Default for FaceGuide {
    fn default() -> Self {
        Self::new()
    }
}
