//! 自拍引导 - 实时判断人脸是否对准引导椭圆，并决定何时自动抓拍
//!
//! 核心策略：
//! 1. 稀疏采样 - 按 stride 取像素，复用离屏画布
//! 2. 肤色判定 - YCbCr 阈值带，可配置
//! 3. 外接框 + 椭圆方程 - 判断位置和大小，按优先级给出提示
//! 4. 状态机驱动 - 连续稳定帧达到阈值后抓拍

pub mod camera;
pub mod frame;
pub mod oval;
pub mod pipeline;
pub mod region;
pub mod skin;
pub mod state_machine;

pub use camera::{CameraDevice, CameraError, CameraSession, Facing, FeedStream, FrameFeed, MediaStream};
pub use frame::{Frame, FrameSampler, RawFrame};
pub use oval::{Alignment, AlignmentConfig, Guidance, OvalAlignmentEvaluator, OvalTarget};
pub use pipeline::{DetectionResult, DetectorConfig, FaceGuide, FrameFeedback};
pub use region::{EstimatorConfig, FaceBox, FaceRegionEstimator, RegionEstimate};
pub use skin::{Band, SkinToneBands, YCbCr};
pub use state_machine::{
    CaptureAction, CaptureConfig, CapturePhase, CaptureState, CaptureStateMachine, CaptureTrigger,
};
