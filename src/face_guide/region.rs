use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::face_guide::skin::SkinToneBands;

/// 人脸框，源帧像素坐标
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl FaceBox {
    pub fn center(&self) -> (f32, f32) {
        (
            self.x as f32 + self.width as f32 / 2.0,
            self.y as f32 + self.height as f32 / 2.0,
        )
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionEstimate {
    pub skin_pixel_count: usize,
    pub sampled_count: usize,
    pub bounding_box: Option<FaceBox>,
    pub confidence: f32,
}

impl RegionEstimate {
    fn none(skin_pixel_count: usize, sampled_count: usize) -> Self {
        Self {
            skin_pixel_count,
            sampled_count,
            bounding_box: None,
            confidence: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EstimatorConfig {
    pub bands: SkinToneBands,
    /// 命中样本数下限
    pub min_skin_samples: usize,
    /// 命中样本占比下限，0 表示不启用
    pub min_skin_ratio: f32,
    /// 外扩像素
    pub padding: u32,
    /// 框内理论肤色覆盖率，用于估算置信度
    pub expected_fill: f32,
    /// 一旦出框，置信度不低于此值
    pub min_confidence: f32,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            bands: SkinToneBands::strict(),
            min_skin_samples: 100,
            min_skin_ratio: 0.0,
            padding: 20,
            expected_fill: 0.6,
            min_confidence: 0.3,
        }
    }
}

pub struct FaceRegionEstimator {
    config: EstimatorConfig,
}

impl FaceRegionEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// 按 stride 稀疏采样，统计肤色像素的外接框
    pub fn estimate(&self, canvas: &RgbaImage, stride: u32) -> RegionEstimate {
        let (width, height) = canvas.dimensions();
        let step = stride.max(1) as usize;

        let mut min_x = u32::MAX;
        let mut min_y = u32::MAX;
        let mut max_x = 0u32;
        let mut max_y = 0u32;
        let mut matched = 0usize;
        let mut sampled = 0usize;

        for y in (0..height).step_by(step) {
            for x in (0..width).step_by(step) {
                sampled += 1;
                let [r, g, b, _] = canvas.get_pixel(x, y).0;
                if self.config.bands.is_skin_tone(r, g, b) {
                    matched += 1;
                    min_x = min_x.min(x);
                    min_y = min_y.min(y);
                    max_x = max_x.max(x);
                    max_y = max_y.max(y);
                }
            }
        }

        if matched < self.config.min_skin_samples || matched == 0 {
            return RegionEstimate::none(matched, sampled);
        }
        let ratio = matched as f32 / sampled.max(1) as f32;
        if ratio < self.config.min_skin_ratio {
            return RegionEstimate::none(matched, sampled);
        }

        let pad = self.config.padding;
        let left = min_x.saturating_sub(pad);
        let top = min_y.saturating_sub(pad);
        let right = (max_x + pad).min(width);
        let bottom = (max_y + pad).min(height);

        let face_box = FaceBox {
            x: left,
            y: top,
            width: right.saturating_sub(left),
            height: bottom.saturating_sub(top),
        };

        let confidence = self.confidence(matched, &face_box, stride);

        RegionEstimate {
            skin_pixel_count: matched,
            sampled_count: sampled,
            bounding_box: Some(face_box),
            confidence,
        }
    }

    // 平滑给 UI 看的，不是统计意义上的置信度
    fn confidence(&self, matched: usize, face_box: &FaceBox, stride: u32) -> f32 {
        let step = stride.max(1) as f32;
        let expected =
            (face_box.width as f32 / step) * (face_box.height as f32 / step) * self.config.expected_fill;
        let raw = if expected > 0.0 {
            (matched as f32 / expected).min(1.0)
        } else {
            1.0
        };
        raw.max(self.config.min_confidence).clamp(0.0, 1.0)
    }
}
