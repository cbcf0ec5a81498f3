use std::fmt;

use serde::{Deserialize, Serialize};

use crate::face_guide::region::FaceBox;

/// 引导椭圆，全部为帧尺寸的比例
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OvalTarget {
    pub center_x: f32,
    pub center_y: f32,
    pub radius_x: f32,
    pub radius_y: f32,
}

impl Default for OvalTarget {
    /// 宽 0.5、高 0.7，居中
    fn default() -> Self {
        Self {
            center_x: 0.5,
            center_y: 0.5,
            radius_x: 0.25,
            radius_y: 0.35,
        }
    }
}

impl OvalTarget {
    /// 半径必须为正，且椭圆完整落在画面内
    pub fn is_valid(&self) -> bool {
        self.radius_x > 0.0
            && self.radius_y > 0.0
            && self.center_x - self.radius_x >= 0.0
            && self.center_x + self.radius_x <= 1.0
            && self.center_y - self.radius_y >= 0.0
            && self.center_y + self.radius_y <= 1.0
    }

    fn in_pixels(&self, frame_width: u32, frame_height: u32) -> (f32, f32, f32, f32) {
        let w = frame_width as f32;
        let h = frame_height as f32;
        (
            self.center_x * w,
            self.center_y * h,
            self.radius_x * w,
            self.radius_y * h,
        )
    }
}

/// 引导提示，按优先级排列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Guidance {
    NoFace,
    MoveRight,
    MoveLeft,
    MoveDown,
    MoveUp,
    MoveCloser,
    MoveBack,
    AlmostThere,
    Perfect,
}

impl Guidance {
    pub fn message(&self) -> &'static str {
        match self {
            Guidance::NoFace => "Position your face in the oval",
            Guidance::MoveRight => "Move right",
            Guidance::MoveLeft => "Move left",
            Guidance::MoveDown => "Move down",
            Guidance::MoveUp => "Move up",
            Guidance::MoveCloser => "Move closer",
            Guidance::MoveBack => "Move back a little",
            Guidance::AlmostThere => "Almost there...",
            Guidance::Perfect => "Perfect! Hold still",
        }
    }
}

impl fmt::Display for Guidance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone)]
pub struct AlignmentConfig {
    /// 椭圆方程右侧阈值，略大于 1 以容忍框估计噪声
    pub containment_threshold: f32,
    /// 单轴偏移容差（相对半径）
    pub offset_tolerance: f32,
    /// 框的长边相对椭圆短轴直径的范围
    pub min_size_fraction: f32,
    pub max_size_fraction: f32,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            containment_threshold: 1.3,
            offset_tolerance: 0.3,
            min_size_fraction: 0.3,
            max_size_fraction: 1.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Alignment {
    pub is_in_oval: bool,
    pub guidance: Guidance,
}

pub struct OvalAlignmentEvaluator {
    config: AlignmentConfig,
}

impl OvalAlignmentEvaluator {
    pub fn new(config: AlignmentConfig) -> Self {
        Self { config }
    }

    pub fn evaluate(
        &self,
        face_box: &FaceBox,
        frame_width: u32,
        frame_height: u32,
        oval: &OvalTarget,
    ) -> Alignment {
        if frame_width == 0 || frame_height == 0 || !oval.is_valid() {
            return Alignment {
                is_in_oval: false,
                guidance: Guidance::NoFace,
            };
        }

        let (ox, oy, rx, ry) = oval.in_pixels(frame_width, frame_height);
        let (cx, cy) = face_box.center();
        let dx = (cx - ox) / rx;
        let dy = (cy - oy) / ry;

        let contained = dx * dx + dy * dy <= self.config.containment_threshold;

        let minor = (2.0 * rx).min(2.0 * ry);
        let size_fraction = face_box.width.max(face_box.height) as f32 / minor;
        let too_small = size_fraction < self.config.min_size_fraction;
        let too_large = size_fraction > self.config.max_size_fraction;

        let tol = self.config.offset_tolerance;
        let offset_hint = if dx < -tol {
            Some(Guidance::MoveRight)
        } else if dx > tol {
            Some(Guidance::MoveLeft)
        } else if dy < -tol {
            Some(Guidance::MoveDown)
        } else if dy > tol {
            Some(Guidance::MoveUp)
        } else {
            None
        };

        // 有偏移提示时不算对准
        let is_in_oval = contained && offset_hint.is_none() && !too_small && !too_large;

        let guidance = if let Some(hint) = offset_hint {
            hint
        } else if too_small {
            Guidance::MoveCloser
        } else if too_large {
            Guidance::MoveBack
        } else if is_in_oval {
            Guidance::Perfect
        } else {
            Guidance::AlmostThere
        };

        Alignment {
            is_in_oval,
            guidance,
        }
    }
}

impl Default for OvalAlignmentEvaluator {
    fn default() -> Self {
        Self::new(AlignmentConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: u32 = 640;
    const H: u32 = 480;

    fn centered_box(cx: u32, cy: u32, width: u32, height: u32) -> FaceBox {
        FaceBox {
            x: cx - width / 2,
            y: cy - height / 2,
            width,
            height,
        }
    }

    #[test]
    fn test_centered_box_is_perfect() {
        let evaluator = OvalAlignmentEvaluator::default();
        let result = evaluator.evaluate(&centered_box(320, 240, 200, 240), W, H, &OvalTarget::default());

        assert!(result.is_in_oval);
        assert_eq!(result.guidance, Guidance::Perfect);
        assert!(result.guidance.message().contains("Perfect"));
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let evaluator = OvalAlignmentEvaluator::default();
        let face_box = centered_box(250, 300, 150, 180);
        let oval = OvalTarget::default();

        let first = evaluator.evaluate(&face_box, W, H, &oval);
        for _ in 0..10 {
            assert_eq!(evaluator.evaluate(&face_box, W, H, &oval), first);
        }
    }

    #[test]
    fn test_shifted_left_asks_to_move_right() {
        let evaluator = OvalAlignmentEvaluator::default();
        // dx = (120 - 320) / 160 = -1.25
        let result = evaluator.evaluate(&centered_box(120, 240, 200, 240), W, H, &OvalTarget::default());

        assert!(!result.is_in_oval);
        assert_eq!(result.guidance, Guidance::MoveRight);
    }

    #[test]
    fn test_offset_inside_ellipse_still_not_aligned() {
        let evaluator = OvalAlignmentEvaluator::default();
        // dx = (192 - 320) / 160 = -0.8，椭圆方程 0.64 <= 1.3 但超出单轴容差
        let face_box = FaceBox {
            x: 92,
            y: 120,
            width: 200,
            height: 240,
        };
        let result = evaluator.evaluate(&face_box, W, H, &OvalTarget::default());

        assert!(!result.is_in_oval);
        assert_eq!(result.guidance, Guidance::MoveRight);

        // 垂直方向同理：dy = (300 - 240) / 168 ≈ 0.36
        let result = evaluator.evaluate(&centered_box(320, 300, 200, 240), W, H, &OvalTarget::default());
        assert!(!result.is_in_oval);
        assert_eq!(result.guidance, Guidance::MoveUp);
    }

    #[test]
    fn test_horizontal_wins_over_vertical_and_size() {
        let evaluator = OvalAlignmentEvaluator::default();
        // 左偏 + 上偏 + 过小
        let result = evaluator.evaluate(&centered_box(120, 100, 40, 40), W, H, &OvalTarget::default());

        assert!(!result.is_in_oval);
        assert_eq!(result.guidance, Guidance::MoveRight);
    }

    #[test]
    fn test_vertical_wins_over_size() {
        let evaluator = OvalAlignmentEvaluator::default();
        // dy = (380 - 240) / 168 ≈ 0.83，同时过小
        let result = evaluator.evaluate(&centered_box(320, 380, 40, 40), W, H, &OvalTarget::default());

        assert!(!result.is_in_oval);
        assert_eq!(result.guidance, Guidance::MoveUp);
    }

    #[test]
    fn test_size_checks() {
        let evaluator = OvalAlignmentEvaluator::default();
        let oval = OvalTarget::default();

        // 短轴直径 320，0.3 * 320 = 96
        let small = evaluator.evaluate(&centered_box(320, 240, 80, 80), W, H, &oval);
        assert!(!small.is_in_oval);
        assert_eq!(small.guidance, Guidance::MoveCloser);

        // 1.5 * 320 = 480
        let large = evaluator.evaluate(&centered_box(320, 240, 490, 400), W, H, &oval);
        assert!(!large.is_in_oval);
        assert_eq!(large.guidance, Guidance::MoveBack);
    }

    #[test]
    fn test_within_tolerances_but_outside_ellipse_is_almost_there() {
        let config = AlignmentConfig {
            containment_threshold: 0.1,
            ..Default::default()
        };
        let evaluator = OvalAlignmentEvaluator::new(config);
        // dx = 40/160 = 0.25, dy = 40/168 ≈ 0.24，各自在容差内但平方和 > 0.1
        let result = evaluator.evaluate(&centered_box(360, 280, 200, 240), W, H, &OvalTarget::default());

        assert!(!result.is_in_oval);
        assert_eq!(result.guidance, Guidance::AlmostThere);
    }

    #[test]
    fn test_invalid_oval_never_in_oval() {
        let evaluator = OvalAlignmentEvaluator::default();
        let oval = OvalTarget {
            radius_x: 0.0,
            ..Default::default()
        };
        let result = evaluator.evaluate(&centered_box(320, 240, 200, 240), W, H, &oval);
        assert!(!result.is_in_oval);
        assert!(OvalTarget::default().is_valid());
    }
}
