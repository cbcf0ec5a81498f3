//! YCbCr 肤色分类器

/// 一个像素的 YCbCr 分量
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YCbCr {
    pub y: f32,
    pub cb: f32,
    pub cr: f32,
}

impl YCbCr {
    /// ITU-R BT.601 full-range conversion
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        let r = r as f32;
        let g = g as f32;
        let b = b as f32;
        Self {
            y: 0.299 * r + 0.587 * g + 0.114 * b,
            cb: 128.0 - 0.168736 * r - 0.331264 * g + 0.5 * b,
            cr: 128.0 + 0.5 * r - 0.418688 * g - 0.081312 * b,
        }
    }
}

/// 闭区间 [min, max]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub min: f32,
    pub max: f32,
}

impl Band {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// 肤色判定阈值带
///
/// 越宽松误检越多，越严格弱光下越容易漏检。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkinToneBands {
    pub luma: Band,
    pub cb: Band,
    pub cr: Band,
}

impl Default for SkinToneBands {
    fn default() -> Self {
        Self::strict()
    }
}

impl SkinToneBands {
    /// 抓拍引导用的严格阈值
    pub const fn strict() -> Self {
        Self {
            luma: Band::new(80.0, 240.0),
            cb: Band::new(77.0, 127.0),
            cr: Band::new(133.0, 173.0),
        }
    }

    /// 常驻后台检测用的宽松阈值
    pub const fn loose() -> Self {
        Self {
            luma: Band::new(40.0, 255.0),
            cb: Band::new(70.0, 135.0),
            cr: Band::new(130.0, 180.0),
        }
    }

    #[inline]
    pub fn is_skin_tone(&self, r: u8, g: u8, b: u8) -> bool {
        let px = YCbCr::from_rgb(r, g, b);
        self.luma.contains(px.y) && self.cb.contains(px.cb) && self.cr.contains(px.cr)
    }
}
