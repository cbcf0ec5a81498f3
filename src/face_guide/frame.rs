use std::io::Cursor;
use std::time::Duration;

use base64::Engine;
use image::{DynamicImage, ImageOutputFormat, RgbaImage};

/// 帧数据结构
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>, // RGBA 格式
    pub timestamp: Duration,
    pub frame_number: u64,
}

impl Frame {
    pub fn new(
        width: u32,
        height: u32,
        data: Vec<u8>,
        timestamp_ms: u64,
        frame_number: u64,
    ) -> Self {
        Self {
            width,
            height,
            data,
            timestamp: Duration::from_millis(timestamp_ms),
            frame_number,
        }
    }

    /// 尺寸溢出时返回 `None`
    pub fn pixel_count(&self) -> Option<usize> {
        (self.width as usize).checked_mul(self.height as usize)
    }

    pub fn byte_len(&self) -> Option<usize> {
        self.pixel_count()?.checked_mul(4)
    }

    /// 视频源还没给出有效尺寸，或数据长度不够
    pub fn is_ready(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.byte_len().map_or(false, |len| self.data.len() >= len)
    }

    /// 编码为 JPEG（丢弃 alpha）
    pub fn to_jpeg(&self, quality: u8) -> Result<Vec<u8>, image::ImageError> {
        let rgba = RgbaImage::from_raw(self.width, self.height, self.data.clone()).ok_or_else(|| {
            image::ImageError::Parameter(image::error::ParameterError::from_kind(
                image::error::ParameterErrorKind::DimensionMismatch,
            ))
        })?;
        let rgb = DynamicImage::ImageRgba8(rgba).to_rgb8();

        let mut buffer = Cursor::new(Vec::new());
        rgb.write_to(&mut buffer, ImageOutputFormat::Jpeg(quality))?;
        Ok(buffer.into_inner())
    }

    /// 抓拍静帧 -> `data:image/jpeg;base64,...`
    pub fn to_data_uri(&self, quality: u8) -> Result<String, image::ImageError> {
        let jpeg = self.to_jpeg(quality)?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(jpeg);
        Ok(format!("data:image/jpeg;base64,{}", encoded))
    }
}

/// 从原生层传递的原始帧数据（YUV420）
#[derive(Debug)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub y_plane: Vec<u8>,
    pub u_plane: Vec<u8>,
    pub v_plane: Vec<u8>,
    pub timestamp_ms: u64,
    pub frame_number: u64,
}

impl RawFrame {
    /// 色度平面按 2x2 下采样，奇数边向上取整
    fn chroma_dims(&self) -> (usize, usize) {
        ((self.width as usize + 1) / 2, (self.height as usize + 1) / 2)
    }

    /// 尺寸为 0 或任一平面长度不足时返回 `None`
    pub fn to_rgba(&self) -> Option<Frame> {
        let width = self.width as usize;
        let height = self.height as usize;
        if width == 0 || height == 0 {
            return None;
        }

        let luma_len = width.checked_mul(height)?;
        let (chroma_width, chroma_height) = self.chroma_dims();
        let chroma_len = chroma_width.checked_mul(chroma_height)?;
        if self.y_plane.len() < luma_len
            || self.u_plane.len() < chroma_len
            || self.v_plane.len() < chroma_len
        {
            return None;
        }

        let mut rgba_data = vec![0u8; luma_len.checked_mul(4)?];

        for y in 0..height {
            for x in 0..width {
                let y_idx = y * width + x;
                let uv_idx = (y / 2) * chroma_width + x / 2;

                let y_val = self.y_plane[y_idx] as f32;
                let u_val = self.u_plane[uv_idx] as f32 - 128.0;
                let v_val = self.v_plane[uv_idx] as f32 - 128.0;

                let r = (y_val + 1.402 * v_val).clamp(0.0, 255.0) as u8;
                let g = (y_val - 0.344136 * u_val - 0.714136 * v_val).clamp(0.0, 255.0) as u8;
                let b = (y_val + 1.772 * u_val).clamp(0.0, 255.0) as u8;

                let rgba_idx = y_idx * 4;
                rgba_data[rgba_idx] = r;
                rgba_data[rgba_idx + 1] = g;
                rgba_data[rgba_idx + 2] = b;
                rgba_data[rgba_idx + 3] = 255;
            }
        }

        Some(Frame::new(
            self.width,
            self.height,
            rgba_data,
            self.timestamp_ms,
            self.frame_number,
        ))
    }
}

/// 离屏采样画布
///
/// 把当前帧画到复用的画布上（可选水平镜像，和自拍预览一致），
/// 检测只读画布，不做逐帧分配。
pub struct FrameSampler {
    canvas: RgbaImage,
    mirror: bool,
    stride: u32,
}

impl FrameSampler {
    pub fn new(stride: u32, mirror: bool) -> Self {
        Self {
            canvas: RgbaImage::new(0, 0),
            mirror,
            stride: stride.max(1),
        }
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// 返回 `None` 表示视频源还没准备好
    pub fn sample(&mut self, frame: &Frame) -> Option<&RgbaImage> {
        if !frame.is_ready() {
            return None;
        }

        let byte_len = frame.byte_len()?;
        if self.canvas.dimensions() != (frame.width, frame.height) {
            self.canvas = RgbaImage::new(frame.width, frame.height);
        }
        let canvas: &mut [u8] = &mut self.canvas;
        canvas.copy_from_slice(&frame.data[..byte_len]);

        if self.mirror {
            image::imageops::flip_horizontal_in_place(&mut self.canvas);
        }

        Some(&self.canvas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_creation() {
        let data = vec![255u8; 100 * 100 * 4];
        let frame = Frame::new(100, 100, data, 1000, 30);

        assert_eq!(frame.width, 100);
        assert_eq!(frame.height, 100);
        assert_eq!(frame.pixel_count(), Some(10000));
        assert_eq!(frame.timestamp.as_millis(), 1000);
        assert_eq!(frame.frame_number, 30);
        assert!(frame.is_ready());
    }

    #[test]
    fn test_zero_sized_frame_not_ready() {
        let frame = Frame::new(0, 0, vec![], 0, 0);
        assert!(!frame.is_ready());

        let mut sampler = FrameSampler::new(4, true);
        assert!(sampler.sample(&frame).is_none());
    }

    #[test]
    fn test_sampler_mirrors_horizontally() {
        // 2x1: 左红右蓝
        let frame = Frame::new(2, 1, vec![255, 0, 0, 255, 0, 0, 255, 255], 0, 0);

        let mut mirrored = FrameSampler::new(1, true);
        let canvas = mirrored.sample(&frame).unwrap();
        assert_eq!(canvas.get_pixel(0, 0).0, [0, 0, 255, 255]);
        assert_eq!(canvas.get_pixel(1, 0).0, [255, 0, 0, 255]);

        let mut plain = FrameSampler::new(1, false);
        let canvas = plain.sample(&frame).unwrap();
        assert_eq!(canvas.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_sampler_reuses_canvas_and_tracks_resize() {
        let mut sampler = FrameSampler::new(4, false);
        let small = Frame::new(8, 8, vec![10; 8 * 8 * 4], 0, 0);
        let large = Frame::new(16, 8, vec![20; 16 * 8 * 4], 0, 1);

        assert_eq!(sampler.sample(&small).unwrap().dimensions(), (8, 8));
        assert_eq!(sampler.sample(&large).unwrap().dimensions(), (16, 8));
        assert_eq!(sampler.sample(&large).unwrap().get_pixel(3, 3).0, [20; 4]);
    }

    #[test]
    fn test_frame_to_data_uri() {
        let frame = Frame::new(16, 16, vec![200u8; 16 * 16 * 4], 0, 0);
        let uri = frame.to_data_uri(80).unwrap();
        assert!(uri.starts_with("data:image/jpeg;base64,"));

        let payload = uri.trim_start_matches("data:image/jpeg;base64,");
        let bytes = base64::engine::general_purpose::STANDARD.decode(payload).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), image::ImageFormat::Jpeg);
    }

    #[test]
    fn test_yuv_to_rgba() {
        let width = 64;
        let height = 64;
        let raw_frame = RawFrame {
            width,
            height,
            y_plane: vec![128u8; (width * height) as usize],
            u_plane: vec![128u8; (width * height / 4) as usize],
            v_plane: vec![128u8; (width * height / 4) as usize],
            timestamp_ms: 0,
            frame_number: 0,
        };

        let frame = raw_frame.to_rgba().unwrap();
        assert_eq!(frame.width, width);
        assert_eq!(frame.height, height);
        assert_eq!(frame.data.len(), (width * height * 4) as usize);
        assert_eq!(&frame.data[0..4], &[128, 128, 128, 255]);
    }

    #[test]
    fn test_oversized_dimensions_not_ready() {
        let frame = Frame::new(70_000, 70_000, vec![], 0, 0);
        assert!(!frame.is_ready());

        let frame = Frame::new(u32::MAX, u32::MAX, vec![0; 16], 0, 0);
        assert!(!frame.is_ready());
        let mut sampler = FrameSampler::new(4, false);
        assert!(sampler.sample(&frame).is_none());
    }

    #[test]
    fn test_yuv_with_short_planes_is_rejected() {
        let empty = RawFrame {
            width: 64,
            height: 48,
            y_plane: vec![],
            u_plane: vec![],
            v_plane: vec![],
            timestamp_ms: 0,
            frame_number: 0,
        };
        assert!(empty.to_rgba().is_none());

        // 亮度完整，色度缺一行
        let short_chroma = RawFrame {
            y_plane: vec![128; 64 * 48],
            u_plane: vec![128; 32 * 23],
            v_plane: vec![128; 32 * 24],
            ..empty
        };
        assert!(short_chroma.to_rgba().is_none());

        let zero = RawFrame {
            width: 0,
            height: 0,
            y_plane: vec![],
            u_plane: vec![],
            v_plane: vec![],
            timestamp_ms: 0,
            frame_number: 0,
        };
        assert!(zero.to_rgba().is_none());
    }

    #[test]
    fn test_yuv_odd_dimensions() {
        // 3x3 -> 色度 2x2
        let raw = RawFrame {
            width: 3,
            height: 3,
            y_plane: vec![200; 9],
            u_plane: vec![128; 4],
            v_plane: vec![128; 4],
            timestamp_ms: 0,
            frame_number: 0,
        };
        let frame = raw.to_rgba().unwrap();
        assert!(frame.is_ready());
        assert_eq!(&frame.data[32..36], &[200, 200, 200, 255]);
    }
}
