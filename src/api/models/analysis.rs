use std::collections::BTreeMap;

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::core::ai::AiError;

/// 分析类型，UI 侧传 `hair` / `color`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalysisKind {
    #[serde(rename = "hair", alias = "hairstyle")]
    Hairstyle,
    #[serde(rename = "color", alias = "colour")]
    Color,
}

impl AnalysisKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::Hairstyle => "hair",
            AnalysisKind::Color => "color",
        }
    }

    /// UI 传来的 `analysisType`，大小写不敏感
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "hair" | "hairstyle" => Some(AnalysisKind::Hairstyle),
            "color" | "colour" => Some(AnalysisKind::Color),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MaintenanceLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl MaintenanceLevel {
    /// 宽松解析，认不出来就是 Medium
    pub fn parse_loose(raw: &str) -> Self {
        let lower = raw.trim().to_ascii_lowercase();
        if lower.starts_with("low") || lower == "minimal" || lower == "easy" {
            MaintenanceLevel::Low
        } else if lower.starts_with("high") || lower == "demanding" {
            MaintenanceLevel::High
        } else {
            MaintenanceLevel::Medium
        }
    }
}

/// 统一后的推荐项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRecommendation {
    pub name: String,
    pub description: String,
    /// 始终在 [0, 1]
    pub suitability_score: f32,
    pub maintenance_level: MaintenanceLevel,
    pub styling_tips: Vec<String>,
    pub best_for: Vec<String>,
    /// 按分析类型附带的字段（hexCode、cuttingTechnique 等）
    #[serde(flatten)]
    pub extras: BTreeMap<String, String>,
}

impl NormalizedRecommendation {
    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extras.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultSource {
    Live,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub kind: AnalysisKind,
    pub face_shape: String,
    pub skin_tone: String,
    pub undertone: String,
    pub summary: String,
    pub recommendations: Vec<NormalizedRecommendation>,
    pub source: ResultSource,
    /// 提示用户这是 AI 生成还是本地兜底
    pub advisory: String,
}

/// 一次分析请求，构建后不可变
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    image_data: String,
    mime_type: String,
    kind: AnalysisKind,
}

impl AnalysisRequest {
    /// 解析 `data:<mime>;base64,<payload>`
    pub fn from_data_uri(src: &str, kind: AnalysisKind) -> Result<Self, AiError> {
        let rest = src
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| AiError::InvalidInput("imageSrc is not a data URI".to_string()))?;
        let (mime_type, payload) = rest
            .split_once(";base64,")
            .ok_or_else(|| AiError::InvalidInput("imageSrc is not base64 encoded".to_string()))?;

        if !mime_type.starts_with("image/") {
            return Err(AiError::InvalidInput(format!(
                "unsupported mime type: {}",
                mime_type
            )));
        }

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| AiError::InvalidInput(format!("invalid base64 image: {}", e)))?;
        if image::guess_format(&bytes).is_err() {
            return Err(AiError::InvalidInput("payload is not a recognizable image".to_string()));
        }

        Ok(Self {
            image_data: payload.to_string(),
            mime_type: mime_type.to_string(),
            kind,
        })
    }

    pub fn from_image_bytes(bytes: &[u8], kind: AnalysisKind) -> Result<Self, AiError> {
        let format = image::guess_format(bytes)
            .map_err(|_| AiError::InvalidInput("payload is not a recognizable image".to_string()))?;
        let mime_type = match format {
            image::ImageFormat::Png => "image/png",
            image::ImageFormat::Jpeg => "image/jpeg",
            image::ImageFormat::Bmp => "image/bmp",
            image::ImageFormat::WebP => "image/webp",
            image::ImageFormat::Gif => "image/gif",
            other => {
                return Err(AiError::InvalidInput(format!(
                    "unsupported image format: {:?}",
                    other
                )))
            }
        };

        Ok(Self {
            image_data: base64::engine::general_purpose::STANDARD.encode(bytes),
            mime_type: mime_type.to_string(),
            kind,
        })
    }

    pub fn image_data(&self) -> &str {
        &self.image_data
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn kind(&self) -> AnalysisKind {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 最小的 PNG 文件头即可被识别
    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    fn png_data_uri() -> String {
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(PNG_MAGIC)
        )
    }

    #[test]
    fn test_kind_wire_names() {
        assert_eq!(serde_json::to_string(&AnalysisKind::Hairstyle).unwrap(), "\"hair\"");
        let kind: AnalysisKind = serde_json::from_str("\"hairstyle\"").unwrap();
        assert_eq!(kind, AnalysisKind::Hairstyle);
        let kind: AnalysisKind = serde_json::from_str("\"color\"").unwrap();
        assert_eq!(kind, AnalysisKind::Color);

        assert_eq!(AnalysisKind::from_wire(" Hair "), Some(AnalysisKind::Hairstyle));
        assert_eq!(AnalysisKind::from_wire("COLOR"), Some(AnalysisKind::Color));
        assert_eq!(AnalysisKind::from_wire("makeup"), None);
    }

    #[test]
    fn test_maintenance_parse_loose() {
        assert_eq!(MaintenanceLevel::parse_loose("LOW"), MaintenanceLevel::Low);
        assert_eq!(MaintenanceLevel::parse_loose("high maintenance"), MaintenanceLevel::High);
        assert_eq!(MaintenanceLevel::parse_loose("moderate"), MaintenanceLevel::Medium);
        assert_eq!(MaintenanceLevel::parse_loose(""), MaintenanceLevel::Medium);
    }

    #[test]
    fn test_recommendation_extras_flattened() {
        let mut extras = BTreeMap::new();
        extras.insert("hexCode".to_string(), "#C8A165".to_string());
        let rec = NormalizedRecommendation {
            name: "Honey Blonde".to_string(),
            description: String::new(),
            suitability_score: 0.9,
            maintenance_level: MaintenanceLevel::High,
            styling_tips: vec![],
            best_for: vec![],
            extras,
        };

        let value = serde_json::to_value(&rec).unwrap();
        assert_eq!(value["hexCode"], "#C8A165");
        assert_eq!(value["maintenanceLevel"], "High");
        assert_eq!(rec.extra("hexCode"), Some("#C8A165"));
    }

    #[test]
    fn test_request_from_data_uri() {
        let req = AnalysisRequest::from_data_uri(&png_data_uri(), AnalysisKind::Color).unwrap();
        assert_eq!(req.mime_type(), "image/png");
        assert_eq!(req.kind(), AnalysisKind::Color);
        assert!(!req.image_data().is_empty());
    }

    #[test]
    fn test_request_rejects_bad_input() {
        for src in [
            "https://example.com/me.png",
            "data:image/png,rawbytes",
            "data:text/plain;base64,aGVsbG8=",
            "data:image/png;base64,@@@",
            "data:image/png;base64,aGVsbG8=",
        ] {
            assert!(
                matches!(
                    AnalysisRequest::from_data_uri(src, AnalysisKind::Hairstyle),
                    Err(AiError::InvalidInput(_))
                ),
                "expected rejection for {}",
                src
            );
        }
    }

    #[test]
    fn test_request_from_bytes() {
        let req = AnalysisRequest::from_image_bytes(PNG_MAGIC, AnalysisKind::Hairstyle).unwrap();
        assert_eq!(req.mime_type(), "image/png");
    }
}
