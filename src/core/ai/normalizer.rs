//! 把各模型五花八门的输出统一成 [`NormalizedRecommendation`]

use std::collections::BTreeMap;

use log::{debug, warn};
use serde_json::{Map, Value};

use crate::core::ai::descriptor::{FieldAliases, KindDescriptor};
use crate::core::ai::error::AiError;
use crate::models::analysis::{
    AnalysisResult, MaintenanceLevel, NormalizedRecommendation, ResultSource,
};

pub const LIVE_ADVISORY: &str = "AI-generated recommendations based on your photo.";

/// 分数缺失时的中性值
pub const NEUTRAL_SCORE: f32 = 0.5;

const FACE_SHAPE_KEYS: &[&str] = &["faceShape", "face_shape", "shape"];
const SKIN_TONE_KEYS: &[&str] = &["skinTone", "skin_tone", "complexion"];
const UNDERTONE_KEYS: &[&str] = &["undertone", "skinUndertone", "under_tone"];
const SUMMARY_KEYS: &[&str] = &["summary", "analysis", "overview", "overallAnalysis"];

pub struct RecommendationNormalizer<'a> {
    descriptor: &'a KindDescriptor,
}

impl<'a> RecommendationNormalizer<'a> {
    pub fn new(descriptor: &'a KindDescriptor) -> Self {
        Self { descriptor }
    }

    /// 整个分析结果：顶层字段 + 推荐列表
    pub fn normalize_result(&self, raw: &Value) -> Result<AnalysisResult, AiError> {
        let (root, list) = match raw {
            Value::Array(items) => (None, items),
            Value::Object(obj) => {
                let list = self
                    .descriptor
                    .list_keys
                    .iter()
                    .find_map(|k| obj.get(*k).and_then(Value::as_array))
                    .ok_or_else(|| {
                        AiError::MalformedResponse("response has no recommendations list".to_string())
                    })?;
                (Some(obj), list)
            }
            _ => {
                return Err(AiError::MalformedResponse(
                    "response is neither an object nor a list".to_string(),
                ))
            }
        };

        let recommendations: Vec<_> = list
            .iter()
            .filter_map(|item| match item.as_object() {
                Some(obj) => Some(self.normalize_object(obj)),
                None => {
                    warn!("⚠️ Skipping non-object recommendation: {}", item);
                    None
                }
            })
            .collect();

        if recommendations.is_empty() {
            return Err(AiError::MalformedResponse("recommendations list is empty".to_string()));
        }

        let field = |keys: &[&str]| root.map(|o| text_field(o, keys)).unwrap_or_default();

        debug!(
            "🧹 Normalized {} {} recommendations",
            recommendations.len(),
            self.descriptor.kind.as_str()
        );

        Ok(AnalysisResult {
            kind: self.descriptor.kind,
            face_shape: field(FACE_SHAPE_KEYS),
            skin_tone: field(SKIN_TONE_KEYS),
            undertone: field(UNDERTONE_KEYS),
            summary: field(SUMMARY_KEYS),
            recommendations,
            source: ResultSource::Live,
            advisory: LIVE_ADVISORY.to_string(),
        })
    }

    /// 单条推荐，缺失字段取中性默认值，不会失败
    pub fn normalize(&self, raw: &Value) -> NormalizedRecommendation {
        match raw.as_object() {
            Some(obj) => self.normalize_object(obj),
            None => self.normalize_object(&Map::new()),
        }
    }

    fn normalize_object(&self, obj: &Map<String, Value>) -> NormalizedRecommendation {
        let d = self.descriptor;

        let suitability_score = lookup(obj, &d.score)
            .and_then(parse_score)
            .map(normalize_score)
            .unwrap_or(NEUTRAL_SCORE);

        let maintenance_level = lookup(obj, &d.maintenance)
            .and_then(value_to_text)
            .map(|s| MaintenanceLevel::parse_loose(&s))
            .unwrap_or_default();

        let mut extras = BTreeMap::new();
        for extra in d.extras {
            if let Some(text) = lookup(obj, extra).and_then(value_to_text) {
                if !text.is_empty() {
                    extras.insert(extra.canonical.to_string(), text);
                }
            }
        }

        NormalizedRecommendation {
            name: text_field(obj, d.name.aliases),
            description: text_field(obj, d.description.aliases),
            suitability_score,
            maintenance_level,
            styling_tips: lookup(obj, &d.styling_tips).map(string_list).unwrap_or_default(),
            best_for: lookup(obj, &d.best_for).map(string_list).unwrap_or_default(),
            extras,
        }
    }
}

/// 0-100 的分数除以 100，再夹到 [0, 1]
pub fn normalize_score(raw: f64) -> f32 {
    let scaled = if raw > 1.0 { raw / 100.0 } else { raw };
    scaled.clamp(0.0, 1.0) as f32
}

fn parse_score(value: &Value) -> Option<f64> {
    let score = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    score.filter(|v| v.is_finite())
}

fn lookup<'v>(obj: &'v Map<String, Value>, field: &FieldAliases) -> Option<&'v Value> {
    field
        .aliases
        .iter()
        .find_map(|k| obj.get(*k).filter(|v| !v.is_null()))
}

fn text_field(obj: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|k| obj.get(*k).and_then(value_to_text))
        .unwrap_or_default()
}

fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let parts: Vec<_> = items.iter().filter_map(value_to_text).collect();
            Some(parts.join(", "))
        }
        _ => None,
    }
}

/// 数组或单个字符串都接受
fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(value_to_text)
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ai::descriptor::descriptor_for;
    use crate::models::analysis::AnalysisKind;
    use serde_json::json;

    fn normalizer(kind: AnalysisKind) -> RecommendationNormalizer<'static> {
        RecommendationNormalizer::new(descriptor_for(kind))
    }

    #[test]
    fn test_percentage_score_and_aliases() {
        let rec = normalizer(AnalysisKind::Hairstyle).normalize(&json!({
            "matchScore": 95,
            "whyItWorks": "x"
        }));

        assert!((rec.suitability_score - 0.95).abs() < 1e-6);
        assert_eq!(rec.description, "x");
        assert_eq!(rec.maintenance_level, MaintenanceLevel::Medium);
        assert!(rec.styling_tips.is_empty());
        assert!(rec.best_for.is_empty());
        assert_eq!(rec.name, "");
    }

    #[test]
    fn test_unit_score_not_rescaled() {
        let rec = normalizer(AnalysisKind::Color).normalize(&json!({"suitabilityScore": 0.8}));
        assert!((rec.suitability_score - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_score_edge_values() {
        assert_eq!(normalize_score(1.0), 1.0);
        assert_eq!(normalize_score(100.0), 1.0);
        assert_eq!(normalize_score(250.0), 1.0);
        assert_eq!(normalize_score(-3.0), 0.0);

        let n = normalizer(AnalysisKind::Hairstyle);
        assert!((n.normalize(&json!({"score": "85%"})).suitability_score - 0.85).abs() < 1e-6);
        assert_eq!(n.normalize(&json!({"score": "n/a"})).suitability_score, NEUTRAL_SCORE);
        assert_eq!(n.normalize(&json!({})).suitability_score, NEUTRAL_SCORE);
    }

    #[test]
    fn test_kind_specific_extras() {
        let hair = normalizer(AnalysisKind::Hairstyle).normalize(&json!({
            "name": "Modern Shag",
            "cuttingInstructions": "Point cut the ends",
            "maintenance": "low",
            "tips": "Use sea salt spray",
            "bestFor": ["wavy hair", 3, null]
        }));
        assert_eq!(hair.extra("cuttingTechnique"), Some("Point cut the ends"));
        assert_eq!(hair.maintenance_level, MaintenanceLevel::Low);
        assert_eq!(hair.styling_tips, vec!["Use sea salt spray"]);
        assert_eq!(hair.best_for, vec!["wavy hair", "3"]);

        let color = normalizer(AnalysisKind::Color).normalize(&json!({
            "colorName": "Copper Auburn",
            "hex": "#B4552D",
            "cuttingTechnique": "ignored for color"
        }));
        assert_eq!(color.name, "Copper Auburn");
        assert_eq!(color.extra("hexCode"), Some("#B4552D"));
        assert_eq!(color.extra("cuttingTechnique"), None);
    }

    #[test]
    fn test_normalize_full_result() {
        let raw = json!({
            "faceShape": "oval",
            "skinTone": "light",
            "undertone": "warm",
            "summary": "Balanced features.",
            "hairstyles": [
                {"name": "Textured Lob", "matchScore": 92},
                "not an object",
                {"name": "Long Layers", "suitabilityScore": 0.7, "maintenanceLevel": "High"}
            ]
        });

        let result = normalizer(AnalysisKind::Hairstyle).normalize_result(&raw).unwrap();
        assert_eq!(result.face_shape, "oval");
        assert_eq!(result.undertone, "warm");
        assert_eq!(result.source, ResultSource::Live);
        assert_eq!(result.recommendations.len(), 2);
        assert_eq!(result.recommendations[1].maintenance_level, MaintenanceLevel::High);
    }

    #[test]
    fn test_bare_array_result() {
        let raw = json!([{"name": "Ash Brown", "score": 70}]);
        let result = normalizer(AnalysisKind::Color).normalize_result(&raw).unwrap();
        assert_eq!(result.kind, AnalysisKind::Color);
        assert_eq!(result.face_shape, "");
        assert_eq!(result.recommendations[0].name, "Ash Brown");
    }

    #[test]
    fn test_missing_recommendations_is_malformed() {
        let n = normalizer(AnalysisKind::Hairstyle);
        for raw in [json!({"faceShape": "oval"}), json!({"recommendations": []}), json!("text")] {
            assert!(matches!(
                n.normalize_result(&raw),
                Err(AiError::MalformedResponse(_))
            ));
        }
    }
}
