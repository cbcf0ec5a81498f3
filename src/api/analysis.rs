//! 照片分析接口

use flutter_rust_bridge::frb;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::{shared_advisor, ApiFailure};
use crate::core::ai::{fallback_result, AiError, StyleAdvisor};
use crate::models::analysis::{AnalysisKind, AnalysisRequest, AnalysisResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzePhotoRequest {
    /// `data:image/...;base64,...`
    pub image_src: String,
    /// `hair` 或 `color`
    pub analysis_type: String,
}

/// HTTP 风格的响应：状态码 + JSON 响应体
///
/// 成功：`{"success": true, "data": AnalysisResult}`
/// 失败：`{"error": "...", "useFallback": true, "errorCode": "..."}`
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzePhotoReply {
    pub status: u16,
    pub body: String,
}

impl AnalyzePhotoReply {
    fn success(result: &AnalysisResult) -> Self {
        Self {
            status: 200,
            body: json!({ "success": true, "data": result }).to_string(),
        }
    }

    fn failure(failure: &ApiFailure) -> Self {
        Self {
            status: failure.status,
            body: serde_json::to_string(failure).unwrap_or_else(|_| {
                format!("{{\"error\":\"internal error\",\"useFallback\":true,\"errorCode\":\"{}\"}}", failure.error_code)
            }),
        }
    }
}

/// 分析照片，返回状态码和 JSON 响应体
///
/// ```dart
/// final reply = await analyzePhoto(request: AnalyzePhotoRequest(imageSrc: uri, analysisType: 'hair'));
/// if (reply.status != 200) { /* 用 fallbackAnalysis */ }
/// ```
#[frb]
pub fn analyze_photo(request: AnalyzePhotoRequest) -> AnalyzePhotoReply {
    match shared_advisor() {
        Ok(advisor) => analyze_with(advisor, &request),
        Err(e) => AnalyzePhotoReply::failure(&ApiFailure::from(e)),
    }
}

/// 分析原始图片字节（例如引导会话抓拍后解码的 JPEG）
#[frb]
pub fn analyze_image_bytes(image: Vec<u8>, kind: AnalysisKind) -> AnalyzePhotoReply {
    match shared_advisor() {
        Ok(advisor) => analyze_bytes_with(advisor, &image, kind),
        Err(e) => AnalyzePhotoReply::failure(&ApiFailure::from(e)),
    }
}

/// 分析照片，失败时直接给出兜底结果
#[frb]
pub fn analyze_photo_or_fallback(request: AnalyzePhotoRequest) -> AnalysisResult {
    let kind = AnalysisKind::from_wire(&request.analysis_type).unwrap_or(AnalysisKind::Hairstyle);
    match shared_advisor() {
        Ok(advisor) => analyze_or_fallback_with(advisor, &request),
        Err(e) => {
            warn!("🛟 Advisor unavailable, using fallback: {}", e);
            fallback_result(kind)
        }
    }
}

/// 本地兜底数据
#[frb(sync)]
pub fn fallback_analysis(kind: AnalysisKind) -> AnalysisResult {
    fallback_result(kind)
}

fn build_request(request: &AnalyzePhotoRequest) -> Result<AnalysisRequest, AiError> {
    let kind = AnalysisKind::from_wire(&request.analysis_type).ok_or_else(|| {
        AiError::InvalidInput(format!("unknown analysisType: {}", request.analysis_type))
    })?;
    AnalysisRequest::from_data_uri(&request.image_src, kind)
}

fn analyze_with(advisor: &StyleAdvisor, request: &AnalyzePhotoRequest) -> AnalyzePhotoReply {
    reply(build_request(request).and_then(|req| advisor.analyze(&req)))
}

fn analyze_bytes_with(advisor: &StyleAdvisor, image: &[u8], kind: AnalysisKind) -> AnalyzePhotoReply {
    reply(AnalysisRequest::from_image_bytes(image, kind).and_then(|req| advisor.analyze(&req)))
}

fn reply(result: Result<AnalysisResult, AiError>) -> AnalyzePhotoReply {
    match result {
        Ok(result) => {
            info!("✅ Analysis complete: {} recommendations", result.recommendations.len());
            AnalyzePhotoReply::success(&result)
        }
        Err(e) => {
            warn!("❌ Analysis failed [{}]: {}", e.error_code(), e);
            AnalyzePhotoReply::failure(&ApiFailure::from(e))
        }
    }
}

fn analyze_or_fallback_with(advisor: &StyleAdvisor, request: &AnalyzePhotoRequest) -> AnalysisResult {
    match build_request(request) {
        Ok(req) => advisor.analyze_or_fallback(&req),
        Err(e) => {
            let kind = AnalysisKind::from_wire(&request.analysis_type).unwrap_or(AnalysisKind::Hairstyle);
            warn!("🛟 Invalid analysis request, using fallback: {}", e);
            fallback_result(kind)
        }
    }
}
