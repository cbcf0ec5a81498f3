pub mod dataset;
pub mod descriptor;
pub mod error;
pub mod extractor;
pub mod fallback;
pub mod gemini;
pub mod normalizer;
pub mod prediction;
pub mod retry;
pub mod transport;

use std::sync::Arc;

use log::{info, warn};
use serde_json::json;

pub use dataset::{fallback_result, FallbackDatasetProvider};
pub use error::AiError;
pub use fallback::{AiModelAttempt, AttemptStatus, Expect, ModelFallbackOrchestrator, ModelOutput};
pub use retry::{RetryPolicy, RetryableFetcher};
pub use transport::{HttpTransport, ReqwestTransport, TransportError};

use crate::core::clock::{Sleeper, ThreadSleeper};
use crate::core::config::AdvisorConfig;
use crate::models::analysis::{AnalysisRequest, AnalysisResult};
use crate::models::preview::{GeneratedImage, PreviewRequest, TransferRequest};
use descriptor::{descriptor_for, preview_prompt};
use extractor::extract_json;
use gemini::{GenerateContentRequest, GenerationConfig};
use normalizer::RecommendationNormalizer;
use prediction::PredictionClient;

/// 风格分析入口：照片分析、效果预览、发型迁移
pub struct StyleAdvisor {
    config: AdvisorConfig,
    fetcher: RetryableFetcher,
}

impl StyleAdvisor {
    pub fn new(config: AdvisorConfig) -> Result<Self, AiError> {
        let transport = ReqwestTransport::new(config.request_timeout)
            .map_err(|e| AiError::Network(e.to_string()))?;
        Ok(Self::with_transport(config, Arc::new(transport), Arc::new(ThreadSleeper)))
    }

    pub fn from_env() -> Result<Self, AiError> {
        Self::new(AdvisorConfig::from_env())
    }

    pub fn with_transport(
        config: AdvisorConfig,
        transport: Arc<dyn HttpTransport>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        let fetcher = RetryableFetcher::new(transport, sleeper, config.retry.clone());
        Self { config, fetcher }
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    /// 分析照片，任何一步失败都返回错误，由调用方决定是否兜底
    pub fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AiError> {
        let api_key = self.gemini_key()?;
        let descriptor = descriptor_for(request.kind());
        info!("🔍 Analyzing photo ({})", request.kind().as_str());

        let payload = GenerateContentRequest::prompt_with_image(
            descriptor.prompt,
            request.mime_type(),
            request.image_data(),
            GenerationConfig::for_text(),
        );
        let success = ModelFallbackOrchestrator::new(&self.fetcher, &self.config.gemini_base_url, api_key)
            .run(&self.config.analysis_models, &payload, Expect::Text)?;

        let text = match success.output {
            ModelOutput::Text(text) => text,
            ModelOutput::Image { caption, .. } => caption.unwrap_or_default(),
        };
        let raw = extract_json(&text)?;
        RecommendationNormalizer::new(descriptor).normalize_result(&raw)
    }

    /// 永远返回可渲染的结果，失败时替换为本地数据
    pub fn analyze_or_fallback(&self, request: &AnalysisRequest) -> AnalysisResult {
        match self.analyze(request) {
            Ok(result) => result,
            Err(e) => {
                warn!("🛟 Using fallback dataset for {}: {}", request.kind().as_str(), e);
                fallback_result(request.kind())
            }
        }
    }

    /// 在照片上渲染某个推荐的效果
    pub fn render_preview(&self, request: &PreviewRequest) -> Result<GeneratedImage, AiError> {
        let api_key = self.gemini_key()?;
        if request.style_name.trim().is_empty() {
            return Err(AiError::InvalidInput("styleName is empty".to_string()));
        }
        let photo = AnalysisRequest::from_data_uri(&request.image_src, request.kind)?;
        info!("🎨 Rendering {} preview: {}", request.kind.as_str(), request.style_name);

        let prompt = preview_prompt(request.kind, request.style_name.trim(), request.detail.as_deref());
        let payload = GenerateContentRequest::prompt_with_image(
            &prompt,
            photo.mime_type(),
            photo.image_data(),
            GenerationConfig::for_image(),
        );
        let success = ModelFallbackOrchestrator::new(&self.fetcher, &self.config.gemini_base_url, api_key)
            .run(&self.config.image_models, &payload, Expect::Image)?;

        match success.output {
            ModelOutput::Image {
                data_uri,
                mime_type,
                caption,
            } => Ok(GeneratedImage {
                data_uri,
                mime_type,
                model_id: success.model_id,
                caption,
            }),
            ModelOutput::Text(text) => Err(AiError::NoImage(text)),
        }
    }

    /// 通过预测服务做发型迁移，返回结果图片 URL
    pub fn transfer_hairstyle(&self, request: &TransferRequest) -> Result<String, AiError> {
        let token = self
            .config
            .replicate_api_token
            .as_deref()
            .ok_or_else(|| AiError::Config("REPLICATE_API_TOKEN is not set".to_string()))?;
        let version = self
            .config
            .hairstyle_transfer_version
            .as_deref()
            .ok_or_else(|| AiError::Config("HAIRSTYLE_TRANSFER_VERSION is not set".to_string()))?;

        if !request.face_image.starts_with("data:image/") && !request.face_image.starts_with("http") {
            return Err(AiError::InvalidInput(
                "faceImage must be an image data URI or URL".to_string(),
            ));
        }
        if request.hairstyle_description.trim().is_empty() && request.hairstyle_image.is_none() {
            return Err(AiError::InvalidInput(
                "either hairstyleDescription or hairstyleImage is required".to_string(),
            ));
        }

        let mut input = json!({
            "face_image": request.face_image,
            "hairstyle_description": request.hairstyle_description.trim(),
        });
        if let Some(image) = &request.hairstyle_image {
            input["hairstyle_image"] = json!(image);
        }

        info!("💇 Submitting hairstyle transfer");
        PredictionClient::new(&self.fetcher, &self.config.replicate_base_url, token, &self.config.poll)
            .run(version, input)
    }

    fn gemini_key(&self) -> Result<&str, AiError> {
        self.config
            .gemini_api_key
            .as_deref()
            .ok_or_else(|| AiError::Config("GEMINI_API_KEY is not set".to_string()))
    }
}
