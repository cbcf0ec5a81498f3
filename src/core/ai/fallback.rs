use log::{info, warn};
use serde_json::Value;

use crate::core::ai::error::AiError;
use crate::core::ai::extractor::{extract_image, extract_text, ImageExtraction};
use crate::core::ai::gemini::{GenerateContentRequest, GenerateContentResponse};
use crate::core::ai::retry::{RetryableFetcher, STATUS_TOO_MANY_REQUESTS};
use crate::core::ai::transport::HttpRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStatus {
    Pending,
    Success,
    FailedTransient,
    FailedFatal,
}

/// 单个候选模型的尝试记录
#[derive(Debug, Clone, PartialEq)]
pub struct AiModelAttempt {
    pub model_id: String,
    pub status: AttemptStatus,
    pub raw_response: Option<Value>,
    pub error: Option<AiError>,
}

impl AiModelAttempt {
    fn pending(model_id: &str) -> Self {
        Self {
            model_id: model_id.to_string(),
            status: AttemptStatus::Pending,
            raw_response: None,
            error: None,
        }
    }

    fn fail(&mut self, error: AiError) {
        self.status = if error.is_transient() {
            AttemptStatus::FailedTransient
        } else {
            AttemptStatus::FailedFatal
        };
        self.error = Some(error);
    }
}

/// 调用方期望的输出类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    Text,
    Image,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutput {
    Text(String),
    Image {
        data_uri: String,
        mime_type: String,
        caption: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct FallbackSuccess {
    pub model_id: String,
    pub output: ModelOutput,
    pub attempts: Vec<AiModelAttempt>,
}

/// 按顺序逐个尝试候选模型，第一个给出可用结果的胜出
///
/// 模型之间严格串行；单个模型内只有 [`RetryableFetcher`] 的网络重试。
pub struct ModelFallbackOrchestrator<'a> {
    fetcher: &'a RetryableFetcher,
    base_url: &'a str,
    api_key: &'a str,
}

impl<'a> ModelFallbackOrchestrator<'a> {
    pub fn new(fetcher: &'a RetryableFetcher, base_url: &'a str, api_key: &'a str) -> Self {
        Self {
            fetcher,
            base_url: base_url.trim_end_matches('/'),
            api_key,
        }
    }

    pub fn run(
        &self,
        models: &[String],
        payload: &GenerateContentRequest,
        expect: Expect,
    ) -> Result<FallbackSuccess, AiError> {
        if models.is_empty() {
            return Err(AiError::Config("no candidate models configured".to_string()));
        }

        let body = serde_json::to_value(payload)?;
        let mut attempts = Vec::with_capacity(models.len());
        let mut last_error = None;

        for model_id in models {
            let mut attempt = AiModelAttempt::pending(model_id);
            info!("🤖 Trying model {} ({}/{})", model_id, attempts.len() + 1, models.len());

            match self.attempt(model_id, &body, expect, &mut attempt) {
                Ok(output) => {
                    attempt.status = AttemptStatus::Success;
                    attempts.push(attempt);
                    info!("✅ Model {} succeeded", model_id);
                    return Ok(FallbackSuccess {
                        model_id: model_id.clone(),
                        output,
                        attempts,
                    });
                }
                Err(e) => {
                    warn!("⚠️ Model {} failed: {}", model_id, e);
                    attempt.fail(e.clone());
                    attempts.push(attempt);
                    last_error = Some(e);
                }
            }
        }

        let last = last_error.unwrap_or_else(|| AiError::Config("no candidate models configured".to_string()));
        Err(AiError::AllModelsFailed {
            attempts: attempts.len(),
            last: Box::new(last),
        })
    }

    fn endpoint(&self, model_id: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model_id)
    }

    fn attempt(
        &self,
        model_id: &str,
        body: &Value,
        expect: Expect,
        record: &mut AiModelAttempt,
    ) -> Result<ModelOutput, AiError> {
        let request = HttpRequest::post_json(self.endpoint(model_id), body.clone())
            .header("x-goog-api-key", self.api_key);
        let resp = self.fetcher.fetch_with_retry(&request)?;

        if resp.status == STATUS_TOO_MANY_REQUESTS {
            return Err(AiError::RateLimited { body: resp.body });
        }
        if !resp.is_success() {
            return Err(AiError::UpstreamRejection {
                status: resp.status,
                body: resp.body,
            });
        }

        let raw: Value = resp.json()?;
        record.raw_response = Some(raw.clone());
        let parsed: GenerateContentResponse = serde_json::from_value(raw)?;

        match expect {
            Expect::Text => extract_text(&parsed).map(ModelOutput::Text).ok_or_else(|| {
                AiError::MalformedResponse(format!(
                    "empty text response (finish reason: {})",
                    parsed.finish_reason().unwrap_or("unknown")
                ))
            }),
            Expect::Image => match extract_image(&parsed) {
                ImageExtraction::Image {
                    data_uri,
                    mime_type,
                    caption,
                } => Ok(ModelOutput::Image {
                    data_uri,
                    mime_type,
                    caption,
                }),
                ImageExtraction::TextOnly(text) => Err(AiError::NoImage(text)),
                ImageExtraction::Empty => Err(AiError::MalformedResponse(format!(
                    "response has no content parts (finish reason: {})",
                    parsed.finish_reason().unwrap_or("unknown")
                ))),
            },
        }
    }
}
