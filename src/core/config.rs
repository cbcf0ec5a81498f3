use std::time::Duration;

use crate::core::ai::prediction::PollPolicy;
use crate::core::ai::retry::RetryPolicy;

pub const DEFAULT_GEMINI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_REPLICATE_BASE: &str = "https://api.replicate.com/v1";

const DEFAULT_ANALYSIS_MODELS: &[&str] = &["gemini-2.0-flash", "gemini-1.5-flash"];
const DEFAULT_IMAGE_MODELS: &[&str] = &[
    "gemini-2.0-flash-preview-image-generation",
    "gemini-2.0-flash-exp-image-generation",
    "gemini-2.0-flash-exp",
];

/// AI 相关配置，凭证缺失时只影响对应请求
#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    pub gemini_api_key: Option<String>,
    pub replicate_api_token: Option<String>,
    pub gemini_base_url: String,
    pub replicate_base_url: String,
    /// 按顺序尝试
    pub analysis_models: Vec<String>,
    pub image_models: Vec<String>,
    pub hairstyle_transfer_version: Option<String>,
    pub retry: RetryPolicy,
    pub poll: PollPolicy,
    pub request_timeout: Duration,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            replicate_api_token: None,
            gemini_base_url: DEFAULT_GEMINI_BASE.to_string(),
            replicate_base_url: DEFAULT_REPLICATE_BASE.to_string(),
            analysis_models: to_owned_list(DEFAULT_ANALYSIS_MODELS),
            image_models: to_owned_list(DEFAULT_IMAGE_MODELS),
            hairstyle_transfer_version: None,
            retry: RetryPolicy::default(),
            poll: PollPolicy::default(),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl AdvisorConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源读取，空值视为未设置
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        Self {
            gemini_api_key: get("GEMINI_API_KEY").or_else(|| get("GOOGLE_API_KEY")),
            replicate_api_token: get("REPLICATE_API_TOKEN"),
            gemini_base_url: get("GEMINI_API_BASE").unwrap_or(defaults.gemini_base_url),
            replicate_base_url: get("REPLICATE_API_BASE").unwrap_or(defaults.replicate_base_url),
            analysis_models: get("ANALYSIS_MODELS")
                .map(|v| parse_list(&v))
                .filter(|l| !l.is_empty())
                .unwrap_or(defaults.analysis_models),
            image_models: get("IMAGE_MODELS")
                .map(|v| parse_list(&v))
                .filter(|l| !l.is_empty())
                .unwrap_or(defaults.image_models),
            hairstyle_transfer_version: get("HAIRSTYLE_TRANSFER_VERSION"),
            ..defaults
        }
    }

    pub fn with_gemini_key(mut self, key: impl Into<String>) -> Self {
        self.gemini_api_key = Some(key.into());
        self
    }

    pub fn with_replicate_token(mut self, token: impl Into<String>) -> Self {
        self.replicate_api_token = Some(token.into());
        self
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
