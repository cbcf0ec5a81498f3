//! 异步预测服务：提交任务后轮询 `urls.get` 直到结束

use std::time::Duration;

use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::ai::error::AiError;
use crate::core::ai::retry::{RetryableFetcher, STATUS_TOO_MANY_REQUESTS};
use crate::core::ai::transport::{HttpRequest, HttpResponse};

#[derive(Debug, Clone)]
pub struct PollPolicy {
    pub max_polls: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_polls: 60,
            interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictionUrls {
    #[serde(default)]
    pub get: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Prediction {
    #[serde(default)]
    pub id: String,
    pub status: PredictionStatus,
    #[serde(default)]
    pub urls: PredictionUrls,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl Prediction {
    /// output 可能是字符串，也可能是字符串数组
    pub fn output_url(&self) -> Option<&str> {
        match self.output.as_ref()? {
            Value::String(s) => Some(s.as_str()),
            Value::Array(items) => items.first().and_then(Value::as_str),
            _ => None,
        }
    }

    fn error_message(&self) -> String {
        match &self.error {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => format!("prediction {} ended with status {:?}", self.id, self.status),
        }
    }
}

/// 轮询状态机：Pending → Succeeded | Failed
#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    Pending { polls: u32 },
    Succeeded(String),
    Failed(AiError),
}

impl PollState {
    pub fn start() -> Self {
        PollState::Pending { polls: 0 }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollState::Pending { .. })
    }

    /// 根据最新一次观察到的预测状态推进
    pub fn advance(self, prediction: &Prediction, policy: &PollPolicy) -> PollState {
        let polls = match self {
            PollState::Pending { polls } => polls,
            terminal => return terminal,
        };

        match prediction.status {
            PredictionStatus::Succeeded => match prediction.output_url() {
                Some(url) => PollState::Succeeded(url.to_string()),
                None => PollState::Failed(AiError::MalformedResponse(
                    "prediction succeeded without an output".to_string(),
                )),
            },
            PredictionStatus::Failed | PredictionStatus::Canceled => {
                PollState::Failed(AiError::PredictionFailed(prediction.error_message()))
            }
            PredictionStatus::Starting | PredictionStatus::Processing => {
                if polls >= policy.max_polls {
                    PollState::Failed(AiError::PollTimeout { polls })
                } else {
                    PollState::Pending { polls: polls + 1 }
                }
            }
        }
    }
}

pub struct PredictionClient<'a> {
    fetcher: &'a RetryableFetcher,
    base_url: &'a str,
    token: &'a str,
    policy: &'a PollPolicy,
}

impl<'a> PredictionClient<'a> {
    pub fn new(
        fetcher: &'a RetryableFetcher,
        base_url: &'a str,
        token: &'a str,
        policy: &'a PollPolicy,
    ) -> Self {
        Self {
            fetcher,
            base_url: base_url.trim_end_matches('/'),
            token,
            policy,
        }
    }

    /// 提交并等待结果，返回输出图片 URL
    pub fn run(&self, version: &str, input: Value) -> Result<String, AiError> {
        let mut prediction = self.submit(version, input)?;
        info!("🚀 Prediction {} submitted ({:?})", prediction.id, prediction.status);

        let mut state = PollState::start();
        loop {
            state = state.advance(&prediction, self.policy);
            match state {
                PollState::Pending { polls } => {
                    let url = prediction.urls.get.clone().ok_or_else(|| {
                        AiError::MalformedResponse("prediction has no polling url".to_string())
                    })?;
                    debug!("⏳ Prediction {} still {:?}, poll {}", prediction.id, prediction.status, polls);
                    self.fetcher.sleeper().sleep(self.policy.interval);
                    prediction = self.fetch(HttpRequest::get(url))?;
                }
                PollState::Succeeded(url) => {
                    info!("✅ Prediction {} succeeded", prediction.id);
                    return Ok(url);
                }
                PollState::Failed(e) => {
                    warn!("❌ Prediction {} failed: {}", prediction.id, e);
                    return Err(e);
                }
            }
        }
    }

    fn submit(&self, version: &str, input: Value) -> Result<Prediction, AiError> {
        let url = format!("{}/predictions", self.base_url);
        let body = json!({ "version": version, "input": input });
        self.fetch(HttpRequest::post_json(url, body))
    }

    fn fetch(&self, request: HttpRequest) -> Result<Prediction, AiError> {
        let request = request.header("Authorization", format!("Bearer {}", self.token));
        let resp = self.fetcher.fetch_with_retry(&request)?;
        parse_prediction(resp)
    }
}

fn parse_prediction(resp: HttpResponse) -> Result<Prediction, AiError> {
    if resp.status == STATUS_TOO_MANY_REQUESTS {
        return Err(AiError::RateLimited { body: resp.body });
    }
    if !resp.is_success() {
        return Err(AiError::UpstreamRejection {
            status: resp.status,
            body: resp.body,
        });
    }
    Ok(resp.json()?)
}
