use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};

use crate::core::ai::error::AiError;
use crate::core::ai::transport::{HttpRequest, HttpResponse, HttpTransport};
use crate::core::clock::Sleeper;

pub const STATUS_TOO_MANY_REQUESTS: u16 = 429;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 首次之外最多再试几次
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// 第 `attempt` 次失败后的等待：base * 2^attempt
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

/// 429 和网络错误按指数退避重试，其余非 2xx 原样返回给调用方分类
pub struct RetryableFetcher {
    transport: Arc<dyn HttpTransport>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
}

impl RetryableFetcher {
    pub fn new(transport: Arc<dyn HttpTransport>, sleeper: Arc<dyn Sleeper>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            sleeper,
            policy,
        }
    }

    pub fn sleeper(&self) -> &dyn Sleeper {
        self.sleeper.as_ref()
    }

    pub fn fetch_with_retry(&self, request: &HttpRequest) -> Result<HttpResponse, AiError> {
        let mut attempt = 0u32;
        loop {
            let can_retry = attempt < self.policy.max_retries;

            match self.transport.send(request) {
                Ok(resp) if resp.status == STATUS_TOO_MANY_REQUESTS && can_retry => {
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        "⏳ Rate limited by {}, retrying in {:?} (attempt {}/{})",
                        request.url,
                        delay,
                        attempt + 1,
                        self.policy.max_retries + 1
                    );
                    self.sleeper.sleep(delay);
                }
                Ok(resp) => {
                    debug!("⬅️ {} -> {}", request.url, resp.status);
                    return Ok(resp);
                }
                Err(e) if can_retry => {
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        "🌐 Network error on {}: {}, retrying in {:?}",
                        request.url, e, delay
                    );
                    self.sleeper.sleep(delay);
                }
                Err(e) => {
                    warn!("❌ Giving up on {} after {} attempts", request.url, attempt + 1);
                    return Err(AiError::Network(e.to_string()));
                }
            }

            attempt += 1;
        }
    }
}
