pub mod analysis;
pub mod face_guide;
pub mod models;
pub mod preview;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::core::ai::{AiError, StyleAdvisor};

/// FRB 友好的失败结构，也是分析接口的失败响应体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiFailure {
    pub error: String,
    /// 调用方应改用本地兜底数据
    pub use_fallback: bool,
    pub error_code: String,
    #[serde(skip)]
    pub status: u16,
}

impl From<AiError> for ApiFailure {
    fn from(e: AiError) -> Self {
        Self {
            error: e.to_string(),
            use_fallback: true,
            error_code: e.error_code().to_string(),
            status: e.http_status(),
        }
    }
}

impl std::fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.error_code, self.error)
    }
}

impl std::error::Error for ApiFailure {}

static ADVISOR: OnceCell<StyleAdvisor> = OnceCell::new();

/// 进程内共享一个 advisor，配置在首次调用时从环境变量读取
pub(crate) fn shared_advisor() -> Result<&'static StyleAdvisor, AiError> {
    ADVISOR.get_or_try_init(|| {
        crate::init_logging();
        StyleAdvisor::from_env()
    })
}
