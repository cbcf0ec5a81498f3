//! 效果预览与发型迁移

use flutter_rust_bridge::frb;
use log::warn;

use crate::api::{shared_advisor, ApiFailure};
use crate::core::ai::StyleAdvisor;
use crate::models::preview::{GeneratedImage, PreviewRequest, TransferRequest};

/// 把一条推荐（发型或发色）渲染到照片上
#[frb]
pub fn render_style_preview(request: PreviewRequest) -> Result<GeneratedImage, ApiFailure> {
    let advisor = shared_advisor()?;
    render_with(advisor, &request)
}

/// 发型迁移，返回结果图片 URL
#[frb]
pub fn transfer_hairstyle(request: TransferRequest) -> Result<String, ApiFailure> {
    let advisor = shared_advisor()?;
    transfer_with(advisor, &request)
}

fn render_with(advisor: &StyleAdvisor, request: &PreviewRequest) -> Result<GeneratedImage, ApiFailure> {
    advisor.render_preview(request).map_err(|e| {
        warn!("❌ Preview failed [{}]: {}", e.error_code(), e);
        ApiFailure::from(e)
    })
}

fn transfer_with(advisor: &StyleAdvisor, request: &TransferRequest) -> Result<String, ApiFailure> {
    advisor.transfer_hairstyle(request).map_err(|e| {
        warn!("❌ Hairstyle transfer failed [{}]: {}", e.error_code(), e);
        ApiFailure::from(e)
    })
}
