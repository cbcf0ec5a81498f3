use serde::{Deserialize, Serialize};

use crate::models::analysis::AnalysisKind;

/// 把一条推荐效果画到用户照片上
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    /// `data:image/...;base64,...`
    pub image_src: String,
    pub kind: AnalysisKind,
    pub style_name: String,
    /// 例如色号或剪裁说明
    #[serde(default)]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub data_uri: String,
    pub mime_type: String,
    pub model_id: String,
    /// 模型附带的文字说明
    pub caption: Option<String>,
}

/// 发型迁移：人脸照片 + 目标发型
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub face_image: String,
    pub hairstyle_description: String,
    /// 参考发型图片（URL 或 data URI），可选
    #[serde(default)]
    pub hairstyle_image: Option<String>,
}
