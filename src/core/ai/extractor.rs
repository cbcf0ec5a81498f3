use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::core::ai::error::AiError;
use crate::core::ai::gemini::GenerateContentResponse;

// 语言标记后必须跟空白，否则 ```true``` 这类单行字面量会被当成标记吞掉
static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:[A-Za-z][A-Za-z0-9_+-]*(?:[ \t]*\r?\n|[ \t]+))?(.*?)```")
        .expect("Invalid fenced block regex")
});

/// 多段响应里找图片的结果
#[derive(Debug, Clone, PartialEq)]
pub enum ImageExtraction {
    Image {
        data_uri: String,
        mime_type: String,
        /// 同一响应里附带的文字
        caption: Option<String>,
    },
    /// 没有图片，但模型说明了原因（常见于内容策略拒绝）
    TextOnly(String),
    Empty,
}

/// 从文本中取 JSON：有代码块取代码块内容，否则取全文
///
/// 先严格解析，失败后再用 json5 宽松解析（尾逗号、单引号等）。
pub fn extract_json(text: &str) -> Result<Value, AiError> {
    let trimmed = text.trim();
    let candidate = FENCED_BLOCK
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(trimmed);

    if candidate.is_empty() {
        return Err(AiError::MalformedResponse("empty response text".to_string()));
    }

    match serde_json::from_str::<Value>(candidate) {
        Ok(value) => Ok(value),
        Err(strict_err) => json5::from_str::<Value>(candidate).map_err(|_| {
            AiError::MalformedResponse(format!("JSON 数据解析失败: {}", strict_err))
        }),
    }
}

/// 拼接所有文本段
pub fn extract_text(response: &GenerateContentResponse) -> Option<String> {
    let text: String = response
        .parts()
        .filter_map(|p| p.text.as_deref())
        .collect::<Vec<_>>()
        .join("");

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// 取第一张内联图片并转成 data URI；没有图片时退回文本说明
pub fn extract_image(response: &GenerateContentResponse) -> ImageExtraction {
    let image = response.parts().find_map(|p| {
        p.inline_data
            .as_ref()
            .filter(|d| d.mime_type.starts_with("image/") && !d.data.is_empty())
    });

    match (image, extract_text(response)) {
        (Some(inline), caption) => ImageExtraction::Image {
            data_uri: format!("data:{};base64,{}", inline.mime_type, inline.data),
            mime_type: inline.mime_type.clone(),
            caption,
        },
        (None, Some(text)) => ImageExtraction::TextOnly(text),
        (None, None) => ImageExtraction::Empty,
    }
}
