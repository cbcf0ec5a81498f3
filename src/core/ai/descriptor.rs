//! 按分析类型区分的提示词与字段映射表

use crate::models::analysis::AnalysisKind;

/// 某个标准字段在不同模型输出里可能出现的键名，按优先级排列
#[derive(Debug, Clone, Copy)]
pub struct FieldAliases {
    pub canonical: &'static str,
    pub aliases: &'static [&'static str],
}

impl FieldAliases {
    const fn new(canonical: &'static str, aliases: &'static [&'static str]) -> Self {
        Self { canonical, aliases }
    }
}

/// 一种分析类型的全部差异：提示词、结果数组所在键、各字段别名、附加字段
#[derive(Debug, Clone, Copy)]
pub struct KindDescriptor {
    pub kind: AnalysisKind,
    pub prompt: &'static str,
    pub list_keys: &'static [&'static str],
    pub name: FieldAliases,
    pub description: FieldAliases,
    pub score: FieldAliases,
    pub maintenance: FieldAliases,
    pub styling_tips: FieldAliases,
    pub best_for: FieldAliases,
    /// 原样保留到 extras 的附加字段
    pub extras: &'static [FieldAliases],
}

const COMMON_NAME: FieldAliases = FieldAliases::new("name", &["name", "title", "styleName", "colorName"]);
const COMMON_DESCRIPTION: FieldAliases =
    FieldAliases::new("description", &["description", "whyItWorks", "reason", "explanation"]);
const COMMON_SCORE: FieldAliases = FieldAliases::new(
    "suitabilityScore",
    &["suitabilityScore", "matchScore", "score", "compatibility"],
);
const COMMON_MAINTENANCE: FieldAliases =
    FieldAliases::new("maintenanceLevel", &["maintenanceLevel", "maintenance", "upkeep"]);
const COMMON_TIPS: FieldAliases =
    FieldAliases::new("stylingTips", &["stylingTips", "tips", "howToStyle", "careTips"]);
const COMMON_BEST_FOR: FieldAliases =
    FieldAliases::new("bestFor", &["bestFor", "idealFor", "suitableFor", "occasions"]);

const HAIRSTYLE_PROMPT: &str = r#"You are a professional hairstylist. Analyze the face in this photo and recommend 6 hairstyles.
Consider face shape, facial proportions, skin tone and apparent hair texture.
Respond ONLY with JSON in this exact shape:
{
  "faceShape": "oval|round|square|heart|oblong|diamond",
  "skinTone": "short description",
  "undertone": "warm|cool|neutral",
  "summary": "one or two sentences about the face",
  "recommendations": [
    {
      "name": "style name",
      "description": "why it works for this face",
      "suitabilityScore": 0.0-1.0,
      "maintenanceLevel": "Low|Medium|High",
      "stylingTips": ["tip"],
      "bestFor": ["occasion or hair type"],
      "cuttingTechnique": "instructions for the stylist",
      "length": "short|medium|long"
    }
  ]
}"#;

const COLOR_PROMPT: &str = r##"You are a professional hair colorist. Analyze the skin tone, undertone and eye color in this photo and recommend 6 hair colors.
Respond ONLY with JSON in this exact shape:
{
  "faceShape": "oval|round|square|heart|oblong|diamond",
  "skinTone": "short description",
  "undertone": "warm|cool|neutral",
  "summary": "one or two sentences about the coloring",
  "recommendations": [
    {
      "name": "color name",
      "description": "why it flatters this complexion",
      "suitabilityScore": 0.0-1.0,
      "maintenanceLevel": "Low|Medium|High",
      "stylingTips": ["tip"],
      "bestFor": ["season or occasion"],
      "hexCode": "#RRGGBB",
      "technique": "balayage|highlights|all-over|ombre"
    }
  ]
}"##;

const HAIRSTYLE_EXTRAS: &[FieldAliases] = &[
    FieldAliases::new(
        "cuttingTechnique",
        &["cuttingTechnique", "cuttingInstructions", "cutting", "technique"],
    ),
    FieldAliases::new("length", &["length", "hairLength"]),
    FieldAliases::new("faceShapeMatch", &["faceShapeMatch", "faceShape"]),
];

const COLOR_EXTRAS: &[FieldAliases] = &[
    FieldAliases::new("hexCode", &["hexCode", "hex", "colorCode", "hexColor"]),
    FieldAliases::new("technique", &["technique", "colorTechnique", "application"]),
    FieldAliases::new("undertoneMatch", &["undertoneMatch", "undertone"]),
];

const HAIRSTYLE: KindDescriptor = KindDescriptor {
    kind: AnalysisKind::Hairstyle,
    prompt: HAIRSTYLE_PROMPT,
    list_keys: &["recommendations", "hairstyles", "styles"],
    name: COMMON_NAME,
    description: COMMON_DESCRIPTION,
    score: COMMON_SCORE,
    maintenance: COMMON_MAINTENANCE,
    styling_tips: COMMON_TIPS,
    best_for: COMMON_BEST_FOR,
    extras: HAIRSTYLE_EXTRAS,
};

const COLOR: KindDescriptor = KindDescriptor {
    kind: AnalysisKind::Color,
    prompt: COLOR_PROMPT,
    list_keys: &["recommendations", "colors", "hairColors"],
    name: COMMON_NAME,
    description: COMMON_DESCRIPTION,
    score: COMMON_SCORE,
    maintenance: COMMON_MAINTENANCE,
    styling_tips: COMMON_TIPS,
    best_for: COMMON_BEST_FOR,
    extras: COLOR_EXTRAS,
};

pub fn descriptor_for(kind: AnalysisKind) -> &'static KindDescriptor {
    match kind {
        AnalysisKind::Hairstyle => &HAIRSTYLE,
        AnalysisKind::Color => &COLOR,
    }
}

/// 预览图的编辑提示词
pub fn preview_prompt(kind: AnalysisKind, style_name: &str, detail: Option<&str>) -> String {
    let detail = detail
        .filter(|d| !d.trim().is_empty())
        .map(|d| format!(" Details: {}.", d.trim()))
        .unwrap_or_default();

    match kind {
        AnalysisKind::Hairstyle => format!(
            "Edit this photo so the person has a {} hairstyle.{} Keep the face, skin tone, expression, \
             clothing and background exactly the same. Only change the hair. Return the edited image.",
            style_name, detail
        ),
        AnalysisKind::Color => format!(
            "Edit this photo so the person's hair is colored {}.{} Keep the haircut, face, skin tone, \
             clothing and background exactly the same. Only change the hair color. Return the edited image.",
            style_name, detail
        ),
    }
}
