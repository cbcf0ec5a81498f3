//! 本地兜底数据：AI 不可用时 UI 仍然有完整可渲染的结果

use std::collections::BTreeMap;

use crate::models::analysis::{
    AnalysisKind, AnalysisResult, MaintenanceLevel, NormalizedRecommendation, ResultSource,
};

pub const FALLBACK_ADVISORY: &str =
    "AI analysis is currently unavailable. Showing popular recommendations instead.";

struct Entry {
    name: &'static str,
    description: &'static str,
    score: f32,
    maintenance: MaintenanceLevel,
    tips: &'static [&'static str],
    best_for: &'static [&'static str],
    extras: &'static [(&'static str, &'static str)],
}

impl Entry {
    fn to_recommendation(&self) -> NormalizedRecommendation {
        NormalizedRecommendation {
            name: self.name.to_string(),
            description: self.description.to_string(),
            suitability_score: self.score,
            maintenance_level: self.maintenance,
            styling_tips: self.tips.iter().map(|s| s.to_string()).collect(),
            best_for: self.best_for.iter().map(|s| s.to_string()).collect(),
            extras: self
                .extras
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        }
    }
}

static HAIRSTYLES: [Entry; 6] = [
    Entry {
        name: "Textured Lob",
        description: "A collarbone-length cut with soft texture that frames the face and adds movement without weight.",
        score: 0.92,
        maintenance: MaintenanceLevel::Low,
        tips: &["Blow dry with a round brush for volume", "Finish with texturizing spray", "Trim every 8-10 weeks"],
        best_for: &["Oval faces", "Fine to medium hair", "Everyday wear"],
        extras: &[
            ("cuttingTechnique", "Blunt perimeter with point-cut internal layers"),
            ("length", "medium"),
        ],
    },
    Entry {
        name: "Long Layers with Curtain Bangs",
        description: "Face-framing layers and center-parted bangs that soften angles and draw attention to the eyes.",
        score: 0.89,
        maintenance: MaintenanceLevel::Medium,
        tips: &["Style bangs with a small round brush", "Use heat protectant before styling", "Refresh bangs every 4 weeks"],
        best_for: &["Square and heart faces", "Medium to thick hair", "Casual and formal looks"],
        extras: &[
            ("cuttingTechnique", "Long graduated layers with slide-cut curtain fringe"),
            ("length", "long"),
        ],
    },
    Entry {
        name: "Modern Shag",
        description: "Choppy, feathered layers that create volume at the crown and effortless movement at the ends.",
        score: 0.86,
        maintenance: MaintenanceLevel::Medium,
        tips: &["Scrunch in curl cream or sea salt spray", "Air dry or diffuse", "Avoid heavy products"],
        best_for: &["Wavy or curly hair", "Round and oval faces", "Relaxed style"],
        extras: &[
            ("cuttingTechnique", "Razor-cut layers with heavy texturizing at the crown"),
            ("length", "medium"),
        ],
    },
    Entry {
        name: "Side-Swept Pixie",
        description: "A short, cropped cut with longer side-swept top that highlights cheekbones and eyes.",
        score: 0.8,
        maintenance: MaintenanceLevel::High,
        tips: &["Use a matte pomade for definition", "Sweep the fringe while damp", "Trim every 4-6 weeks"],
        best_for: &["Oval and heart faces", "Fine hair", "Bold, low-effort mornings"],
        extras: &[
            ("cuttingTechnique", "Tapered sides and nape with a longer asymmetric top"),
            ("length", "short"),
        ],
    },
    Entry {
        name: "Soft Blunt Bob",
        description: "A chin-length bob with a clean line and softened edges for a polished, classic shape.",
        score: 0.84,
        maintenance: MaintenanceLevel::Medium,
        tips: &["Flat iron the ends slightly under", "Use shine serum", "Trim every 6-8 weeks"],
        best_for: &["Oblong and oval faces", "Straight hair", "Professional settings"],
        extras: &[
            ("cuttingTechnique", "One-length blunt cut with subtle internal softening"),
            ("length", "short"),
        ],
    },
    Entry {
        name: "Layered Wolf Cut",
        description: "A blend of shag and mullet with shaggy crown layers and lighter, wispy ends.",
        score: 0.78,
        maintenance: MaintenanceLevel::Low,
        tips: &["Rough dry with fingers", "Define pieces with light wax", "Embrace natural texture"],
        best_for: &["Thick or wavy hair", "Diamond and oval faces", "Edgy style"],
        extras: &[
            ("cuttingTechnique", "Disconnected shaggy layers with tapered, wispy perimeter"),
            ("length", "medium"),
        ],
    },
];

static COLORS: [Entry; 6] = [
    Entry {
        name: "Honey Blonde Balayage",
        description: "Hand-painted golden highlights that add warmth and brightness around the face.",
        score: 0.9,
        maintenance: MaintenanceLevel::Medium,
        tips: &["Use purple shampoo once a week", "Apply a gloss every 6-8 weeks", "Protect from sun exposure"],
        best_for: &["Warm undertones", "Light to medium brown bases", "Spring and summer"],
        extras: &[("hexCode", "#C8A165"), ("technique", "balayage")],
    },
    Entry {
        name: "Rich Chocolate Brown",
        description: "A deep, glossy brown that adds dimension and suits most complexions.",
        score: 0.88,
        maintenance: MaintenanceLevel::Low,
        tips: &["Use color-safe shampoo", "Rinse with cool water", "Refresh with a glaze every 8 weeks"],
        best_for: &["Neutral and cool undertones", "Dark bases", "Year-round"],
        extras: &[("hexCode", "#4B3621"), ("technique", "all-over")],
    },
    Entry {
        name: "Copper Auburn",
        description: "A vibrant red-orange shade that makes green and hazel eyes stand out.",
        score: 0.82,
        maintenance: MaintenanceLevel::High,
        tips: &["Use a color-depositing conditioner", "Wash less often", "Avoid chlorine"],
        best_for: &["Warm undertones", "Fair to medium skin", "Autumn"],
        extras: &[("hexCode", "#B4552D"), ("technique", "all-over")],
    },
    Entry {
        name: "Ash Brown",
        description: "A cool, smoky brown that neutralizes redness and gives a modern matte finish.",
        score: 0.8,
        maintenance: MaintenanceLevel::Medium,
        tips: &["Use blue shampoo to keep tones cool", "Tone every 6 weeks", "Limit heat styling"],
        best_for: &["Cool undertones", "Fair to olive skin", "Winter"],
        extras: &[("hexCode", "#7A6A5B"), ("technique", "all-over")],
    },
    Entry {
        name: "Caramel Highlights",
        description: "Soft caramel ribbons woven through a brown base for sun-kissed dimension.",
        score: 0.85,
        maintenance: MaintenanceLevel::Medium,
        tips: &["Deep condition weekly", "Use heat protectant", "Touch up roots every 10-12 weeks"],
        best_for: &["Warm and neutral undertones", "Medium brown bases", "Summer"],
        extras: &[("hexCode", "#AF6E3C"), ("technique", "highlights")],
    },
    Entry {
        name: "Burgundy Red",
        description: "A deep wine-red with violet undertones for a bold but sophisticated look.",
        score: 0.76,
        maintenance: MaintenanceLevel::High,
        tips: &["Use sulfate-free shampoo", "Refresh with a red gloss monthly", "Sleep on a silk pillowcase"],
        best_for: &["Cool undertones", "Medium to deep skin", "Autumn and winter"],
        extras: &[("hexCode", "#6D1A36"), ("technique", "all-over")],
    },
];

pub struct FallbackDatasetProvider;

impl FallbackDatasetProvider {
    pub fn get_fallback(kind: AnalysisKind) -> AnalysisResult {
        let (entries, summary) = match kind {
            AnalysisKind::Hairstyle => (
                &HAIRSTYLES,
                "These versatile hairstyles flatter a wide range of face shapes.",
            ),
            AnalysisKind::Color => (
                &COLORS,
                "These popular hair colors complement a wide range of skin tones.",
            ),
        };

        AnalysisResult {
            kind,
            face_shape: "oval".to_string(),
            skin_tone: "medium".to_string(),
            undertone: "neutral".to_string(),
            summary: summary.to_string(),
            recommendations: entries.iter().map(Entry::to_recommendation).collect(),
            source: ResultSource::Fallback,
            advisory: FALLBACK_ADVISORY.to_string(),
        }
    }
}

pub fn fallback_result(kind: AnalysisKind) -> AnalysisResult {
    FallbackDatasetProvider::get_fallback(kind)
}
