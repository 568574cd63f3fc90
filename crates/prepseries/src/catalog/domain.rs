use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for catalog products.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(pub String);

/// Identifier wrapper for uploaded practice papers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PaperId(pub String);

/// Identifier wrapper for buyers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BuyerId(pub String);

/// Opaque reference into the external file-storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageRef(pub String);

/// Free-form tag grouping papers within a product (e.g. a syllabus group).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupTag(pub String);

/// The fixed five-subject set every test-series product is built from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum SubjectCode {
    Fr,
    Afm,
    Audit,
    Dt,
    Idt,
}

impl SubjectCode {
    pub const ALL: [SubjectCode; 5] = [
        SubjectCode::Fr,
        SubjectCode::Afm,
        SubjectCode::Audit,
        SubjectCode::Dt,
        SubjectCode::Idt,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            SubjectCode::Fr => "FR",
            SubjectCode::Afm => "AFM",
            SubjectCode::Audit => "AUDIT",
            SubjectCode::Dt => "DT",
            SubjectCode::Idt => "IDT",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "FR" => Some(SubjectCode::Fr),
            "AFM" => Some(SubjectCode::Afm),
            "AUDIT" => Some(SubjectCode::Audit),
            "DT" => Some(SubjectCode::Dt),
            "IDT" => Some(SubjectCode::Idt),
            _ => None,
        }
    }
}

/// Product families offered by the storefront. Only the full test series
/// spans multiple mock-exam series; the series count (2 or 3) is configured
/// per product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProductKind {
    Full { series_count: u8 },
    Half,
    Third,
    Special,
}

impl ProductKind {
    pub const fn is_full(self) -> bool {
        matches!(self, ProductKind::Full { .. })
    }

    pub const fn label(self) -> &'static str {
        match self {
            ProductKind::Full { .. } => "full_series",
            ProductKind::Half => "half_series",
            ProductKind::Third => "third_series",
            ProductKind::Special => "special",
        }
    }
}

/// Tier prices a product may configure. Absent tiers fall back to the
/// per-paper rate at quote time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBook {
    /// Rate charged per subject per series.
    pub per_subject: Option<u32>,
    /// Flat rate for a 3- or 4-subject combination, per series.
    pub combo: Option<u32>,
    /// Flat rate for the complete five-subject set, per series.
    pub all_subjects: Option<u32>,
    /// One flat price covering every subject across every configured series.
    /// Only meaningful on full-series products.
    pub full_bundle: Option<u32>,
    /// Last-resort rate charged per paper when the matched tier is absent.
    pub per_paper: Option<u32>,
}

/// A purchasable test-series offering. Read-only to the core; maintained by
/// the catalog-management collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(flatten)]
    pub kind: ProductKind,
    pub subjects: Vec<SubjectCode>,
    pub papers_per_subject: BTreeMap<SubjectCode, u32>,
    pub price_book: PriceBook,
}

impl Product {
    /// The 1-based series indices this product is configured with. Empty for
    /// anything but a full-series product.
    pub fn configured_series(&self) -> Vec<u8> {
        match self.kind {
            ProductKind::Full { series_count } => (1..=series_count).collect(),
            _ => Vec::new(),
        }
    }

    pub fn papers_for(&self, subject: SubjectCode) -> u32 {
        self.papers_per_subject.get(&subject).copied().unwrap_or(0)
    }
}

/// Artifact flavors the upload collaborator produces for each paper slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaperType {
    Question,
    SuggestedAnswer,
    EvaluatedTemplate,
}

impl PaperType {
    pub const fn label(self) -> &'static str {
        match self {
            PaperType::Question => "question",
            PaperType::SuggestedAnswer => "suggested_answer",
            PaperType::EvaluatedTemplate => "evaluated_template",
        }
    }
}

/// One uploaded practice-paper artifact. At most one question and one
/// suggested-answer paper exist per (product, subject, series, number) slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
    pub id: PaperId,
    pub product: ProductId,
    pub group: GroupTag,
    pub subject: SubjectCode,
    pub paper_type: PaperType,
    pub paper_number: u32,
    pub syllabus_coverage_pct: u8,
    /// 1-based series index; set only on full-series products.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<u8>,
    pub available_from: NaiveDate,
    pub storage_ref: StorageRef,
}
