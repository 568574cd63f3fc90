use serde::{Deserialize, Serialize};

use crate::catalog::Product;

use super::{PricingError, Selection};

/// The price-book tier a quote was settled on, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceTier {
    FullBundle,
    AllSubjects,
    Combo,
    PerSubject,
    PerPaper,
}

impl PriceTier {
    pub const fn label(self) -> &'static str {
        match self {
            PriceTier::FullBundle => "full_bundle",
            PriceTier::AllSubjects => "all_subjects",
            PriceTier::Combo => "combo",
            PriceTier::PerSubject => "per_subject",
            PriceTier::PerPaper => "per_paper",
        }
    }
}

/// Resolve the base price for a validated selection. First matching tier
/// wins; a tier whose price is not configured falls through to the per-paper
/// rate, never to a later tier.
pub(crate) fn resolve_base_price(
    product: &Product,
    selection: &Selection,
    series_multiplier: u32,
    total_papers: u32,
) -> Result<(PriceTier, u32), PricingError> {
    let book = &product.price_book;
    let subject_count = selection.subjects.len() as u32;
    let all_subjects = product
        .subjects
        .iter()
        .all(|subject| selection.subjects.contains(subject));

    let all_series = product.kind.is_full()
        && product
            .configured_series()
            .iter()
            .all(|series| selection.series.contains(series));

    let matched: (PriceTier, Option<u32>) = if all_subjects && all_series {
        // Flat bundle price, independent of how many series multiply the
        // paper count.
        (PriceTier::FullBundle, book.full_bundle)
    } else if all_subjects {
        (
            PriceTier::AllSubjects,
            book.all_subjects.map(|rate| rate * series_multiplier),
        )
    } else if subject_count >= 3 {
        (
            PriceTier::Combo,
            book.combo.map(|rate| rate * series_multiplier),
        )
    } else {
        (
            PriceTier::PerSubject,
            book.per_subject
                .map(|rate| rate * subject_count * series_multiplier),
        )
    };

    match matched {
        (tier, Some(price)) => Ok((tier, price)),
        (_, None) => book
            .per_paper
            .map(|rate| (PriceTier::PerPaper, rate * total_papers))
            .ok_or(PricingError::MissingRate),
    }
}
