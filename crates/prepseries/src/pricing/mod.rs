//! Deterministic pricing for test-series selections.
//!
//! The engine is pure: it owns no state, caches nothing, and is recomputed
//! from scratch whenever the buyer's selection or coupon changes. All money
//! amounts are whole rupees.

pub mod discount;
mod tiers;

pub use discount::{DiscountDescriptor, DiscountError, DiscountKind, DiscountResolver};
pub use tiers::PriceTier;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::catalog::{GroupTag, Product, SubjectCode};

/// A buyer's in-progress configuration on the product detail page. The group
/// tag only pre-fills the subject set in the UI; it never prices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    #[serde(default)]
    pub series: BTreeSet<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupTag>,
    pub subjects: BTreeSet<SubjectCode>,
}

/// Priced result for one (product, selection, coupon) triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub base_price: u32,
    pub total_papers: u32,
    pub final_price: u32,
    pub breakdown: PriceBreakdown,
}

/// Display-oriented itemization backing the price shown on the detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub tier: PriceTier,
    pub series_multiplier: u32,
    /// Papers the buyer receives per subject, series multiplier applied.
    pub subject_papers: BTreeMap<SubjectCode, u32>,
    /// Effective per-subject price actually charged, for display.
    pub subject_rate: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<DiscountDescriptor>,
}

/// Error enumeration for quote computation. The selection variants are the
/// recoverable "re-prompt the buyer" cases.
#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("invalid selection: at least one subject is required")]
    NoSubjects,
    #[error("invalid selection: a full test series requires at least one mock series")]
    NoSeries,
    #[error("invalid selection: series {0} is not configured on this product")]
    UnknownSeries(u8),
    #[error("price book defines no rate applicable to this selection")]
    MissingRate,
}

impl PricingError {
    /// Whether the failure is a malformed buyer selection (as opposed to a
    /// catalog misconfiguration).
    pub const fn is_invalid_selection(&self) -> bool {
        matches!(
            self,
            PricingError::NoSubjects | PricingError::NoSeries | PricingError::UnknownSeries(_)
        )
    }
}

/// Validate a selection against the product it targets.
pub fn validate_selection(product: &Product, selection: &Selection) -> Result<(), PricingError> {
    if selection.subjects.is_empty() {
        return Err(PricingError::NoSubjects);
    }
    if product.kind.is_full() {
        if selection.series.is_empty() {
            return Err(PricingError::NoSeries);
        }
        let configured = product.configured_series();
        if let Some(&unknown) = selection
            .series
            .iter()
            .find(|series| !configured.contains(series))
        {
            return Err(PricingError::UnknownSeries(unknown));
        }
    }
    Ok(())
}

/// Compute the deterministic price for a selection, optionally after a
/// resolved coupon.
pub fn compute_price(
    product: &Product,
    selection: &Selection,
    discount: Option<&DiscountDescriptor>,
) -> Result<PriceQuote, PricingError> {
    validate_selection(product, selection)?;

    let series_multiplier = if product.kind.is_full() {
        (selection.series.len() as u32).max(1)
    } else {
        1
    };

    let subject_papers: BTreeMap<SubjectCode, u32> = selection
        .subjects
        .iter()
        .map(|&subject| (subject, product.papers_for(subject) * series_multiplier))
        .collect();
    let total_papers: u32 = subject_papers.values().sum();

    let (tier, base_price) =
        tiers::resolve_base_price(product, selection, series_multiplier, total_papers)?;

    let final_price = discount.map_or(base_price, |descriptor| descriptor.apply(base_price));

    let priced_slots = selection.subjects.len() as u32 * series_multiplier;
    let subject_rate = if priced_slots == 0 { 0 } else { base_price / priced_slots };

    Ok(PriceQuote {
        base_price,
        total_papers,
        final_price,
        breakdown: PriceBreakdown {
            tier,
            series_multiplier,
            subject_papers,
            subject_rate,
            discount: discount.cloned(),
        },
    })
}
