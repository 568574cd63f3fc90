//! Entitlement keys and the gate deciding which catalog slices a buyer may
//! see. Visibility always derives from what was purchased, never from which
//! papers happen to exist in the catalog.

pub mod store;

pub use store::{EnrollmentStore, EnrollmentStoreError};

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::catalog::{BuyerId, Paper, Product, ProductId, SubjectCode};
use crate::pricing::Selection;

/// One purchased slice of a product. Non-full products entitle whole
/// subjects; full-series products entitle (series, subject) pairs encoded as
/// composite strings like `series1-FR`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(into = "String", try_from = "String")]
pub enum EntitlementKey {
    Subject(SubjectCode),
    SeriesSubject { series: u8, subject: SubjectCode },
}

impl EntitlementKey {
    pub fn encode(&self) -> String {
        match self {
            EntitlementKey::Subject(subject) => subject.label().to_string(),
            EntitlementKey::SeriesSubject { series, subject } => {
                format!("series{}-{}", series, subject.label())
            }
        }
    }

    pub fn parse(raw: &str) -> Result<Self, EntitlementError> {
        let raw = raw.trim();
        if let Some(rest) = raw.strip_prefix("series") {
            let (series, subject) = rest
                .split_once('-')
                .ok_or_else(|| EntitlementError::MalformedKey(raw.to_string()))?;
            let series: u8 = series
                .parse()
                .map_err(|_| EntitlementError::MalformedKey(raw.to_string()))?;
            let subject = SubjectCode::parse(subject)
                .ok_or_else(|| EntitlementError::MalformedKey(raw.to_string()))?;
            return Ok(EntitlementKey::SeriesSubject { series, subject });
        }
        SubjectCode::parse(raw)
            .map(EntitlementKey::Subject)
            .ok_or_else(|| EntitlementError::MalformedKey(raw.to_string()))
    }

    pub const fn subject(&self) -> SubjectCode {
        match self {
            EntitlementKey::Subject(subject)
            | EntitlementKey::SeriesSubject { subject, .. } => *subject,
        }
    }
}

impl From<EntitlementKey> for String {
    fn from(key: EntitlementKey) -> Self {
        key.encode()
    }
}

impl TryFrom<String> for EntitlementKey {
    type Error = EntitlementError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        EntitlementKey::parse(&raw)
    }
}

/// Purchase record handed over by the commerce collaborator once payment (or
/// free acquisition) succeeds. Immutable after creation; there is no partial
/// upgrade path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub buyer: BuyerId,
    pub product: ProductId,
    pub keys: BTreeSet<EntitlementKey>,
}

/// The exact cartesian product of slices a selection pays for. This is the
/// only sanctioned source of entitlement keys.
pub fn entitlement_keys(product: &Product, selection: &Selection) -> BTreeSet<EntitlementKey> {
    if product.kind.is_full() {
        selection
            .series
            .iter()
            .flat_map(|&series| {
                selection
                    .subjects
                    .iter()
                    .map(move |&subject| EntitlementKey::SeriesSubject { series, subject })
            })
            .collect()
    } else {
        selection
            .subjects
            .iter()
            .map(|&subject| EntitlementKey::Subject(subject))
            .collect()
    }
}

/// Filter a grouped catalog listing down to the slices the enrollment
/// actually covers. Subjects with papers but no matching key are dropped
/// outright, never rendered as teasers. An empty key set is the legacy
/// free-product fallback: everything stays visible.
pub fn visible_papers(
    enrollment: &Enrollment,
    grouped: BTreeMap<SubjectCode, Vec<Paper>>,
) -> BTreeMap<SubjectCode, Vec<Paper>> {
    if enrollment.keys.is_empty() {
        return grouped;
    }

    grouped
        .into_iter()
        .filter_map(|(subject, papers)| {
            let whole_subject = enrollment
                .keys
                .contains(&EntitlementKey::Subject(subject));
            let entitled_series: BTreeSet<u8> = enrollment
                .keys
                .iter()
                .filter_map(|key| match key {
                    EntitlementKey::SeriesSubject { series, subject: s } if *s == subject => {
                        Some(*series)
                    }
                    _ => None,
                })
                .collect();

            if !whole_subject && entitled_series.is_empty() {
                return None;
            }

            let papers: Vec<Paper> = papers
                .into_iter()
                .filter(|paper| match paper.series {
                    None => true,
                    Some(series) => whole_subject || entitled_series.contains(&series),
                })
                .collect();

            if papers.is_empty() {
                None
            } else {
                Some((subject, papers))
            }
        })
        .collect()
}

/// Hard gate applied before any per-paper operation.
pub fn ensure_entitled(enrollment: &Enrollment, paper: &Paper) -> Result<(), EntitlementError> {
    if enrollment.keys.is_empty() {
        return Ok(());
    }

    let whole_subject = enrollment
        .keys
        .contains(&EntitlementKey::Subject(paper.subject));
    let entitled = match paper.series {
        None => {
            whole_subject
                || enrollment
                    .keys
                    .iter()
                    .any(|key| key.subject() == paper.subject)
        }
        Some(series) => {
            whole_subject
                || enrollment.keys.contains(&EntitlementKey::SeriesSubject {
                    series,
                    subject: paper.subject,
                })
        }
    };

    if entitled {
        Ok(())
    } else {
        Err(EntitlementError::Denied {
            paper: paper.id.0.clone(),
        })
    }
}

/// Error enumeration for entitlement checks.
#[derive(Debug, thiserror::Error)]
pub enum EntitlementError {
    #[error("paper '{paper}' is outside the buyer's purchased entitlements")]
    Denied { paper: String },
    #[error("buyer has no enrollment for product '{0}'")]
    NotEnrolled(String),
    #[error("'{0}' is not a valid entitlement key")]
    MalformedKey(String),
}
