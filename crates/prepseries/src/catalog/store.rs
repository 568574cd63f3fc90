use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{GroupTag, Paper, PaperId, PaperType, Product, ProductId, SubjectCode};

/// Read-only access to product definitions maintained by the catalog
/// collaborator.
pub trait CatalogStore: Send + Sync {
    fn product(&self, id: &ProductId) -> Result<Option<Product>, CatalogError>;
}

/// Read-only index over uploaded papers. Population happens through the
/// external upload collaborator; the core only ever queries it.
pub trait PaperCatalog: Send + Sync {
    fn paper(&self, id: &PaperId) -> Result<Option<Paper>, CatalogError>;
    fn papers(&self, product: &ProductId, filter: &PaperFilter) -> Result<Vec<Paper>, CatalogError>;
}

/// Query narrowing applied by [`PaperCatalog::papers`]. Every field is
/// conjunctive; `None` means "any".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperFilter {
    pub group: Option<GroupTag>,
    pub subject: Option<SubjectCode>,
    pub series: Option<u8>,
    pub paper_type: Option<PaperType>,
    /// Papers dated after this day are withheld from listings.
    pub available_on: Option<NaiveDate>,
}

impl PaperFilter {
    pub fn matches(&self, paper: &Paper) -> bool {
        if let Some(group) = &self.group {
            if &paper.group != group {
                return false;
            }
        }
        if let Some(subject) = self.subject {
            if paper.subject != subject {
                return false;
            }
        }
        if let Some(series) = self.series {
            if paper.series != Some(series) {
                return false;
            }
        }
        if let Some(paper_type) = self.paper_type {
            if paper.paper_type != paper_type {
                return false;
            }
        }
        if let Some(today) = self.available_on {
            if paper.available_from > today {
                return false;
            }
        }
        true
    }
}

/// Grouped retrieval used by the storefront content page: subject -> ordered
/// papers (series, then paper number).
pub fn grouped_papers<C>(
    catalog: &C,
    product: &ProductId,
    filter: &PaperFilter,
) -> Result<BTreeMap<SubjectCode, Vec<Paper>>, CatalogError>
where
    C: PaperCatalog + ?Sized,
{
    let mut grouped: BTreeMap<SubjectCode, Vec<Paper>> = BTreeMap::new();
    for paper in catalog.papers(product, filter)? {
        grouped.entry(paper.subject).or_default().push(paper);
    }

    for papers in grouped.values_mut() {
        papers.sort_by(|a, b| {
            (a.series, a.paper_number, a.paper_type.label())
                .cmp(&(b.series, b.paper_number, b.paper_type.label()))
        });
    }

    Ok(grouped)
}

/// Error enumeration for catalog lookups.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("product '{0}' is not in the catalog")]
    ProductNotFound(String),
    #[error("paper '{0}' is not in the catalog")]
    PaperNotFound(String),
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}
