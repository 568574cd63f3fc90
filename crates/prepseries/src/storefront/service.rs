use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::catalog::{
    grouped_papers, BuyerId, CatalogError, CatalogStore, GroupTag, Paper, PaperCatalog,
    PaperFilter, Product, ProductId, SubjectCode,
};
use crate::entitlement::{
    entitlement_keys, visible_papers, Enrollment, EnrollmentStore, EnrollmentStoreError,
    EntitlementError,
};
use crate::pricing::{
    compute_price, validate_selection, DiscountError, DiscountResolver, PriceQuote, PricingError,
    Selection,
};

/// Service composing the catalog, coupon registry, entitlement gate, and
/// pricing engine behind the buyer-facing storefront endpoints.
pub struct StorefrontService<C, D, P, E> {
    catalog: Arc<C>,
    discounts: Arc<D>,
    papers: Arc<P>,
    enrollments: Arc<E>,
}

impl<C, D, P, E> StorefrontService<C, D, P, E>
where
    C: CatalogStore + 'static,
    D: DiscountResolver + 'static,
    P: PaperCatalog + 'static,
    E: EnrollmentStore + 'static,
{
    pub fn new(catalog: Arc<C>, discounts: Arc<D>, papers: Arc<P>, enrollments: Arc<E>) -> Self {
        Self {
            catalog,
            discounts,
            papers,
            enrollments,
        }
    }

    /// Price a selection, optionally after resolving a coupon code. Pure
    /// pass-through to the pricing engine; nothing is cached between calls.
    pub fn quote(
        &self,
        product_id: &ProductId,
        selection: &Selection,
        coupon: Option<&str>,
    ) -> Result<PriceQuote, StorefrontError> {
        let product = self.product(product_id)?;
        let discount = coupon
            .map(|code| self.discounts.resolve(code))
            .transpose()?;
        Ok(compute_price(&product, selection, discount.as_ref())?)
    }

    /// Purchase-completion hook: derive the entitlement key set from the
    /// paid selection and persist it. Keys always come from the purchase,
    /// never from which papers exist.
    pub fn complete_purchase(
        &self,
        buyer: &BuyerId,
        product_id: &ProductId,
        selection: &Selection,
    ) -> Result<Enrollment, StorefrontError> {
        let product = self.product(product_id)?;
        validate_selection(&product, selection)?;

        let enrollment = Enrollment {
            buyer: buyer.clone(),
            product: product_id.clone(),
            keys: entitlement_keys(&product, selection),
        };
        Ok(self.enrollments.record(enrollment)?)
    }

    /// The grouped paper listing a buyer is entitled to see, gated by their
    /// enrollment and the availability date.
    pub fn buyer_papers(
        &self,
        buyer: &BuyerId,
        product_id: &ProductId,
        group: Option<GroupTag>,
        series: Option<u8>,
        today: NaiveDate,
    ) -> Result<BTreeMap<SubjectCode, Vec<Paper>>, StorefrontError> {
        self.product(product_id)?;
        let enrollment = self
            .enrollments
            .fetch(buyer, product_id)?
            .ok_or_else(|| EntitlementError::NotEnrolled(product_id.0.clone()))?;

        let filter = PaperFilter {
            group,
            series,
            available_on: Some(today),
            ..PaperFilter::default()
        };
        let grouped = grouped_papers(self.papers.as_ref(), product_id, &filter)?;
        Ok(visible_papers(&enrollment, grouped))
    }

    fn product(&self, product_id: &ProductId) -> Result<Product, StorefrontError> {
        self.catalog
            .product(product_id)?
            .ok_or_else(|| StorefrontError::ProductNotFound(product_id.0.clone()))
    }
}

/// Error raised by the storefront service.
#[derive(Debug, thiserror::Error)]
pub enum StorefrontError {
    #[error("product '{0}' is not in the catalog")]
    ProductNotFound(String),
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error(transparent)]
    Discount(#[from] DiscountError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Entitlement(#[from] EntitlementError),
    #[error(transparent)]
    Enrollments(#[from] EnrollmentStoreError),
}
