use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::catalog::{
    BuyerId, CatalogStore, GroupTag, Paper, PaperCatalog, PaperId, ProductId, SubjectCode,
};
use crate::entitlement::{EnrollmentStore, EnrollmentStoreError, EntitlementError};
use crate::pricing::{DiscountError, DiscountResolver, PriceQuote, Selection};

use super::service::{StorefrontError, StorefrontService};

/// Quote request for the product detail page: the buyer's current picks plus
/// an optional coupon code.
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteRequest {
    pub product: ProductId,
    pub selection: Selection,
    #[serde(default)]
    pub coupon: Option<String>,
}

/// Purchase-completion payload handed over by the commerce collaborator.
#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseRequest {
    pub buyer: BuyerId,
    pub product: ProductId,
    pub selection: Selection,
}

/// Listing request for the buyer's content page.
#[derive(Debug, Clone, Deserialize)]
pub struct BuyerPapersRequest {
    #[serde(default)]
    pub group: Option<GroupTag>,
    #[serde(default)]
    pub series: Option<u8>,
    /// Availability cut-off; defaults to today.
    #[serde(default)]
    pub on: Option<NaiveDate>,
}

/// Paper metadata exposed to buyers; storage references stay internal.
#[derive(Debug, Clone, Serialize)]
pub struct PaperView {
    pub id: PaperId,
    pub group: GroupTag,
    pub subject: SubjectCode,
    pub paper_type: &'static str,
    pub paper_number: u32,
    pub syllabus_coverage_pct: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<u8>,
    pub available_from: NaiveDate,
}

impl From<Paper> for PaperView {
    fn from(paper: Paper) -> Self {
        PaperView {
            id: paper.id,
            group: paper.group,
            subject: paper.subject,
            paper_type: paper.paper_type.label(),
            paper_number: paper.paper_number,
            syllabus_coverage_pct: paper.syllabus_coverage_pct,
            series: paper.series,
            available_from: paper.available_from,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BuyerPapersResponse {
    pub product: ProductId,
    pub papers: BTreeMap<SubjectCode, Vec<PaperView>>,
}

/// Router builder exposing the pricing and entitlement endpoints.
pub fn storefront_router<C, D, P, E>(service: Arc<StorefrontService<C, D, P, E>>) -> Router
where
    C: CatalogStore + 'static,
    D: DiscountResolver + 'static,
    P: PaperCatalog + 'static,
    E: EnrollmentStore + 'static,
{
    Router::new()
        .route("/api/v1/pricing/quote", post(quote_handler::<C, D, P, E>))
        .route("/api/v1/enrollments", post(purchase_handler::<C, D, P, E>))
        .route(
            "/api/v1/buyers/:buyer/products/:product/papers",
            post(buyer_papers_handler::<C, D, P, E>),
        )
        .with_state(service)
}

pub(crate) async fn quote_handler<C, D, P, E>(
    State(service): State<Arc<StorefrontService<C, D, P, E>>>,
    axum::Json(request): axum::Json<QuoteRequest>,
) -> Response
where
    C: CatalogStore + 'static,
    D: DiscountResolver + 'static,
    P: PaperCatalog + 'static,
    E: EnrollmentStore + 'static,
{
    match service.quote(&request.product, &request.selection, request.coupon.as_deref()) {
        Ok(quote) => (StatusCode::OK, axum::Json::<PriceQuote>(quote)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn purchase_handler<C, D, P, E>(
    State(service): State<Arc<StorefrontService<C, D, P, E>>>,
    axum::Json(request): axum::Json<PurchaseRequest>,
) -> Response
where
    C: CatalogStore + 'static,
    D: DiscountResolver + 'static,
    P: PaperCatalog + 'static,
    E: EnrollmentStore + 'static,
{
    match service.complete_purchase(&request.buyer, &request.product, &request.selection) {
        Ok(enrollment) => (StatusCode::CREATED, axum::Json(enrollment)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn buyer_papers_handler<C, D, P, E>(
    State(service): State<Arc<StorefrontService<C, D, P, E>>>,
    Path((buyer, product)): Path<(String, String)>,
    axum::Json(request): axum::Json<BuyerPapersRequest>,
) -> Response
where
    C: CatalogStore + 'static,
    D: DiscountResolver + 'static,
    P: PaperCatalog + 'static,
    E: EnrollmentStore + 'static,
{
    let product = ProductId(product);
    let today = request.on.unwrap_or_else(|| Local::now().date_naive());
    match service.buyer_papers(&BuyerId(buyer), &product, request.group, request.series, today) {
        Ok(grouped) => {
            let papers = grouped
                .into_iter()
                .map(|(subject, papers)| {
                    (subject, papers.into_iter().map(PaperView::from).collect())
                })
                .collect();
            (
                StatusCode::OK,
                axum::Json(BuyerPapersResponse { product, papers }),
            )
                .into_response()
        }
        Err(error) => error_response(error),
    }
}

fn error_response(error: StorefrontError) -> Response {
    let status = match &error {
        StorefrontError::Pricing(pricing) if pricing.is_invalid_selection() => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        StorefrontError::Discount(DiscountError::NotFound(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        StorefrontError::ProductNotFound(_) => StatusCode::NOT_FOUND,
        StorefrontError::Entitlement(EntitlementError::NotEnrolled(_))
        | StorefrontError::Entitlement(EntitlementError::Denied { .. }) => StatusCode::FORBIDDEN,
        StorefrontError::Enrollments(EnrollmentStoreError::Conflict) => StatusCode::CONFLICT,
        StorefrontError::Pricing(_)
        | StorefrontError::Discount(_)
        | StorefrontError::Catalog(_)
        | StorefrontError::Entitlement(_)
        | StorefrontError::Enrollments(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
