//! Buyer-facing storefront: quoting, purchase completion, and the
//! entitlement-gated paper listing.

pub mod router;
pub mod service;

pub use router::{
    storefront_router, BuyerPapersRequest, BuyerPapersResponse, PaperView, PurchaseRequest,
    QuoteRequest,
};
pub use service::{StorefrontError, StorefrontService};
