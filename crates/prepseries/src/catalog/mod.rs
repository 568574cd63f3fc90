//! Read-only product and paper catalog consumed by the storefront and the
//! submission workflow. Catalog maintenance itself lives with external
//! collaborators; the core only queries the definitions published here.

pub mod domain;
pub mod store;

pub use domain::{
    BuyerId, GroupTag, Paper, PaperId, PaperType, PriceBook, Product, ProductId, ProductKind,
    StorageRef, SubjectCode,
};
pub use store::{grouped_papers, CatalogError, CatalogStore, PaperCatalog, PaperFilter};
