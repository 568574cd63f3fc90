//! Commerce core for an exam test-series platform.
//!
//! The crate covers the storefront's hard parts: turning a combinatorial
//! selection of series and subjects into a deterministic price, deciding
//! which practice papers a buyer is entitled to see, and driving the
//! answer-sheet submission lifecycle with its irreversible suggested-answer
//! fairness lock. Payment capture, file storage, and catalog maintenance
//! stay behind the narrow traits each area defines.

pub mod catalog;
pub mod config;
pub mod entitlement;
pub mod error;
pub mod pricing;
pub mod storefront;
pub mod submissions;
pub mod telemetry;
