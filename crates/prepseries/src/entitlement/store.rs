use crate::catalog::{BuyerId, ProductId};

use super::Enrollment;

/// Storage abstraction for purchase records so the storefront service can be
/// exercised in isolation. Enrollments are write-once.
pub trait EnrollmentStore: Send + Sync {
    fn record(&self, enrollment: Enrollment) -> Result<Enrollment, EnrollmentStoreError>;
    fn fetch(
        &self,
        buyer: &BuyerId,
        product: &ProductId,
    ) -> Result<Option<Enrollment>, EnrollmentStoreError>;
}

/// Error enumeration for enrollment persistence.
#[derive(Debug, thiserror::Error)]
pub enum EnrollmentStoreError {
    #[error("an enrollment already exists for this buyer and product")]
    Conflict,
    #[error("enrollment store unavailable: {0}")]
    Unavailable(String),
}
