use serde::{Deserialize, Serialize};

/// Discount shapes supported by the coupon registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    Flat,
    Percent,
}

/// Normalized discount resolved from a coupon code. Immutable once resolved;
/// a selection carries at most one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountDescriptor {
    pub code: String,
    pub kind: DiscountKind,
    pub value: u32,
}

impl DiscountDescriptor {
    /// Apply the discount to a base price in whole rupees. Flat discounts
    /// floor at zero; percent discounts round half-up.
    pub fn apply(&self, base_price: u32) -> u32 {
        match self.kind {
            DiscountKind::Flat => base_price.saturating_sub(self.value),
            DiscountKind::Percent => {
                let retained = u64::from(100 - self.value.min(100));
                let discounted = (u64::from(base_price) * retained + 50) / 100;
                u32::try_from(discounted).unwrap_or(u32::MAX)
            }
        }
    }
}

/// Coupon registry seam. Resolution is a plain lookup; validity windows and
/// redemption limits stay with the discount-management collaborator.
pub trait DiscountResolver: Send + Sync {
    fn resolve(&self, code: &str) -> Result<DiscountDescriptor, DiscountError>;
}

/// Error enumeration for coupon resolution.
#[derive(Debug, thiserror::Error)]
pub enum DiscountError {
    #[error("coupon code '{0}' was not recognized")]
    NotFound(String),
    #[error("discount registry unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(value: u32) -> DiscountDescriptor {
        DiscountDescriptor {
            code: "FLAT".to_string(),
            kind: DiscountKind::Flat,
            value,
        }
    }

    fn percent(value: u32) -> DiscountDescriptor {
        DiscountDescriptor {
            code: "PCT".to_string(),
            kind: DiscountKind::Percent,
            value,
        }
    }

    #[test]
    fn flat_discount_subtracts() {
        assert_eq!(flat(100).apply(6000), 5900);
    }

    #[test]
    fn flat_discount_floors_at_zero() {
        assert_eq!(flat(700).apply(450), 0);
    }

    #[test]
    fn percent_discount_rounds_half_up() {
        assert_eq!(percent(10).apply(450), 405);
        assert_eq!(percent(33).apply(100), 67);
        assert_eq!(percent(15).apply(450), 383);
    }

    #[test]
    fn percent_discount_clamps_above_hundred() {
        assert_eq!(percent(150).apply(2000), 0);
    }
}
