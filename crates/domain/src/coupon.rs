//! Coupon entity and evaluator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::order::{Money, ProductId};

/// Errors raised when parsing or applying a coupon.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponError {
    /// The discount kind is not one of the recognized kinds.
    #[error("Invalid coupon kind: {kind}")]
    InvalidCouponKind { kind: String },

    /// The order's item total is below the coupon's minimum spend.
    #[error("Coupon requires a minimum spend of {minimum} (order total: {actual})")]
    MinimumSpendNotMet { minimum: Money, actual: Money },

    /// None of the order's products are eligible for the coupon.
    #[error("Coupon does not apply to any product in the order")]
    NoEligibleProducts,

    /// The coupon expired before it was applied.
    #[error("Coupon expired at {expired_at}")]
    Expired { expired_at: DateTime<Utc> },

    /// The coupon has been redeemed its maximum number of times.
    #[error("Coupon redemption limit of {limit} reached")]
    RedemptionLimitReached { limit: u32 },
}

/// How a coupon discounts the item total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// A fixed amount in minor units, clamped at the item total.
    Fixed,

    /// A percentage of the item total, rounded down to the nearest
    /// minor unit.
    Percentage,
}

impl DiscountKind {
    /// Returns the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountKind::Fixed => "fixed",
            DiscountKind::Percentage => "percentage",
        }
    }
}

impl std::str::FromStr for DiscountKind {
    type Err = CouponError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fixed" => Ok(DiscountKind::Fixed),
            "percentage" => Ok(DiscountKind::Percentage),
            other => Err(CouponError::InvalidCouponKind {
                kind: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for DiscountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Optional constraints a coupon enforces before it can be applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CouponConstraints {
    /// Minimum item total required, in minor units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_spend: Option<Money>,

    /// If set, at least one line item must reference one of these products.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<ProductId>>,

    /// Coupon is invalid at or after this instant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Maximum number of paid orders that may redeem the coupon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redemption_limit: Option<u32>,
}

/// A discount coupon. An order references at most one coupon at a time;
/// re-applying a coupon replaces the previous one, never stacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    /// The code customers enter at checkout. Also the coupon's identity.
    pub code: String,

    /// How the discount is computed.
    pub kind: DiscountKind,

    /// Fixed amount in minor units, or whole percentage points.
    pub value: i64,

    /// Constraints checked before the coupon is applied.
    #[serde(default)]
    pub constraints: CouponConstraints,

    /// Number of paid orders that have redeemed this coupon.
    #[serde(default)]
    pub redeemed: u32,
}

impl Coupon {
    /// Creates an unconstrained coupon.
    pub fn new(code: impl Into<String>, kind: DiscountKind, value: i64) -> Self {
        Self {
            code: code.into(),
            kind,
            value,
            constraints: CouponConstraints::default(),
            redeemed: 0,
        }
    }

    /// Checks every constraint against an order snapshot.
    ///
    /// `items_total` and `product_ids` describe the order at the moment of
    /// application; `now` is injected so expiry checks stay deterministic.
    pub fn check(
        &self,
        items_total: Money,
        product_ids: &[ProductId],
        now: DateTime<Utc>,
    ) -> Result<(), CouponError> {
        if let Some(minimum) = self.constraints.minimum_spend
            && items_total < minimum
        {
            return Err(CouponError::MinimumSpendNotMet {
                minimum,
                actual: items_total,
            });
        }

        if let Some(ref eligible) = self.constraints.products
            && !product_ids.iter().any(|id| eligible.contains(id))
        {
            return Err(CouponError::NoEligibleProducts);
        }

        if let Some(expires_at) = self.constraints.expires_at
            && now >= expires_at
        {
            return Err(CouponError::Expired {
                expired_at: expires_at,
            });
        }

        if let Some(limit) = self.constraints.redemption_limit
            && self.redeemed >= limit
        {
            return Err(CouponError::RedemptionLimitReached { limit });
        }

        Ok(())
    }

    /// Computes the discount against an item total.
    ///
    /// Percentage discounts round down to the nearest minor unit; fixed
    /// discounts never exceed the item total.
    pub fn discount(&self, items_total: Money) -> Money {
        match self.kind {
            DiscountKind::Fixed => Money::from_cents(self.value).min(items_total),
            DiscountKind::Percentage => {
                Money::from_cents(items_total.cents() * self.value / 100)
            }
        }
    }

    /// Records one redemption.
    pub fn redeem(&mut self) {
        self.redeemed += 1;
    }
}
