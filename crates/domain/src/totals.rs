//! Totals engine: pure computation of an order's total breakdown.

use serde::{Deserialize, Serialize};

use crate::coupon::Coupon;
use crate::order::{LineItem, Money};

/// A consistent breakdown of an order's totals, all in minor units.
///
/// Invariant: `grand_total == items_total - coupon_total + shipping_total
/// + tax_total`, clamped at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalsBreakdown {
    pub items_total: Money,
    pub coupon_total: Money,
    pub shipping_total: Money,
    pub tax_total: Money,
    pub grand_total: Money,
}

/// Computes the totals breakdown for a set of line items.
///
/// Pure and deterministic: identical inputs produce identical outputs.
/// The coupon, if present, is assumed to have been eligibility-checked by
/// the caller; only its discount function is applied here. Empty line
/// items are not an error and produce a zero breakdown.
pub fn compute(
    line_items: &[LineItem],
    coupon: Option<&Coupon>,
    shipping_quote: Money,
    tax_quote: Money,
) -> TotalsBreakdown {
    let items_total: Money = line_items.iter().map(LineItem::total).sum();

    let coupon_total = coupon
        .map(|c| c.discount(items_total))
        .unwrap_or_default();

    let discounted = items_total.saturating_sub(coupon_total);
    let grand_total = std::cmp::max(discounted + shipping_quote + tax_quote, Money::zero());

    TotalsBreakdown {
        items_total,
        coupon_total,
        shipping_total: shipping_quote,
        tax_total: tax_quote,
        grand_total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coupon::DiscountKind;

    fn items(rows: &[(u32, i64)]) -> Vec<LineItem> {
        rows
            .iter()
            .enumerate()
            .map(|(i, &(qty, cents))| {
                LineItem::new(format!("SKU-{i:03}"), qty, Money::from_cents(cents))
            })
            .collect()
    }

    #[test]
    fn test_empty_line_items_are_zero_not_an_error() {
        let breakdown = compute(&[], None, Money::zero(), Money::zero());
        assert_eq!(breakdown, TotalsBreakdown::default());
    }

    #[test]
    fn test_items_total_sums_captured_unit_totals() {
        let line_items = items(&[(2, 1500), (1, 250)]);
        let breakdown = compute(&line_items, None, Money::zero(), Money::zero());
        assert_eq!(breakdown.items_total.cents(), 3250);
        assert_eq!(breakdown.grand_total.cents(), 3250);
    }

    #[test]
    fn test_grand_total_identity() {
        let line_items = items(&[(1, 1234)]);
        let coupon = Coupon::new("TEN", DiscountKind::Percentage, 10);
        let breakdown = compute(
            &line_items,
            Some(&coupon),
            Money::from_cents(500),
            Money::from_cents(99),
        );

        assert_eq!(breakdown.coupon_total.cents(), 123);
        assert_eq!(
            breakdown.grand_total,
            breakdown.items_total - breakdown.coupon_total
                + breakdown.shipping_total
                + breakdown.tax_total
        );
        assert_eq!(breakdown.grand_total.cents(), 1234 - 123 + 500 + 99);
    }

    #[test]
    fn test_percentage_coupon_on_1500_is_150() {
        let line_items = items(&[(1, 1500)]);
        let coupon = Coupon::new("TEN", DiscountKind::Percentage, 10);
        let breakdown = compute(&line_items, Some(&coupon), Money::zero(), Money::zero());
        assert_eq!(breakdown.coupon_total.cents(), 150);
        assert_eq!(breakdown.grand_total.cents(), 1350);
    }

    #[test]
    fn test_fixed_coupon_clamps_at_items_total() {
        let line_items = items(&[(1, 1500)]);
        let coupon = Coupon::new("BIG", DiscountKind::Fixed, 2000);
        let breakdown = compute(&line_items, Some(&coupon), Money::zero(), Money::zero());
        assert_eq!(breakdown.coupon_total.cents(), 1500);
        assert_eq!(breakdown.grand_total.cents(), 0);
    }

    #[test]
    fn test_grand_total_never_negative() {
        let line_items = items(&[(1, 100)]);
        let coupon = Coupon::new("HUGE", DiscountKind::Fixed, 100_000);
        let breakdown = compute(&line_items, Some(&coupon), Money::zero(), Money::zero());
        assert!(breakdown.grand_total >= Money::zero());
    }

    #[test]
    fn test_deterministic() {
        let line_items = items(&[(3, 999), (1, 1)]);
        let coupon = Coupon::new("SEVEN", DiscountKind::Percentage, 7);
        let a = compute(&line_items, Some(&coupon), Money::from_cents(100), Money::from_cents(37));
        let b = compute(&line_items, Some(&coupon), Money::from_cents(100), Money::from_cents(37));
        assert_eq!(a, b);
    }
}
