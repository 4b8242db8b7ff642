//! Checkout URL construction.
//!
//! The application never talks to the payment processor directly: it
//! computes the discounted amount and hands the caller a redirect URL.
//! Webhook / return handling lives outside this service.

use uuid::Uuid;

/// Applies subscription discounts to a plan price. Percent first, then the
/// fixed amount, floored at zero.
pub fn discounted_price_cents(
    base_cents: i32,
    discount_percent: Option<i32>,
    discount_cents: Option<i32>,
) -> i32 {
    let mut price = base_cents as i64;
    if let Some(percent) = discount_percent {
        let percent = percent.clamp(0, 100) as i64;
        price -= price * percent / 100;
    }
    if let Some(cents) = discount_cents {
        price -= cents.max(0) as i64;
    }
    price.max(0) as i32
}

/// Builds the redirect URL for the external payment processor.
pub fn build_checkout_url(
    base_url: &str,
    plan_id: &str,
    user_id: Uuid,
    amount_cents: i32,
) -> String {
    format!(
        "{}/checkout?plan={}&user={}&amount_cents={}",
        base_url.trim_end_matches('/'),
        plan_id,
        user_id,
        amount_cents
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_discount_keeps_base_price() {
        assert_eq!(discounted_price_cents(4_900, None, None), 4_900);
    }

    #[test]
    fn percent_discount_applies() {
        assert_eq!(discounted_price_cents(10_000, Some(25), None), 7_500);
    }

    #[test]
    fn fixed_discount_applies_after_percent() {
        // 10000 - 10% = 9000, then -500 = 8500
        assert_eq!(discounted_price_cents(10_000, Some(10), Some(500)), 8_500);
    }

    #[test]
    fn price_never_goes_negative() {
        assert_eq!(discounted_price_cents(1_000, Some(100), Some(500)), 0);
        assert_eq!(discounted_price_cents(1_000, None, Some(5_000)), 0);
    }

    #[test]
    fn checkout_url_shape() {
        let user = Uuid::nil();
        let url = build_checkout_url("https://pay.example.com/", "COMPANY_PRO", user, 14_900);
        assert_eq!(
            url,
            format!("https://pay.example.com/checkout?plan=COMPANY_PRO&user={user}&amount_cents=14900")
        );
    }
}
