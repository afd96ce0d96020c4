//! Fixed-point money and share-quantity representation
//!
//! Cash moves in whole US cents and shares in millionths of a share, both as
//! i64. Replaying a transaction log with f64 accumulates drift and forces
//! epsilon comparisons everywhere ("is this position closed?"); with scaled
//! integers a flat position is exactly zero.

/// Whole US cents.
pub type UsdCents = i64;

/// Millionths of a share.
pub type MicroShares = i64;

/// Scale factor for [`MicroShares`].
pub const MICRO: i64 = 1_000_000;

/// Convert a dollar amount from the wire into cents (round half away from zero).
pub fn dollars_to_cents(dollars: f64) -> UsdCents {
    (dollars * 100.0).round() as i64
}

/// Convert cents back into dollars for responses.
pub fn cents_to_dollars(cents: UsdCents) -> f64 {
    cents as f64 / 100.0
}

/// Convert a share count from the wire into micro-shares.
pub fn shares_to_micro(shares: f64) -> MicroShares {
    (shares * MICRO as f64).round() as i64
}

/// Convert micro-shares back into a display share count.
pub fn micro_to_shares(micro: MicroShares) -> f64 {
    micro as f64 / MICRO as f64
}

/// `price_cents * quantity` where quantity is in micro-shares.
///
/// Widens through i128: a $1M price (1e8 cents) times a 1M-share position
/// (1e12 micro) overflows i64 in the intermediate product. None when the
/// final amount itself does not fit an i64.
pub fn sale_amount(price_cents: UsdCents, quantity: MicroShares) -> Option<UsdCents> {
    let wide = (price_cents as i128 * quantity as i128) / MICRO as i128;
    i64::try_from(wide).ok()
}

/// `value * numer / denom` with an i128 intermediate.
///
/// Used for the pro-rata cost reduction on partial sells. `denom` must be
/// non-zero; callers guard on `shares > 0` first.
pub fn mul_div(value: i64, numer: i64, denom: i64) -> i64 {
    ((value as i128 * numer as i128) / denom as i128) as i64
}

/// Average price per share in cents, or None for a flat position.
pub fn avg_price_cents(cost: UsdCents, shares: MicroShares) -> Option<UsdCents> {
    if shares <= 0 {
        return None;
    }
    Some(((cost as i128 * MICRO as i128) / shares as i128) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dollar_round_trip() {
        assert_eq!(dollars_to_cents(1000.0), 100_000);
        assert_eq!(dollars_to_cents(0.01), 1);
        assert_eq!(cents_to_dollars(99_600_00), 99_600.0);
    }

    #[test]
    fn test_share_scaling() {
        assert_eq!(shares_to_micro(10.0), 10_000_000);
        assert_eq!(shares_to_micro(0.5), 500_000);
        assert_eq!(micro_to_shares(6_000_000), 6.0);
    }

    #[test]
    fn test_sale_amount() {
        // 4 shares at $150.00 -> $600.00
        assert_eq!(sale_amount(150_00, 4 * MICRO), Some(600_00));
        // fractional quantity: 0.5 shares at $10.00 -> $5.00
        assert_eq!(sale_amount(10_00, MICRO / 2), Some(5_00));
    }

    #[test]
    fn test_sale_amount_large_position_no_overflow() {
        // $10,000.00 price, 1,000,000 shares
        assert_eq!(
            sale_amount(10_000_00, 1_000_000 * MICRO),
            Some(1_000_000 * 10_000_00)
        );
    }

    #[test]
    fn test_sale_amount_out_of_range_is_none() {
        // A saturated wire quantity times a $20,000 share blows past i64
        assert_eq!(sale_amount(20_000_00, i64::MAX), None);
        assert_eq!(sale_amount(i64::MAX, i64::MAX), None);
        // while the same quantity at a modest price still fits
        assert!(sale_amount(150_00, i64::MAX).is_some());
    }

    #[test]
    fn test_avg_price() {
        // $300.00 invested over 5 shares -> $60.00/share
        assert_eq!(avg_price_cents(300_00, 5 * MICRO), Some(60_00));
        assert_eq!(avg_price_cents(300_00, 0), None);
    }
}
