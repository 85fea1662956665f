//! Odds Math
//!
//! Pure conversions between American and decimal odds plus parlay
//! multiplier composition. All functions here are total: malformed prices
//! degrade to a no-op multiplier (decimal 1.0 / American 0) rather than
//! erroring, so settlement arithmetic can never fail mid-commit.

/// American odds price, e.g. `-110` or `+150`.
pub type AmericanPrice = i32;

/// Convert American odds to a decimal multiplier (stake included).
///
/// A price of 0 is treated as a no-op multiplier of 1.0.
#[inline]
pub fn american_to_decimal(price: AmericanPrice) -> f64 {
    if price == 0 {
        return 1.0;
    }
    if price > 0 {
        1.0 + price as f64 / 100.0
    } else {
        1.0 + 100.0 / (price as f64).abs()
    }
}

/// Convert decimal odds back to the American format.
///
/// Decimals at or below 1.0 (or non-finite) map to 0.
#[inline]
pub fn decimal_to_american(decimal: f64) -> AmericanPrice {
    if !decimal.is_finite() || decimal <= 1.0 {
        return 0;
    }
    if decimal >= 2.0 {
        ((decimal - 1.0) * 100.0).round() as AmericanPrice
    } else {
        (-100.0 / (decimal - 1.0)).round() as AmericanPrice
    }
}

/// Implied win probability for an American price (0.0 for a zero price).
#[inline]
pub fn implied_probability(price: AmericanPrice) -> f64 {
    if price == 0 {
        return 0.0;
    }
    let abs = (price as f64).abs();
    if price > 0 {
        100.0 / (abs + 100.0)
    } else {
        abs / (abs + 100.0)
    }
}

/// Combined decimal odds of a parlay: the product of each leg's decimal odds.
pub fn parlay_decimal_odds<I>(prices: I) -> f64
where
    I: IntoIterator<Item = AmericanPrice>,
{
    prices
        .into_iter()
        .fold(1.0, |acc, price| acc * american_to_decimal(price))
}

/// Combined American odds of a parlay.
pub fn parlay_american_odds<I>(prices: I) -> AmericanPrice
where
    I: IntoIterator<Item = AmericanPrice>,
{
    decimal_to_american(parlay_decimal_odds(prices))
}

/// Gross payout (stake included) if every leg wins.
pub fn potential_payout<I>(stake: f64, prices: I) -> f64
where
    I: IntoIterator<Item = AmericanPrice>,
{
    stake * parlay_decimal_odds(prices)
}
