use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Largest fraction of a half-spread that inventory may remove.
pub const MAX_SKEW: Decimal = dec!(0.5);

/// Fraction by which the unwinding side's half-spread is tightened.
///
/// Linear in `|position| / threshold`, saturating at [`MAX_SKEW`] once the
/// position reaches the threshold. The sign of the position is ignored; the
/// caller decides which side to tighten. A zero threshold disables skew.
pub fn skew_fraction(position: Decimal, threshold: Decimal) -> Decimal {
    if threshold <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let ratio = position.abs() / threshold;

    (ratio * MAX_SKEW).min(MAX_SKEW)
}
