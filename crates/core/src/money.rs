/// Rounds a currency amount to two decimal places.
///
/// Intermediate sums keep full precision; call this only when producing a
/// response value.
pub fn round2(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Formats an amount as dollars with two decimals, e.g. `$12.50`.
pub fn usd(amount: f64) -> String {
    format!("${amount:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_cent_up() {
        assert_eq!(round2(14.988), 14.99);
        assert_eq!(round2(26.740000000000002), 26.74);
        assert_eq!(round2(326.239125), 326.24);
    }

    #[test]
    fn formats_with_two_decimals() {
        assert_eq!(usd(0.0), "$0.00");
        assert_eq!(usd(9.99), "$9.99");
        assert_eq!(usd(2.5), "$2.50");
    }
}
