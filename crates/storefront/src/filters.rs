//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Format a decimal amount as a USD price string.
///
/// Usage in templates: `{{ product.price|usd }}`
#[askama::filter_fn]
pub fn usd(amount: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format!("${amount:.2}"))
}

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use askama::NO_VALUES;
    use rust_decimal::Decimal;

    #[test]
    fn test_usd_pads_cents() {
        let price = Decimal::new(2400, 2);
        assert_eq!(usd::default().execute(&price, NO_VALUES).unwrap(), "$24.00");

        let price = Decimal::new(95, 1);
        assert_eq!(usd::default().execute(&price, NO_VALUES).unwrap(), "$9.50");
    }
}
