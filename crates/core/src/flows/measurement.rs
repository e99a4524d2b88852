use std::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Parses a customer-typed area in m².
///
/// The first `,` is read as the decimal separator and, like a lenient float
/// parser, only the leading numeric portion counts (`"25,5 m2"` is `25.5`).
/// Returns `None` unless the result is a finite positive number. Values
/// beyond `Decimal`'s range saturate at `Decimal::MAX`; values below its
/// precision round towards zero.
pub fn parse_measurement(text: &str) -> Option<Decimal> {
    let normalized = text.replacen(',', ".", 1);
    let literal = leading_number(normalized.trim_start())?;
    let value = f64::from_str(&literal).ok()?;
    if !value.is_finite() || value <= 0.0 {
        return None;
    }

    let exact = if literal.contains('e') {
        Decimal::from_scientific(&literal).ok()
    } else {
        Decimal::from_str(&literal).ok()
    };
    Some(exact.or_else(|| Decimal::from_f64(value)).unwrap_or(if value > 1.0 {
        Decimal::MAX
    } else {
        Decimal::ZERO
    }))
}

fn leading_number(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut index = 0;
    let mut literal = String::new();

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        if bytes[0] == b'-' {
            literal.push('-');
        }
        index += 1;
    }

    let int_start = index;
    while index < bytes.len() && bytes[index].is_ascii_digit() {
        index += 1;
    }
    let int_digits = &input[int_start..index];

    let mut frac_digits = "";
    if index < bytes.len() && bytes[index] == b'.' {
        let frac_start = index + 1;
        let mut cursor = frac_start;
        while cursor < bytes.len() && bytes[cursor].is_ascii_digit() {
            cursor += 1;
        }
        frac_digits = &input[frac_start..cursor];
        if !int_digits.is_empty() || !frac_digits.is_empty() {
            index = cursor;
        }
    }

    if int_digits.is_empty() && frac_digits.is_empty() {
        return None;
    }

    literal.push_str(if int_digits.is_empty() { "0" } else { int_digits });
    if !frac_digits.is_empty() {
        literal.push('.');
        literal.push_str(frac_digits);
    }

    if index < bytes.len() && matches!(bytes[index], b'e' | b'E') {
        let mut cursor = index + 1;
        let mut exponent = String::new();
        if cursor < bytes.len() && matches!(bytes[cursor], b'+' | b'-') {
            if bytes[cursor] == b'-' {
                exponent.push('-');
            }
            cursor += 1;
        }
        let exp_start = cursor;
        while cursor < bytes.len() && bytes[cursor].is_ascii_digit() {
            cursor += 1;
        }
        if cursor > exp_start {
            exponent.push_str(&input[exp_start..cursor]);
            literal.push('e');
            literal.push_str(&exponent);
        }
    }

    Some(literal)
}

/// Material estimate for an area plus a waste margin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BudgetSummary {
    pub area: Decimal,
    pub margin_pct: Decimal,
    pub margin_area: Decimal,
    pub total_area: Decimal,
}

impl BudgetSummary {
    /// `total = area * (1 + margin/100)`, both derived amounts rounded to two
    /// decimals. Arithmetic saturates at the `Decimal` bounds.
    pub fn compute(area: Decimal, margin_pct: Decimal) -> Self {
        let ratio = margin_pct / Decimal::ONE_HUNDRED;
        let margin_area = area.saturating_mul(ratio);
        let total_area = area.saturating_mul(Decimal::ONE.saturating_add(ratio));

        Self {
            area,
            margin_pct,
            margin_area: two_decimals(margin_area),
            total_area: two_decimals(total_area),
        }
    }
}

fn two_decimals(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{parse_measurement, BudgetSummary};

    #[test]
    fn accepts_comma_and_dot_decimals() {
        assert_eq!(parse_measurement("25,5"), Some(Decimal::new(255, 1)));
        assert_eq!(parse_measurement("25.5"), Some(Decimal::new(255, 1)));
        assert_eq!(parse_measurement("  20 "), Some(Decimal::from(20)));
        assert_eq!(parse_measurement(",5"), Some(Decimal::new(5, 1)));
    }

    #[test]
    fn reads_only_the_leading_number() {
        assert_eq!(parse_measurement("30m2"), Some(Decimal::from(30)));
        assert_eq!(parse_measurement("12,5 metros"), Some(Decimal::new(125, 1)));
        assert_eq!(parse_measurement("1e2"), Some(Decimal::from(100)));
    }

    #[test]
    fn accepts_numbers_outside_decimal_range() {
        assert_eq!(parse_measurement("1e30"), Some(Decimal::MAX));
        assert_eq!(parse_measurement("100000000000000000000000000000"), Some(Decimal::MAX));

        let tiny = parse_measurement("1e-30").expect("tiny area is a positive number");
        let summary = BudgetSummary::compute(tiny, Decimal::from(10));
        assert_eq!(summary.total_area.to_string(), "0.00");
        assert_eq!(summary.margin_area.to_string(), "0.00");
    }

    #[test]
    fn rejects_non_finite_input() {
        assert_eq!(parse_measurement("1e400"), None);
        assert_eq!(parse_measurement("-1e400"), None);
    }

    #[test]
    fn huge_area_saturates_instead_of_failing() {
        let summary = BudgetSummary::compute(Decimal::MAX, Decimal::from(10));
        assert_eq!(summary.total_area, Decimal::MAX);
        assert!(summary.margin_area > Decimal::ZERO);
    }

    #[test]
    fn rejects_non_numeric_and_non_positive_input() {
        assert_eq!(parse_measurement("vinte"), None);
        assert_eq!(parse_measurement(""), None);
        assert_eq!(parse_measurement("0"), None);
        assert_eq!(parse_measurement("-3"), None);
        assert_eq!(parse_measurement("."), None);
        assert_eq!(parse_measurement("m2 30"), None);
    }

    #[test]
    fn budget_applies_margin_and_rounds_to_cents() {
        let summary = BudgetSummary::compute(Decimal::from(20), Decimal::from(10));
        assert_eq!(summary.total_area.to_string(), "22.00");
        assert_eq!(summary.margin_area.to_string(), "2.00");

        let summary = BudgetSummary::compute(Decimal::new(255, 1), Decimal::from(10));
        assert_eq!(summary.total_area.to_string(), "28.05");
        assert_eq!(summary.margin_area.to_string(), "2.55");
    }

    #[test]
    fn budget_rounds_half_away_from_zero() {
        let summary = BudgetSummary::compute(Decimal::new(1005, 2), Decimal::from(15));
        // 10.05 * 1.15 = 11.5575
        assert_eq!(summary.total_area.to_string(), "11.56");
        // 10.05 * 0.15 = 1.5075
        assert_eq!(summary.margin_area.to_string(), "1.51");
    }
}
