//! Parsing of abbreviated engagement counts such as `"1.2K"` or
//! `"1,234 Likes. Like"`.

use std::sync::LazyLock;

use regex::Regex;

static COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d[\d,]*)(?:\.(\d+))?\s?([kmb])?\b").expect("valid count regex")
});

/// Parse the first count in `label`, expanding `K`/`M`/`B` suffixes.
///
/// Returns 0 when the label is empty or carries no number. Saturates at
/// `u64::MAX` instead of overflowing.
#[must_use]
pub fn parse_count(label: &str) -> u64 {
    let Some(caps) = COUNT_RE.captures(label) else {
        return 0;
    };

    let whole_digits: String = caps[1].chars().filter(char::is_ascii_digit).collect();
    let fraction_digits = caps.get(2).map_or("", |m| m.as_str());
    let multiplier: u128 = match caps.get(3).map(|m| m.as_str().to_ascii_uppercase()) {
        Some(s) if s == "K" => 1_000,
        Some(s) if s == "M" => 1_000_000,
        Some(s) if s == "B" => 1_000_000_000,
        _ => 1,
    };

    let Ok(whole) = whole_digits.parse::<u128>() else {
        return u64::MAX;
    };

    // Beyond nine fractional digits nothing survives even the largest multiplier.
    let fraction_digits = &fraction_digits[..fraction_digits.len().min(9)];
    let fraction = if fraction_digits.is_empty() {
        0
    } else {
        let numerator: u128 = fraction_digits.parse().unwrap_or(0);
        let scale = 10u128.pow(u32::try_from(fraction_digits.len()).unwrap_or(9));
        numerator * multiplier / scale
    };

    let total = whole.saturating_mul(multiplier).saturating_add(fraction);
    u64::try_from(total).unwrap_or(u64::MAX)
}
