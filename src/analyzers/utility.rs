/// Divides `part` by `whole`, returning 0.0 when `whole` is zero.
pub fn ratio(part: f64, whole: f64) -> f64 {
    if whole == 0.0 { 0.0 } else { part / whole }
}

/// `part` as a percentage of `total`, 0.0 for an empty total.
pub fn pct(part: f64, total: f64) -> f64 {
    ratio(part, total) * 100.0
}

/// Rounds to one decimal place, halves away from zero.
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Percentage change from `previous` to `current`.
///
/// A zero baseline reports +100% for any positive current value and 0% when
/// both are zero, so a period starting from nothing never yields infinity.
pub fn percent_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        if current > 0.0 { 100.0 } else { 0.0 }
    } else {
        (current - previous) / previous * 100.0
    }
}

/// Sums counts, pinning at `u64::MAX` instead of overflowing.
pub fn saturating_total<I: IntoIterator<Item = u64>>(values: I) -> u64 {
    values.into_iter().fold(0, u64::saturating_add)
}

/// Formats a count with thousands separators (`12345` -> `"12,345"`).
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out
}
