//! Currency formatting for display cells.

/// Format an amount as `USD 1,234.56`. Missing amounts render as `""`.
pub fn format_usd(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("USD {}", group_thousands(v)),
        _ => String::new(),
    }
}

/// Parse a string produced by [`format_usd`] back to its amount.
pub fn parse_usd(text: &str) -> Option<f64> {
    let digits: String = text
        .trim()
        .strip_prefix("USD")?
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    digits.parse().ok()
}

fn group_thousands(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((&fixed, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value.is_sign_negative() && value != 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}
