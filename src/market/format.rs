//! Display formatting for quote values

/// Abbreviate a large number: 1.25T, 2.40B, 35.10M, 1.20K
pub fn format_number(num: f64) -> String {
    if num >= 1e12 {
        format!("{:.2}T", num / 1e12)
    } else if num >= 1e9 {
        format!("{:.2}B", num / 1e9)
    } else if num >= 1e6 {
        format!("{:.2}M", num / 1e6)
    } else if num >= 1e3 {
        format!("{:.2}K", num / 1e3)
    } else {
        format!("{:.2}", num)
    }
}

/// US-dollar formatting with thousands separators
pub fn format_currency(num: f64) -> String {
    let negative = num < 0.0;
    let cents = (num.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let fraction = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if negative { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, fraction)
}

/// Signed percentage: +1.25%, -0.80%
pub fn format_percent(num: f64) -> String {
    let sign = if num >= 0.0 { "+" } else { "" };
    format!("{}{:.2}%", sign, num)
}
