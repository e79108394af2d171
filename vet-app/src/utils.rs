use chrono::{DateTime, Local, Utc};
use rust_decimal::Decimal;
use vet_core::calculations::round_half_up;

/// Inserts `,` every three digits of the integer part.
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Formats an amount for display: rounded half up to cents, thousands
/// separated, euro sign in front (e.g. `€1,234.50`, `-€3.00`).
pub fn format_money(amount: Decimal) -> String {
    let rounded = round_half_up(amount);
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}€{}.{frac_part}", group_thousands(int_part))
}

/// Quantities and rates without trailing zeros (`2`, `0.5`, `21`).
pub fn format_number(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Creation date as the clinic sees it, in local time.
pub fn format_date(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d").to_string()
}
