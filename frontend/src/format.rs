//! Rupiah and percentage formatting shared by the tables.

/// `15000` → `"15.000"`. Fractions are rounded away.
pub fn thousands(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

pub fn rupiah(value: f64) -> String {
    format!("Rp {}", thousands(value))
}

/// Keeps only the digits of a (possibly formatted) amount typed by the user.
pub fn unformat(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// Parses a typed amount; `None` when there are no digits at all.
pub fn parse_amount(input: &str) -> Option<i64> {
    unformat(input).parse().ok()
}

/// Change from `old` to `new` in percent, two decimals: `"12.50%"`.
pub fn percent_change(old: f64, new: Option<f64>) -> String {
    match new {
        Some(new) if new > 0.0 && old != 0.0 => format!("{:.2}%", (new - old) / old * 100.0),
        _ => "0%".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands_with_dots() {
        assert_eq!(thousands(0.0), "0");
        assert_eq!(thousands(950.0), "950");
        assert_eq!(thousands(15000.0), "15.000");
        assert_eq!(thousands(1234567.4), "1.234.567");
        assert_eq!(thousands(-50000.0), "-50.000");
        assert_eq!(rupiah(52500.0), "Rp 52.500");
    }

    #[test]
    fn typed_amounts_are_stripped_to_digits() {
        assert_eq!(unformat("Rp 15.000"), "15000");
        assert_eq!(parse_amount("12.500"), Some(12500));
        assert_eq!(parse_amount("abc"), None);
    }

    #[test]
    fn percent_change_uses_two_decimals() {
        assert_eq!(percent_change(10000.0, Some(11250.0)), "12.50%");
        assert_eq!(percent_change(12000.0, Some(9000.0)), "-25.00%");
        assert_eq!(percent_change(12000.0, None), "0%");
        assert_eq!(percent_change(0.0, Some(5000.0)), "0%");
    }
}
