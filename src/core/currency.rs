//! Currency catalogue and display formatting

use chrono::{DateTime, Utc};
use num_format::{Locale, ToFormattedString};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Currency {
    pub code: &'static str,
    pub name: &'static str,
    pub symbol: &'static str,
}

pub const CURRENCIES: &[Currency] = &[
    Currency {
        code: "USD",
        name: "US Dollar",
        symbol: "$",
    },
    Currency {
        code: "EUR",
        name: "Euro",
        symbol: "€",
    },
    Currency {
        code: "INR",
        name: "Indian Rupee",
        symbol: "₹",
    },
    Currency {
        code: "GBP",
        name: "British Pound",
        symbol: "£",
    },
    Currency {
        code: "JPY",
        name: "Japanese Yen",
        symbol: "¥",
    },
    Currency {
        code: "CAD",
        name: "Canadian Dollar",
        symbol: "C$",
    },
    Currency {
        code: "AUD",
        name: "Australian Dollar",
        symbol: "A$",
    },
];

/// Looks up a currency by code, ignoring case.
pub fn find(code: &str) -> Option<&'static Currency> {
    CURRENCIES.iter().find(|c| c.code.eq_ignore_ascii_case(code))
}

pub fn symbol_for(code: &str) -> &'static str {
    find(code).map_or("", |c| c.symbol)
}

/// Formats an amount with the currency symbol, en-US digit grouping and
/// exactly `decimals` fractional digits, e.g. `$1,234.50`.
pub fn format_currency(amount: f64, code: &str, decimals: usize) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let fixed = format!("{:.*}", decimals, amount.abs());
    let (whole, fraction) = match fixed.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (fixed.as_str(), None),
    };
    let grouped = whole
        .parse::<u64>()
        .map(|w| w.to_formatted_string(&Locale::en))
        .unwrap_or_else(|_| whole.to_string());

    match fraction {
        Some(f) => format!("{sign}{}{grouped}.{f}", symbol_for(code)),
        None => format!("{sign}{}{grouped}", symbol_for(code)),
    }
}

/// Short month/day/year form, e.g. `Jan 5, 2024`.
pub fn format_date(time: &DateTime<Utc>) -> String {
    time.format("%b %-d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_find_is_case_insensitive() {
        assert_eq!(find("inr").map(|c| c.symbol), Some("₹"));
        assert!(find("XYZ").is_none());
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(1234.5, "USD", 2), "$1,234.50");
        assert_eq!(format_currency(83000.0, "INR", 2), "₹83,000.00");
        assert_eq!(format_currency(0.125, "EUR", 4), "€0.1250");
        assert_eq!(format_currency(-38000.0, "GBP", 2), "-£38,000.00");
        assert_eq!(format_currency(1500.0, "JPY", 0), "¥1,500");
    }

    #[test]
    fn test_format_currency_unknown_code_has_no_symbol() {
        assert_eq!(format_currency(10.0, "CHF", 2), "10.00");
    }

    #[test]
    fn test_format_date() {
        let time = Utc.with_ymd_and_hms(2024, 1, 5, 13, 0, 0).unwrap();
        assert_eq!(format_date(&time), "Jan 5, 2024");
    }
}
