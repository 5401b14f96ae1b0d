use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

/// Display string used when a listing entry carries no price element
pub const MISSING_PRICE: &str = "N/A";

/// A listed price: the text exactly as the catalogue showed it plus the
/// numeric amount, when one could be read out of it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Price {
    /// Original display string, e.g. `£51.77`
    pub display: String,

    /// Parsed amount; `None` marks an unparseable display string
    pub amount: Option<Decimal>,
}

impl Price {
    /// Builds a price from its display text
    pub fn parse(display: &str) -> Self {
        let display = display.trim();
        Self {
            display: display.to_string(),
            amount: parse_amount(display),
        }
    }

    /// The sentinel for an entry without any price element
    pub fn missing() -> Self {
        Self {
            display: MISSING_PRICE.to_string(),
            amount: None,
        }
    }

    pub fn is_parsed(&self) -> bool {
        self.amount.is_some()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

/// Extracts the numeric amount from a currency-prefixed price string
///
/// Currency symbols, letters and spaces are dropped. When both `.` and `,`
/// appear, whichever comes last is the decimal separator. A lone separator
/// kind is a decimal mark only if it occurs once and is followed by one or
/// two digits (`12,50`); otherwise it groups thousands (`1,250`, `1.250.000`).
pub fn parse_amount(text: &str) -> Option<Decimal> {
    let negative = text.trim_start().starts_with('-');
    let kept: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();

    if !kept.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let decimal_mark = match (kept.rfind('.'), kept.rfind(',')) {
        (Some(dot), Some(comma)) => Some(if dot > comma { '.' } else { ',' }),
        (Some(_), None) => single_kind_decimal_mark(&kept, '.'),
        (None, Some(_)) => single_kind_decimal_mark(&kept, ','),
        (None, None) => None,
    };

    let mut normalized = String::with_capacity(kept.len() + 1);
    if negative {
        normalized.push('-');
    }
    for c in kept.chars() {
        match c {
            '0'..='9' => normalized.push(c),
            sep if Some(sep) == decimal_mark => normalized.push('.'),
            _ => {}
        }
    }

    Decimal::from_str(&normalized).ok()
}

fn single_kind_decimal_mark(kept: &str, sep: char) -> Option<char> {
    if kept.matches(sep).count() != 1 {
        return None;
    }
    let tail = kept.rsplit(sep).next().unwrap_or_default();
    if (1..=2).contains(&tail.len()) {
        Some(sep)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_pound_prefixed_price() {
        let price = Price::parse("£51.77");
        assert_eq!(price.display, "£51.77");
        assert_eq!(price.amount, Some(dec("51.77")));
    }

    #[test]
    fn test_mojibake_currency_prefix() {
        // Pages served as latin-1 but decoded as UTF-8 show the pound sign as "Â£"
        assert_eq!(parse_amount("Â£13.99"), Some(dec("13.99")));
    }

    #[test]
    fn test_thousands_separators() {
        assert_eq!(parse_amount("$1,234.56"), Some(dec("1234.56")));
        assert_eq!(parse_amount("1.234,56 €"), Some(dec("1234.56")));
        assert_eq!(parse_amount("€1.250.000"), Some(dec("1250000")));
        assert_eq!(parse_amount("$1,250"), Some(dec("1250")));
    }

    #[test]
    fn test_comma_decimal_mark() {
        assert_eq!(parse_amount("12,5 zł"), Some(dec("12.5")));
        assert_eq!(parse_amount("12,50"), Some(dec("12.50")));
    }

    #[test]
    fn test_unparseable_keeps_display() {
        let price = Price::parse("  Call for price ");
        assert_eq!(price.display, "Call for price");
        assert_eq!(price.amount, None);
        assert!(!price.is_parsed());
    }

    #[test]
    fn test_missing_price_sentinel() {
        let price = Price::missing();
        assert_eq!(price.to_string(), "N/A");
        assert!(price.amount.is_none());
    }
}
