//! Cleanup of numeric-looking attribute values
//!
//! Listing pages render numbers for humans: "299 900 Kč", "136 000 km",
//! "110 kW". Extraction keeps these as strings but drops unit tokens and
//! thousands separators so a later stage can coerce them.

/// Unit and currency tokens removed from numeric values
const UNIT_TOKENS: [&str; 7] = ["Kč", "CZK", "€", "EUR", ",-", "kW", "km"];

/// Strips unit tokens and all whitespace, including non-breaking spaces
///
/// Unit tokens are matched case-insensitively, so "KM" and "kw" go too.
pub fn clean_numeric(raw: &str) -> String {
    let mut value: String = raw.chars().filter(|c| !is_separator(*c)).collect();

    for token in UNIT_TOKENS {
        value = remove_ignore_case(&value, token);
    }

    value.trim().to_string()
}

/// Cleans a power value, keeping only the kW figure
///
/// Values like "110 kW (150 k)" carry a horsepower figure after the kW one.
pub fn clean_power(raw: &str) -> String {
    let lower = raw.to_lowercase();
    match lower.find("kw") {
        Some(idx) if raw.is_char_boundary(idx) => clean_numeric(&raw[..idx]),
        _ => clean_numeric(raw),
    }
}

/// True for a plausible four-digit model year
pub fn is_year(text: &str) -> bool {
    let text = text.trim();
    text.len() == 4
        && text.chars().all(|c| c.is_ascii_digit())
        && matches!(text.parse::<u32>(), Ok(y) if y > 1900 && y < 2100)
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == '\u{a0}' || c == '\u{202f}' || c == '\u{2009}'
}

fn remove_ignore_case(haystack: &str, needle: &str) -> String {
    let needle_lower = needle.to_lowercase();
    let mut out = String::with_capacity(haystack.len());
    let mut rest = haystack;

    while !rest.is_empty() {
        let candidate_len = rest
            .char_indices()
            .nth(needle.chars().count())
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        if rest[..candidate_len].to_lowercase() == needle_lower {
            rest = &rest[candidate_len..];
            continue;
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_price() {
        assert_eq!(clean_numeric("299 900 Kč"), "299900");
        assert_eq!(clean_numeric("299\u{a0}900\u{a0}Kč"), "299900");
        assert_eq!(clean_numeric("1 249 000 CZK"), "1249000");
    }

    #[test]
    fn test_clean_mileage() {
        assert_eq!(clean_numeric("136 000 km"), "136000");
        assert_eq!(clean_numeric("21\u{202f}500 KM"), "21500");
    }

    #[test]
    fn test_clean_power() {
        assert_eq!(clean_power("110 kW"), "110");
        assert_eq!(clean_power("110 kW (150 k)"), "110");
        assert_eq!(clean_power("85"), "85");
    }

    #[test]
    fn test_clean_leaves_no_units() {
        for raw in ["59 kW", "12 345 km", "99 000 Kč", "7\u{a0}000,- Kč"] {
            let cleaned = clean_numeric(raw);
            assert!(!cleaned.contains("kW"), "{cleaned}");
            assert!(!cleaned.contains("km"), "{cleaned}");
            assert!(!cleaned.contains("Kč"), "{cleaned}");
            assert!(!cleaned.contains('\u{a0}'), "{cleaned}");
            assert!(!cleaned.contains(' '), "{cleaned}");
        }
    }

    #[test]
    fn test_is_year() {
        assert!(is_year("2019"));
        assert!(is_year(" 1999 "));
        assert!(!is_year("19"));
        assert!(!is_year("1800"));
        assert!(!is_year("20a9"));
    }
}
