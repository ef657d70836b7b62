//! Turns scraped price text into a number.
//!
//! Maya shows prices either in shekels (`₪ 1,234.50`) or in agorot
//! (`123 אג'`), with grouping separators that are not consistent between
//! pages. The marker has to be looked for before anything is stripped,
//! since it is made of non-numeric characters.

use super::error::ExtractError;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Substrings that mark a price quoted in agorot, the 1/100 sub-unit of the shekel.
pub const MINOR_UNIT_MARKERS: &[&str] = &["אג'", "אג׳", "אגורות"];

const SEPARATORS: [char; 2] = ['.', ','];

const CURRENCY_GLYPHS: [char; 4] = ['₪', '$', '€', '£'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceUnit {
    Major,
    Minor,
}

/// A parsed price, always in the major unit. `unit` records what the page
/// showed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedPrice {
    pub value: Decimal,
    pub unit: PriceUnit,
}

pub fn detect_unit(raw: &str) -> PriceUnit {
    if MINOR_UNIT_MARKERS.iter().any(|marker| raw.contains(marker)) {
        PriceUnit::Minor
    } else {
        PriceUnit::Major
    }
}

/// True when `prefix` is a lone minus sign, give or take whitespace and
/// currency glyphs. A dash inside label text is not a sign.
fn has_leading_sign(prefix: &str) -> bool {
    let mut rest = prefix.chars().filter(|c| {
        !c.is_whitespace() && !CURRENCY_GLYPHS.contains(c) && !SEPARATORS.contains(c)
    });
    matches!(rest.next(), Some('-' | '\u{2212}')) && rest.next().is_none()
}

/// Reduces `raw` to a plain decimal literal such as `-1234.5`.
///
/// Only the last `.`/`,` can be a decimal point. It is read as thousands
/// grouping instead when exactly three digits follow it, every earlier
/// separator is the same character and the integer part is not zero, so
/// `1.234` and `1,234,567` are whole numbers while `1,234.50`, `1.234,56`
/// and `0.125` keep their fraction. Returns `None` when there is no digit.
pub fn numeric_literal(raw: &str) -> Option<String> {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || SEPARATORS.contains(c))
        .collect();
    let kept = kept.trim_end_matches(SEPARATORS);
    if !kept.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let negative = raw
        .find(|c: char| c.is_ascii_digit())
        .is_some_and(|first| has_leading_sign(&raw[..first]));

    let mut literal = String::with_capacity(kept.len() + 2);
    if negative {
        literal.push('-');
    }

    match kept.rfind(SEPARATORS) {
        None => literal.push_str(kept),
        Some(pos) => {
            let separator = if kept[pos..].starts_with('.') { '.' } else { ',' };
            let (int_part, frac_part) = (&kept[..pos], &kept[pos + 1..]);
            let int_digits: String = int_part.chars().filter(char::is_ascii_digit).collect();
            let mixed = int_part
                .chars()
                .any(|c| SEPARATORS.contains(&c) && c != separator);
            let grouping = frac_part.len() == 3
                && !mixed
                && !int_digits.trim_start_matches('0').is_empty();

            if grouping {
                literal.push_str(&int_digits);
                literal.push_str(frac_part);
            } else {
                if int_digits.is_empty() {
                    literal.push('0');
                }
                literal.push_str(&int_digits);
                literal.push('.');
                literal.push_str(frac_part);
            }
        }
    }

    Some(literal)
}

/// Parses scraped text into a price in the major unit.
pub fn normalize(raw: &str) -> Result<NormalizedPrice, ExtractError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(ExtractError::EmptyPriceText);
    }

    let unit = detect_unit(text);
    let unparseable = || ExtractError::UnparseableQuote {
        raw: text.to_string(),
    };
    let literal = numeric_literal(text).ok_or_else(unparseable)?;
    let parsed = Decimal::from_str(&literal).map_err(|_| unparseable())?;

    let value = match unit {
        PriceUnit::Major => parsed,
        PriceUnit::Minor => parsed / Decimal::ONE_HUNDRED,
    };
    Ok(NormalizedPrice { value, unit })
}

/// Rejects prices that cannot be real: non-positive ones and ones above
/// `ceiling`, which usually means a misplaced decimal point.
pub fn validate(value: Decimal, ceiling: Decimal) -> Result<Decimal, ExtractError> {
    if value <= Decimal::ZERO || value > ceiling {
        return Err(ExtractError::InvalidPriceRange { value, ceiling });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_marker_switches_to_minor_unit() {
        let price = normalize("123 אג'").unwrap();
        assert_eq!(price.unit, PriceUnit::Minor);
        assert_eq!(price.value, dec("1.23"));

        let price = normalize("12,345.6 אג׳").unwrap();
        assert_eq!(price.unit, PriceUnit::Minor);
        assert_eq!(price.value, dec("123.456"));

        let price = normalize("1,520 אגורות").unwrap();
        assert_eq!(price.value, dec("15.20"));
    }

    #[test]
    fn test_without_marker_value_is_unchanged() {
        let price = normalize("₪ 1,234.50").unwrap();
        assert_eq!(price.unit, PriceUnit::Major);
        assert_eq!(price.value, dec("1234.50"));

        assert_eq!(normalize("123").unwrap().value, dec("123"));
    }

    #[test]
    fn test_last_separator_rule() {
        assert_eq!(numeric_literal("1,234.56").as_deref(), Some("1234.56"));
        assert_eq!(numeric_literal("1.234").as_deref(), Some("1234"));
        assert_eq!(numeric_literal("1234.56").as_deref(), Some("1234.56"));
        assert_eq!(numeric_literal("1.234,56").as_deref(), Some("1234.56"));
        assert_eq!(numeric_literal("1,234,567").as_deref(), Some("1234567"));
        assert_eq!(numeric_literal("1 234,5").as_deref(), Some("1234.5"));
        assert_eq!(numeric_literal("1,234.567").as_deref(), Some("1234.567"));
        assert_eq!(numeric_literal("0.125").as_deref(), Some("0.125"));
        assert_eq!(numeric_literal(".75").as_deref(), Some("0.75"));
        assert_eq!(numeric_literal("99.").as_deref(), Some("99"));
    }

    #[test]
    fn test_currency_glyphs_and_whitespace_are_stripped() {
        assert_eq!(normalize("  $ 98.10\u{a0}").unwrap().value, dec("98.10"));
        assert_eq!(normalize("€1.234,56").unwrap().value, dec("1234.56"));
    }

    #[test]
    fn test_no_digits_is_unparseable() {
        for raw in ["₪", "₪ ,.", "אג'", "-", "N/A"] {
            let err = normalize(raw).unwrap_err();
            assert!(
                matches!(err, ExtractError::UnparseableQuote { .. }),
                "{raw:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_blank_text_is_empty() {
        assert!(matches!(
            normalize("  \n\t ").unwrap_err(),
            ExtractError::EmptyPriceText
        ));
    }

    #[test]
    fn test_negative_sign_is_kept() {
        assert_eq!(normalize("-12.5").unwrap().value, dec("-12.5"));
        assert_eq!(normalize("₪ \u{2212}3").unwrap().value, dec("-3"));
    }

    #[test]
    fn test_dash_in_label_is_not_a_sign() {
        assert_eq!(
            normalize("שער אחרון - ₪ 98.40").unwrap().value,
            dec("98.40")
        );
        assert_eq!(normalize("Last - 12.5").unwrap().value, dec("12.5"));
        assert_eq!(normalize("-₪ 3.10").unwrap().value, dec("-3.10"));
    }

    #[test]
    fn test_validate_range() {
        let ceiling = dec("100000");
        assert_eq!(validate(dec("1234.5"), ceiling).unwrap(), dec("1234.5"));
        assert_eq!(validate(ceiling, ceiling).unwrap(), ceiling);

        for bad in ["0", "-1", "100000.01", "123456789"] {
            assert!(matches!(
                validate(dec(bad), ceiling),
                Err(ExtractError::InvalidPriceRange { .. })
            ));
        }
    }
}
