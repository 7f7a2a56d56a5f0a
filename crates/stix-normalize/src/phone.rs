//! Phone number normalization.

use std::sync::LazyLock;

use regex::Regex;
use stix_model::Normalized;
use stix_standards::NormalizationRules;

/// `x` followed by 1-4 digits at the very end of the raw value.
static EXTENSION_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"x([0-9]{1,4})$").expect("Invalid extension regex"));

/// Normalize a raw phone value to `DDD-DDD-DDDD` or `DDD-DDD-DDDDxEXT`.
///
/// Callers skip empty values; an empty `raw` is treated as too short.
pub fn normalize_phone(raw: &str, rules: &NormalizationRules) -> Normalized {
    let mut digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.starts_with('1') && digits.len() > 10 {
        digits.remove(0);
    }
    if digits.len() < 10 {
        return Normalized::cleared("too short");
    }

    let base = format!("{}-{}-{}", &digits[..3], &digits[3..6], &digits[6..10]);
    let mut truncated = false;
    let value = if digits.len() == 10 {
        base.clone()
    } else {
        match EXTENSION_SUFFIX.captures(raw) {
            Some(captures) => format!("{base}x{}", &captures[1]),
            None => {
                truncated = true;
                base.clone()
            }
        }
    };

    if rules.is_invalid_area_code(&digits[..3]) {
        return Normalized::cleared("invalid area code");
    }
    if rules.is_placeholder_number(&base) {
        return Normalized::cleared("placeholder number");
    }
    if truncated {
        Normalized::corrected(value, "too long, no extension")
    } else if value == raw {
        Normalized::kept(raw, "already canonical")
    } else {
        Normalized::corrected(value, "reformatted")
    }
}
