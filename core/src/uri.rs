//! Field-level grammar of the `cc:` and `cf:` URI forms.
//!
//! Each helper returns `None` when the field does not match its grammar;
//! callers turn that into the error appropriate to the URI kind.

/// Lowercase hex without leading zeros, at most `max_digits` long.
/// A lone `0` is accepted only when `allow_zero` is set.
pub(crate) fn hex_field(field: &str, max_digits: usize, allow_zero: bool) -> Option<&str> {
    let first = field.bytes().next()?;
    let well_formed = field.len() <= max_digits
        && field.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        && (first != b'0' || (allow_zero && field.len() == 1));
    well_formed.then_some(field)
}

/// Decimal without leading zeros, at most `max_digits` long.
pub(crate) fn decimal_field(field: &str, max_digits: usize) -> Option<&str> {
    let first = field.bytes().next()?;
    let well_formed = field.len() <= max_digits
        && field.bytes().all(|b| b.is_ascii_digit())
        && (first != b'0' || field.len() == 1);
    well_formed.then_some(field)
}

/// Unpadded base64url characters, at most `max_chars` long (`None` for unbounded).
pub(crate) fn base64url_field(field: &str, max_chars: Option<usize>) -> Option<&str> {
    let well_formed = max_chars.map_or(true, |max| field.len() <= max)
        && field
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    well_formed.then_some(field)
}
