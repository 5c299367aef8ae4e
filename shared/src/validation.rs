//! Input presence checks
//!
//! The API only checks that required fields were supplied; it does not
//! judge their format.

/// Return the trimmed value of a required field, or an error naming it
pub fn require<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str, String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(format!("{} is required", field)),
    }
}

/// Like [`require`], but keeps surrounding whitespace
///
/// Passwords and tokens are compared byte-for-byte, so they are never trimmed.
pub fn require_exact<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str, String> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(format!("{} is required", field)),
    }
}
