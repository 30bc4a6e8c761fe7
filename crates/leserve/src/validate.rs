//! Request text sanitation and parameter validation

use crate::error::{ApiError, ApiResult};

/// Shortest accepted query or title, after sanitation
pub const MIN_INPUT_LEN: usize = 2;

/// Keep printable ASCII only and trim surrounding whitespace
pub fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| matches!(c, ' '..='~'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Sanitize `text` and check its length
pub fn validate_text(text: &str, max_len: usize) -> ApiResult<String> {
    if text.is_empty() {
        return Err(ApiError::invalid_input("Invalid input"));
    }

    let sanitized = sanitize(text);
    if sanitized.len() > max_len {
        return Err(ApiError::invalid_input(format!(
            "Input too long: max {} characters",
            max_len
        )));
    }
    if sanitized.len() < MIN_INPUT_LEN {
        return Err(ApiError::invalid_input(format!(
            "Input too short: min {} characters",
            MIN_INPUT_LEN
        )));
    }
    Ok(sanitized)
}

/// A query parameter that must be present and non-blank
pub fn required<'a>(value: Option<&'a str>, name: &str) -> ApiResult<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::invalid_input(format!("{} parameter required", name))),
    }
}

/// Parse an optional `limit` and clamp it to `[1, max]`
///
/// A missing limit means `max`.
pub fn clamp_limit(raw: Option<&str>, max: usize) -> ApiResult<usize> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(max);
    };
    let value: i64 = raw
        .parse()
        .map_err(|_| ApiError::invalid_input("limit must be an integer"))?;
    Ok(usize::try_from(value).unwrap_or(0).clamp(1, max.max(1)))
}
