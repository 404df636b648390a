//! Parsing of numbers typed into settings editors.
//!
//! A float that fails to parse becomes `0.0` and is left for validation to
//! judge. An integer that fails to parse is reported as absent and the
//! caller keeps the previous value; a zeroed grid spacing could never pass
//! validation.

/// Parse a float, falling back to `0.0`. Surrounding whitespace is ignored.
pub fn parse_float_or_zero(text: &str) -> f64 {
    match text.trim().parse::<f64>() {
        Ok(v) => v,
        Err(_) => {
            log::debug!("unparsable number '{}' read as 0", text);
            0.0
        }
    }
}

/// Parse an integer, or `None` if the text is not one.
pub fn parse_int(text: &str) -> Option<i32> {
    let parsed = text.trim().parse::<i32>().ok();
    if parsed.is_none() {
        log::debug!("unparsable integer '{}' ignored", text);
    }
    parsed
}
