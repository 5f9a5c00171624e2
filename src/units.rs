//! Parsing of the human-readable values bcache prints into sysfs.
//!
//! The kernel pretty-prints byte sizes with a single binary suffix
//! (`512k`, `1.5G`, `3.2M`) and prints event counters as plain integers.
//! Both parsers treat an empty string as zero: the sysfs reader returns an
//! empty string for files that are absent, and an absent statistic means
//! "nothing recorded yet". Anything else that does not parse is an error.

use thiserror::Error;

/// Binary size suffixes used by the kernel's `bch_hprint`.
const SIZE_SUFFIXES: [(char, u32); 8] = [
    ('k', 10),
    ('M', 20),
    ('G', 30),
    ('T', 40),
    ('P', 50),
    ('E', 60),
    ('Z', 70),
    ('Y', 80),
];

/// Failure to interpret sysfs text as a number.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("malformed numeric value '{0}'")]
    Malformed(String),

    #[error("value '{0}' does not fit in an unsigned 64-bit integer")]
    OutOfRange(String),
}

/// Converts a pretty-printed size such as `512k` or `1.5G` into bytes.
///
/// The result is the truncated product of the magnitude and the binary
/// multiplier of the suffix. A string without a known suffix is taken as a
/// plain byte count.
///
/// ```
/// use bcache_exporter::units::parse_size_token;
///
/// assert_eq!(parse_size_token("512k").unwrap(), 524_288);
/// assert_eq!(parse_size_token("").unwrap(), 0);
/// assert!(parse_size_token("abc").is_err());
/// ```
pub fn parse_size_token(text: &str) -> Result<u64, ParseError> {
    if text.is_empty() {
        return Ok(0);
    }

    let (magnitude, shift) = match text.chars().last().and_then(suffix_shift) {
        Some(shift) => (&text[..text.len() - 1], shift),
        None => (text, 0),
    };

    let magnitude: f64 = magnitude
        .parse()
        .map_err(|_| ParseError::Malformed(text.to_string()))?;

    let bytes = (magnitude * 2f64.powi(shift as i32)).trunc();

    // u64::MAX as f64 rounds up to 2^64, so the bound is exclusive
    if !bytes.is_finite() || bytes < 0.0 || bytes >= u64::MAX as f64 {
        return Err(ParseError::OutOfRange(text.to_string()));
    }

    Ok(bytes as u64)
}

/// Parses a plain integer event counter such as `cache_hits`.
pub fn parse_counter(text: &str) -> Result<u64, ParseError> {
    if text.is_empty() {
        return Ok(0);
    }

    text.parse()
        .map_err(|_| ParseError::Malformed(text.to_string()))
}

fn suffix_shift(c: char) -> Option<u32> {
    SIZE_SUFFIXES
        .iter()
        .find(|(suffix, _)| *suffix == c)
        .map(|(_, shift)| *shift)
}
