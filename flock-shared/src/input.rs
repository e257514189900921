//! Turning free-form typed text into clamped parameter values.

/// Result of parsing typed text for a parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedInput {
    /// The value clamped into `[0, max]`
    pub value: f64,
    /// The filtered text, truncated for display
    pub text: String,
    /// The typed value was above the maximum and got clamped; callers should
    /// flag it to the user
    pub exceeds_max: bool,
}

/// Keeps digits and the first decimal point.
pub fn filter_decimal(raw: &str) -> String {
    let mut seen_point = false;
    raw.chars()
        .filter(|c| match *c {
            '0'..='9' => true,
            '.' if !seen_point => {
                seen_point = true;
                true
            }
            _ => false,
        })
        .collect()
}

pub fn filter_integer(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

pub fn parse_decimal(raw: &str, max: f64, width: usize) -> ParsedInput {
    let filtered = filter_decimal(raw);
    let number = filtered.strip_suffix('.').unwrap_or(&filtered);
    let parsed = if number.is_empty() {
        0.0
    } else {
        number.parse::<f64>().unwrap_or(0.0)
    };

    ParsedInput {
        value: parsed.clamp(0.0, max),
        text: truncate(&filtered, width),
        exceeds_max: parsed > max,
    }
}

pub fn parse_integer(raw: &str, max: u64, width: usize) -> ParsedInput {
    let filtered = filter_integer(raw);
    // Only digits are left, so a failed parse means overflow.
    let parsed = if filtered.is_empty() {
        0
    } else {
        filtered.parse::<u64>().unwrap_or(u64::MAX)
    };

    ParsedInput {
        value: parsed.min(max) as f64,
        text: truncate(&filtered, width),
        exceeds_max: parsed > max,
    }
}

fn truncate(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}
