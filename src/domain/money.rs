use thiserror::Error;

/// Money is held as integer cents so balances never drift.
/// $150.00 is stored as 15000.
pub type Cents = i64;

/// Format cents as a plain decimal string.
/// Example: 15000 -> "150.00", 5 -> "0.05"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs_cents / 100, abs_cents % 100)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseAmountError {
    #[error("amount is empty")]
    Empty,

    #[error("invalid amount format: {0}")]
    InvalidFormat(String),

    #[error("amount has more than two decimal places: {0}")]
    TooPrecise(String),

    #[error("amount is too large: {0}")]
    Overflow(String),
}

/// Parse a user-entered amount into cents.
/// Accepts "50", "50.5", "50.25", ".75" and an optional leading '$'.
/// Signs are rejected: direction is expressed by the operation, not the amount.
pub fn parse_cents(input: &str) -> Result<Cents, ParseAmountError> {
    let trimmed = input.trim();
    let digits = trimmed.strip_prefix('$').unwrap_or(trimmed);
    if digits.is_empty() {
        return Err(ParseAmountError::Empty);
    }

    let invalid = || ParseAmountError::InvalidFormat(input.to_string());
    let overflow = || ParseAmountError::Overflow(input.to_string());

    let (units_str, decimal_str) = match digits.split_once('.') {
        Some((units, decimals)) => (units, decimals),
        None => (digits, ""),
    };

    if units_str.is_empty() && decimal_str.is_empty() {
        return Err(invalid());
    }
    if !units_str.chars().all(|c| c.is_ascii_digit())
        || !decimal_str.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }
    if decimal_str.len() > 2 {
        return Err(ParseAmountError::TooPrecise(input.to_string()));
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str.parse().map_err(|_| overflow())?
    };

    // "5" after the point means 50 cents
    let decimal_cents: i64 = match decimal_str.len() {
        0 => 0,
        1 => decimal_str.parse::<i64>().map_err(|_| invalid())? * 10,
        _ => decimal_str.parse().map_err(|_| invalid())?,
    };

    units
        .checked_mul(100)
        .and_then(|cents| cents.checked_add(decimal_cents))
        .ok_or_else(overflow)
}
