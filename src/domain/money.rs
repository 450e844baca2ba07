use thiserror::Error;

/// Amounts are integer minor units (cents). 12,345.67 is stored as 1234567.
pub type Cents = i64;

/// Largest amount a single document may carry: 10,000,000,000.00.
///
/// Keeps every statement total far inside `i64` range.
pub const MAX_AMOUNT: Cents = 1_000_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseAmountError {
    #[error("amount is empty")]
    Empty,
    #[error("invalid amount '{0}'")]
    InvalidFormat(String),
    #[error("amount '{0}' has more than two decimal places")]
    TooPrecise(String),
    #[error("amount '{0}' is out of range")]
    Overflow(String),
}

/// Format cents with a grouped integer part: 1234567 -> "12,345.67".
pub fn format_amount(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let units = (abs / 100).to_string();

    let mut grouped = String::with_capacity(units.len() + units.len() / 3);
    for (i, ch) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}{}.{:02}", sign, grouped, abs % 100)
}

/// Format cents without grouping, for machine-readable output: 1234567 -> "12345.67".
pub fn format_plain(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Parse a decimal amount into cents.
///
/// Accepts an optional leading `-`, thousands separators (`,`) in the integer
/// part, and at most two decimal places. Extra precision is rejected rather
/// than rounded, so a typed amount is never silently changed.
pub fn parse_amount(input: &str) -> Result<Cents, ParseAmountError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ParseAmountError::Empty);
    }

    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    let (int_part, frac_part) = match body.split_once('.') {
        Some((i, f)) => (i, f),
        None => (body, ""),
    };

    let invalid = || ParseAmountError::InvalidFormat(input.to_string());

    if !has_valid_grouping(int_part) {
        return Err(invalid());
    }
    let int_digits: String = int_part.chars().filter(|c| *c != ',').collect();
    if int_digits.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    if !int_digits.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }
    if frac_part.len() > 2 {
        return Err(ParseAmountError::TooPrecise(input.to_string()));
    }

    let overflow = || ParseAmountError::Overflow(input.to_string());

    let units: i64 = if int_digits.is_empty() {
        0
    } else {
        int_digits.parse().map_err(|_| overflow())?
    };
    let fraction: i64 = match frac_part.len() {
        0 => 0,
        1 => frac_part.parse::<i64>().map_err(|_| invalid())? * 10,
        _ => frac_part.parse().map_err(|_| invalid())?,
    };

    let cents = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(fraction))
        .filter(|c| *c <= MAX_AMOUNT)
        .ok_or_else(overflow)?;

    Ok(if negative { -cents } else { cents })
}

/// Commas are optional, but when present every group after the first must
/// be exactly three digits and the first group one to three.
fn has_valid_grouping(int_part: &str) -> bool {
    if !int_part.contains(',') {
        return true;
    }
    let mut groups = int_part.split(',');
    let first_ok = groups
        .next()
        .is_some_and(|g| (1..=3).contains(&g.len()));
    first_ok && groups.all(|g| g.len() == 3)
}
