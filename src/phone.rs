use std::fmt;

use thiserror::Error;

/// Digits in a canonical phone: 2 for the area code, 9 for the subscriber.
pub const PHONE_DIGITS: usize = 11;

const AREA_CODE: usize = 2;
const FIRST_GROUP: usize = 5;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("O número deve ter 11 dígitos e começar com 9 após o DDD.")]
pub struct InvalidPhone {
    pub digits: String,
}

/// Canonical, digit-only phone number. Only built through [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Phone(String);

impl Phone {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn masked(&self) -> String {
        format(&self.0)
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Masks free text as `(DD)DDDDD-DDDD`, progressively for partial input.
pub fn format(raw: &str) -> String {
    let digits: String = digits(raw).chars().take(PHONE_DIGITS).collect();

    // Every char left is an ASCII digit, so byte offsets are char offsets.
    let split = |from: usize, len: usize| {
        let start = from.min(digits.len());
        let end = (from + len).min(digits.len());
        &digits[start..end]
    };
    let area = split(0, AREA_CODE);
    let first = split(AREA_CODE, FIRST_GROUP);
    let second = split(AREA_CODE + FIRST_GROUP, PHONE_DIGITS);

    let mut formatted = String::with_capacity(PHONE_DIGITS + 3);
    if !area.is_empty() {
        formatted.push('(');
        formatted.push_str(area);
    }
    if area.len() == AREA_CODE {
        formatted.push(')');
    }
    formatted.push_str(first);
    if !second.is_empty() {
        formatted.push('-');
        formatted.push_str(second);
    }

    formatted
}

pub fn validate(raw: &str) -> Result<Phone, InvalidPhone> {
    let digits = digits(raw);

    if digits.len() != PHONE_DIGITS || digits.as_bytes()[AREA_CODE] != b'9' {
        return Err(InvalidPhone { digits });
    }

    Ok(Phone(digits))
}
