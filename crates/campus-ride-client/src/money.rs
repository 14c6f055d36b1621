//! Vietnamese đồng amounts, formatting, and wallet bounds.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Smallest top-up accepted by the payment gateway.
pub const MIN_TOP_UP: Vnd = Vnd(10_000);

/// Largest single top-up.
pub const MAX_TOP_UP: Vnd = Vnd(50_000_000);

/// Smallest withdrawal.
pub const MIN_WITHDRAWAL: Vnd = Vnd(50_000);

/// An amount in VND. The currency has no minor unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Vnd(pub u64);

impl Vnd {
    pub const ZERO: Vnd = Vnd(0);

    pub fn amount(self) -> u64 {
        self.0
    }
}

impl From<u64> for Vnd {
    fn from(amount: u64) -> Self {
        Vnd(amount)
    }
}

/// `150.000 ₫`
impl fmt::Display for Vnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }
        write!(f, "{} ₫", grouped)
    }
}

// The API is inconsistent about amounts: integers, floats, decimal strings
// and formatted display strings all occur.
impl<'de> Deserialize<'de> for Vnd {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(u64),
            Float(f64),
            Text(String),
        }

        let amount = match Raw::deserialize(deserializer)? {
            Raw::Int(n) => n,
            Raw::Float(f) if f.is_finite() && f >= 0.0 => f.round() as u64,
            Raw::Float(f) => {
                return Err(serde::de::Error::custom(format!("invalid amount {}", f)));
            }
            Raw::Text(s) => parse_amount(&s)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid amount '{}'", s)))?,
        };
        Ok(Vnd(amount))
    }
}

/// Parse a textual amount.
///
/// Plain numbers (`"25000"`, `"25000.00"`) are read as decimals and rounded
/// half up. Only the display form with a trailing `₫` (`"150.000 ₫"`) uses
/// `.` as a thousands separator.
fn parse_amount(text: &str) -> Option<u64> {
    let text = text.trim();
    if let Some(display) = text.strip_suffix('₫') {
        return parse_grouped(display.trim_end());
    }

    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (text, None),
    };
    if !is_digits(whole) {
        return None;
    }
    let amount: u64 = whole.parse().ok()?;
    match fraction {
        None => Some(amount),
        Some(fraction) if !is_digits(fraction) => None,
        Some(fraction) if fraction.as_bytes()[0] >= b'5' => amount.checked_add(1),
        Some(_) => Some(amount),
    }
}

/// `150.000` style grouping: a leading group of one to three digits, then
/// groups of exactly three.
fn parse_grouped(text: &str) -> Option<u64> {
    let mut groups = text.split('.');
    let first = groups.next()?;
    if !is_digits(first) || first.len() > 3 {
        return None;
    }
    let mut digits = first.to_string();
    for group in groups {
        if group.len() != 3 || !is_digits(group) {
            return None;
        }
        digits.push_str(group);
    }
    digits.parse().ok()
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Check a top-up amount against the gateway bounds.
pub fn validate_top_up(amount: Vnd) -> Result<()> {
    if amount < MIN_TOP_UP {
        return Err(Error::Validation(format!(
            "Top-up amount must be at least {}",
            MIN_TOP_UP
        )));
    }
    if amount > MAX_TOP_UP {
        return Err(Error::Validation(format!(
            "Top-up amount must not exceed {}",
            MAX_TOP_UP
        )));
    }
    Ok(())
}

/// Check a withdrawal amount, optionally against a known balance.
pub fn validate_withdrawal(amount: Vnd, balance: Option<Vnd>) -> Result<()> {
    if amount < MIN_WITHDRAWAL {
        return Err(Error::Validation(format!(
            "Withdrawal amount must be at least {}",
            MIN_WITHDRAWAL
        )));
    }
    if let Some(balance) = balance
        && amount > balance
    {
        return Err(Error::Validation(format!(
            "Withdrawal amount {} exceeds wallet balance {}",
            amount, balance
        )));
    }
    Ok(())
}
