//! Integer view of Kubernetes resource quantities.
//!
//! A quantity is `<sign><digits>[.<digits>]<suffix>` where the suffix is a
//! binary SI prefix (`Ki`..`Ei`), a decimal SI prefix (`n`..`E`) or a decimal
//! exponent (`e3`, `E-2`).
//!
//! The API server keeps quantities as an unreduced fixed-point amount: digits
//! plus a base-10 scale. Only amounts with a non-negative scale have an
//! integer view, so `"2"`, `"1k"` and `"1.5k"` do while `"2000m"`, `"1.0"`
//! and `"0.5Ki"` do not, even though their value is a whole number.

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

/// Amounts with more significant digits than this are not stored as int64.
const MAX_INT64_DIGITS: usize = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Multiplier {
    /// value * 10^n
    Decimal(i32),
    /// value * 2^n
    Binary(u32),
}

/// Returns the value of `quantity` if it is integer-convertible.
pub fn as_int64(quantity: &Quantity) -> Option<i64> {
    parse_int64(&quantity.0)
}

pub(crate) fn parse_int64(input: &str) -> Option<i64> {
    let (negative, rest) = match input.as_bytes().first()? {
        b'-' => (true, &input[1..]),
        b'+' => (false, &input[1..]),
        _ => (false, input),
    };

    let number_end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());
    let (number, suffix) = rest.split_at(number_end);

    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if fraction.contains('.') {
        return None;
    }
    // leading zeros are not significant, an empty integer part reads as 0
    let whole = match whole.trim_start_matches('0') {
        "" => "0",
        w => w,
    };
    let digits = whole.len() + fraction.len();

    let (mantissa, scale) = match multiplier(suffix)? {
        Multiplier::Decimal(exponent) => {
            if digits > MAX_INT64_DIGITS {
                return None;
            }
            (1i64, i64::from(exponent) - fraction.len() as i64)
        }
        Multiplier::Binary(exponent) => {
            let exponent_digits = (exponent as usize) * 3 / 10;
            if !fraction.is_empty() || whole.len() + exponent_digits + 1 > 15 {
                return None;
            }
            (1i64.checked_shl(exponent)?, 0)
        }
    };
    if scale < 0 {
        return None;
    }

    let mut value: i64 = 0;
    for digit in whole.chars().chain(fraction.chars()) {
        value = value
            .checked_mul(10)?
            .checked_add(i64::from(digit.to_digit(10)?))?;
    }
    value = value.checked_mul(mantissa)?;
    if negative {
        value = -value;
    }
    if value == 0 {
        return Some(0);
    }

    for _ in 0..scale {
        value = value.checked_mul(10)?;
    }
    Some(value)
}

fn multiplier(suffix: &str) -> Option<Multiplier> {
    let m = match suffix {
        "" => Multiplier::Decimal(0),
        "n" => Multiplier::Decimal(-9),
        "u" => Multiplier::Decimal(-6),
        "m" => Multiplier::Decimal(-3),
        "k" => Multiplier::Decimal(3),
        "M" => Multiplier::Decimal(6),
        "G" => Multiplier::Decimal(9),
        "T" => Multiplier::Decimal(12),
        "P" => Multiplier::Decimal(15),
        "E" => Multiplier::Decimal(18),
        "Ki" => Multiplier::Binary(10),
        "Mi" => Multiplier::Binary(20),
        "Gi" => Multiplier::Binary(30),
        "Ti" => Multiplier::Binary(40),
        "Pi" => Multiplier::Binary(50),
        "Ei" => Multiplier::Binary(60),
        _ => {
            let exponent = suffix
                .strip_prefix('e')
                .or_else(|| suffix.strip_prefix('E'))?;
            Multiplier::Decimal(exponent.parse().ok()?)
        }
    };
    Some(m)
}
