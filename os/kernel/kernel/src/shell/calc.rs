//! `calc <a><op><b>`: one signed 64-bit operation.

use core::num::IntErrorKind;

#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum CalcError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("malformed expression")]
    Malformed,
    #[error("overflow")]
    Overflow,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
}

impl Operator {
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'+' => Some(Self::Add),
            b'-' => Some(Self::Subtract),
            b'*' => Some(Self::Multiply),
            b'/' => Some(Self::Divide),
            b'%' => Some(Self::Remainder),
            _ => None,
        }
    }

    /// Checked arithmetic; `/` and `%` truncate toward zero.
    ///
    /// # Errors
    /// [`CalcError::DivisionByZero`] for a zero divisor,
    /// [`CalcError::Overflow`] when the result does not fit an `i64`.
    pub const fn apply(self, lhs: i64, rhs: i64) -> Result<i64, CalcError> {
        let result = match self {
            Self::Add => lhs.checked_add(rhs),
            Self::Subtract => lhs.checked_sub(rhs),
            Self::Multiply => lhs.checked_mul(rhs),
            Self::Divide | Self::Remainder if rhs == 0 => {
                return Err(CalcError::DivisionByZero);
            }
            Self::Divide => lhs.checked_div(rhs),
            Self::Remainder => lhs.checked_rem(rhs),
        };
        match result {
            Some(value) => Ok(value),
            None => Err(CalcError::Overflow),
        }
    }
}

/// Evaluate `<a><op><b>`, whitespace allowed around the operator.
///
/// Operands may carry a sign, so `5--3` is `5 - (-3)`.
///
/// ```
/// use kernel::shell::{CalcError, evaluate};
///
/// assert_eq!(evaluate("6*7"), Ok(42));
/// assert_eq!(evaluate(" -8 / 2 "), Ok(-4));
/// assert_eq!(evaluate("1/0"), Err(CalcError::DivisionByZero));
/// ```
///
/// # Errors
/// [`CalcError::Malformed`] for anything that is not exactly one operation.
pub fn evaluate(expression: &str) -> Result<i64, CalcError> {
    let (lhs, rest) = leading_operand(expression.trim())?;
    let rest = rest.trim_start();
    let operator = rest
        .bytes()
        .next()
        .and_then(Operator::from_byte)
        .ok_or(CalcError::Malformed)?;
    let rhs = operand(rest[1..].trim())?;
    operator.apply(lhs, rhs)
}

/// Split an optionally signed integer off the front of `text`.
fn leading_operand(text: &str) -> Result<(i64, &str), CalcError> {
    let sign = usize::from(text.starts_with(['+', '-']));
    let digits = text[sign..].bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return Err(CalcError::Malformed);
    }
    let (number, rest) = text.split_at(sign + digits);
    Ok((operand(number)?, rest))
}

fn operand(text: &str) -> Result<i64, CalcError> {
    text.parse::<i64>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => CalcError::Overflow,
        _ => CalcError::Malformed,
    })
}
