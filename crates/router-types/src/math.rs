//! Exact integer arithmetic on token amounts.
//!
//! Amounts are `U256` base units. Products are formed in `U512` so a
//! multiply-then-divide never loses precision, and rounding happens once at
//! the end. `Decimal` only appears as a factor (rates, slippage fractions)
//! or as a bounded-precision ratio for diagnostics and tolerance checks.

use alloy_primitives::{U256, U512};
use rust_decimal::Decimal;

/// Direction in which an inexact quotient is rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
	Down,
	Up,
}

/// Largest mantissa a `Decimal` can hold (2^96 - 1).
const DECIMAL_MAX_MANTISSA: u128 = (1u128 << 96) - 1;

/// Largest scale a `Decimal` supports.
const DECIMAL_MAX_SCALE: u32 = 28;

pub(crate) fn widen(value: U256) -> U512 {
	U512::from(value)
}

fn pow10(exp: u32) -> U256 {
	U256::from(10u64).pow(U256::from(exp))
}

/// `a * b / c`, rounded once.
///
/// Returns `None` when `c` is zero or the quotient does not fit in 256 bits.
pub fn mul_div(a: U256, b: U256, c: U256, rounding: Rounding) -> Option<U256> {
	if c.is_zero() {
		return None;
	}
	let product = widen(a) * widen(b);
	let divisor = widen(c);
	let mut quotient = product / divisor;
	if rounding == Rounding::Up && !(product % divisor).is_zero() {
		quotient += U512::from(1u64);
	}

	let narrow = U256::saturating_from(quotient);
	(widen(narrow) == quotient).then_some(narrow)
}

/// `amount * factor` for a non-negative decimal factor, rounded once.
pub fn mul_decimal(amount: U256, factor: Decimal, rounding: Rounding) -> Option<U256> {
	let (numerator, denominator) = decimal_parts(factor)?;
	mul_div(amount, numerator, denominator, rounding)
}

/// `amount / divisor` for a positive decimal divisor, rounded once.
pub fn div_decimal(amount: U256, divisor: Decimal, rounding: Rounding) -> Option<U256> {
	let (numerator, denominator) = decimal_parts(divisor)?;
	mul_div(amount, denominator, numerator, rounding)
}

fn decimal_parts(value: Decimal) -> Option<(U256, U256)> {
	if value.is_sign_negative() {
		return None;
	}
	let mantissa = u128::try_from(value.mantissa()).ok()?;
	Some((U256::from(mantissa), pow10(value.scale())))
}

/// `numerator / denominator` as a `Decimal`, keeping as many fractional
/// digits as fit.
///
/// Returns `None` for a zero denominator or a quotient beyond `Decimal`'s
/// range. The result is for comparisons and reporting, never for amounts.
pub fn ratio(numerator: U256, denominator: U256) -> Option<Decimal> {
	if denominator.is_zero() {
		return None;
	}
	let numerator = widen(numerator);
	let denominator = widen(denominator);
	let limit = U512::from(DECIMAL_MAX_MANTISSA);

	for scale in (0..=DECIMAL_MAX_SCALE).rev() {
		let quotient = numerator * widen(pow10(scale)) / denominator;
		if quotient <= limit {
			let mantissa = u128::try_from(&quotient).ok()?;
			return Decimal::try_from_i128_with_scale(mantissa as i128, scale).ok();
		}
	}
	None
}

/// Sum of amounts, saturating at `U256::MAX`.
pub fn saturating_sum(amounts: impl IntoIterator<Item = U256>) -> U256 {
	amounts
		.into_iter()
		.fold(U256::ZERO, |total, amount| total.saturating_add(amount))
}
