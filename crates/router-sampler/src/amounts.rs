//! Discretization of a target amount into sample points.

use alloy_primitives::U256;
use router_types::math::{mul_decimal, Rounding};
use rust_decimal::Decimal;

/// Splits `max_fill_amount` into at most `num_samples` ascending cumulative
/// amounts.
///
/// Step `i` is proportional to `exp_base^i`, so a base above one spaces
/// samples more densely at the small end. Weights are normalized to the
/// largest step, which keeps them within `(0, 1]` for any sample count.
/// Intermediate amounts are rounded up to whole units; points that collapse
/// onto zero or onto their predecessor are dropped. The final amount is
/// always exactly `max_fill_amount`.
pub fn get_sample_amounts(
	max_fill_amount: U256,
	num_samples: usize,
	exp_base: Decimal,
) -> Vec<U256> {
	if num_samples == 0 || max_fill_amount.is_zero() || exp_base <= Decimal::ZERO {
		return Vec::new();
	}

	let mut distribution = vec![Decimal::ONE; num_samples];
	if exp_base >= Decimal::ONE {
		for i in (0..num_samples - 1).rev() {
			distribution[i] = distribution[i + 1] / exp_base;
		}
	} else {
		for i in 1..num_samples {
			distribution[i] = distribution[i - 1] * exp_base;
		}
	}
	let total: Decimal = distribution.iter().copied().sum();

	let mut amounts: Vec<U256> = Vec::with_capacity(num_samples);
	let mut cumulative = Decimal::ZERO;
	for step in &distribution[..num_samples - 1] {
		cumulative += step / total;
		let amount = mul_decimal(max_fill_amount, cumulative.min(Decimal::ONE), Rounding::Up)
			.unwrap_or(max_fill_amount)
			.min(max_fill_amount);
		if !amount.is_zero() && amounts.last().map_or(true, |last| amount > *last) {
			amounts.push(amount);
		}
	}
	if amounts.last() != Some(&max_fill_amount) {
		amounts.push(max_fill_amount);
	}
	amounts
}
