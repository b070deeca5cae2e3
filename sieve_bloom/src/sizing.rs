//! Capacity planning: derive bit-array size and hash count from the
//! expected element count and the acceptable false positive probability.

use std::f64::consts::LN_2;

use serde::Serialize;
use tracing::warn;

use crate::error::{BloomError, Result};

/// Largest bit count a single filter may allocate.
pub const MAX_NUM_BITS: u64 = (usize::MAX >> 3) as u64;

/// Structural parameters computed for a filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FilterPlan {
    /// Number of bits in the array (`m`).
    pub num_bits: u64,
    /// Number of seeded hash rounds per element (`k`).
    pub num_hashes: u8,
    /// Theoretical false positive rate of the rounded `m`/`k` at full load.
    pub expected_fpp: f64,
}

impl FilterPlan {
    /// Bytes occupied by the packed bit array.
    pub fn num_bytes(&self) -> u64 {
        self.num_bits.div_ceil(8)
    }
}

/// Check `expected_elements` and `fpp` before any arithmetic.
pub fn validate(expected_elements: u64, fpp: f64) -> Result<()> {
    if expected_elements == 0 {
        return Err(BloomError::invalid("expected_elements", "must be greater than 0"));
    }
    if !fpp.is_finite() || fpp <= 0.0 || fpp >= 1.0 {
        return Err(BloomError::invalid(
            "false_positive_probability",
            format!("must lie strictly between 0 and 1, got {fpp}"),
        ));
    }
    Ok(())
}

/// `m = round(-n * ln(p) / ln(2)^2)`.
pub fn optimal_num_bits(expected_elements: u64, fpp: f64) -> Result<u64> {
    validate(expected_elements, fpp)?;
    let bits = (-(expected_elements as f64) * fpp.ln() / LN_2.powi(2)).round();
    if bits < 1.0 {
        return Err(BloomError::invalid(
            "false_positive_probability",
            format!("{fpp} with {expected_elements} elements yields an empty bit array"),
        ));
    }
    if bits > MAX_NUM_BITS as f64 {
        return Err(BloomError::invalid(
            "expected_elements",
            format!("bit array of {bits} bits exceeds the limit of {MAX_NUM_BITS}"),
        ));
    }
    Ok(bits as u64)
}

/// `k = floor((m / n) * ln(2))`, clamped into `1..=255`.
pub fn optimal_num_hashes(num_bits: u64, expected_elements: u64) -> u8 {
    let k = (num_bits as f64 / expected_elements as f64 * LN_2).floor();
    if k < 1.0 {
        warn!(num_bits, expected_elements, "optimal hash count truncates to zero; using 1");
        return 1;
    }
    // Saturating cast: anything above 255 rounds down to u8::MAX.
    k as u8
}

/// False positive rate for `k` hashes over `m` bits holding `n` elements.
pub fn false_positive_rate(num_bits: u64, num_hashes: u8, elements: u64) -> f64 {
    let k = f64::from(num_hashes);
    let exponent = -k * elements as f64 / num_bits as f64;
    (1.0 - exponent.exp()).powf(k)
}

/// Compute the complete plan for a filter.
pub fn plan(expected_elements: u64, fpp: f64) -> Result<FilterPlan> {
    let num_bits = optimal_num_bits(expected_elements, fpp)?;
    let num_hashes = optimal_num_hashes(num_bits, expected_elements);
    Ok(FilterPlan {
        num_bits,
        num_hashes,
        expected_fpp: false_positive_rate(num_bits, num_hashes, expected_elements),
    })
}
