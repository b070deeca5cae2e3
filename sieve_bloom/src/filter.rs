//! Bloom filter over a packed bit array with seeded multi-hashing.
//!
//! Each element maps to `k` positions. Position `i` is the digest of the
//! decimal text of `i` followed by the element bytes, reduced modulo the
//! array length, so a single hash primitive stands in for `k` independent
//! ones.

use std::fmt;
use std::io::Write;

use bitvec::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::{BloomError, Result};
use crate::hash::{Hash64, Murmur3Hash64};
use crate::sizing;

/// Which count of set bits feeds the cardinality estimate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateSource {
    /// Popcount of the bit array (distinct set bits). O(m).
    #[default]
    Scan,
    /// Running total of bit-set operations. O(1), overestimates once
    /// insertions start landing on bits that are already set.
    SetOperations,
}

/// Probabilistic set-membership filter.
///
/// Queries need `&mut self` because position derivation drives the hasher's
/// internal state; share a filter across threads behind a lock.
pub struct BloomFilter<H = Murmur3Hash64> {
    bits: BitVec<u64, Lsb0>,
    num_hashes: u8,
    expected_elements: u64,
    fpp: f64,
    estimate_source: EstimateSource,
    set_operations: u64,
    hasher: H,
}

impl BloomFilter<Murmur3Hash64> {
    /// Filter using Murmur3 with seed 0.
    pub fn with_defaults(expected_elements: u64, fpp: f64) -> Result<Self> {
        Self::new(expected_elements, fpp, Murmur3Hash64::default())
    }
}

impl<H: Hash64> BloomFilter<H> {
    /// Size a filter for `expected_elements` at false positive rate `fpp`.
    pub fn new(expected_elements: u64, fpp: f64, hasher: H) -> Result<Self> {
        let plan = sizing::plan(expected_elements, fpp)?;
        let len = usize::try_from(plan.num_bits).map_err(|_| {
            BloomError::invalid("expected_elements", "bit array does not fit in memory")
        })?;
        debug!(
            expected_elements,
            fpp,
            num_bits = plan.num_bits,
            num_hashes = plan.num_hashes,
            "bloom filter allocated"
        );
        Ok(Self {
            bits: BitVec::repeat(false, len),
            num_hashes: plan.num_hashes,
            expected_elements,
            fpp,
            estimate_source: EstimateSource::default(),
            set_operations: 0,
            hasher,
        })
    }

    /// Select the count used by [`Self::elements_estimate`].
    pub fn with_estimate_source(mut self, source: EstimateSource) -> Self {
        self.estimate_source = source;
        self
    }

    /// Insert an element. All positions are derived before any bit is set,
    /// so a hash failure leaves the filter unchanged.
    pub fn add(&mut self, element: impl AsRef<[u8]>) -> Result<()> {
        let element = element.as_ref();
        let mut positions = Vec::with_capacity(usize::from(self.num_hashes));
        for seed in 0..self.num_hashes {
            positions.push(self.position(seed, element)?);
        }
        for idx in positions {
            self.bits.set(idx, true);
        }
        self.set_operations += u64::from(self.num_hashes);
        trace!(len = element.len(), "element added");
        Ok(())
    }

    /// Insert every element, stopping at the first hash failure.
    pub fn add_all<I>(&mut self, elements: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        for element in elements {
            self.add(element)?;
        }
        Ok(())
    }

    /// `true` when the element was definitely never added; `false` means it
    /// is possibly present.
    pub fn does_not_exist(&mut self, element: impl AsRef<[u8]>) -> Result<bool> {
        let element = element.as_ref();
        for seed in 0..self.num_hashes {
            let idx = self.position(seed, element)?;
            if !self.bits[idx] {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Negation of [`Self::does_not_exist`].
    pub fn might_contain(&mut self, element: impl AsRef<[u8]>) -> Result<bool> {
        self.does_not_exist(element).map(|absent| !absent)
    }

    fn position(&mut self, seed: u8, element: &[u8]) -> Result<usize> {
        self.hasher.reset();
        write!(self.hasher, "{seed}")?;
        self.hasher.write_all(element)?;
        let digest = self.hasher.sum64()?;
        Ok((digest % self.bits.len() as u64) as usize)
    }
}

impl<H> BloomFilter<H> {
    /// Approximate number of distinct elements inserted:
    /// `round(-(m/k) * ln(1 - X/m))`.
    ///
    /// Returns `u64::MAX` once `X` reaches `m`, where the estimate diverges.
    pub fn elements_estimate(&self) -> u64 {
        let set = match self.estimate_source {
            EstimateSource::Scan => self.set_bits(),
            EstimateSource::SetOperations => self.set_operations,
        };
        if set == 0 {
            return 0;
        }
        let m = self.size() as f64;
        if set as f64 >= m {
            warn!(set, num_bits = self.size(), source = ?self.estimate_source, "bloom filter saturated");
            return u64::MAX;
        }
        let k = f64::from(self.num_hashes);
        (-(m / k) * (1.0 - set as f64 / m).ln()).round() as u64
    }

    /// Number of bits in the array (`m`).
    pub fn size(&self) -> u64 {
        self.bits.len() as u64
    }

    /// Hash rounds per element (`k`).
    pub fn num_hashes(&self) -> u8 {
        self.num_hashes
    }

    /// Element count the filter was sized for.
    pub fn expected_elements(&self) -> u64 {
        self.expected_elements
    }

    /// Design target false positive probability.
    pub fn false_positive_probability(&self) -> f64 {
        self.fpp
    }

    /// Distinct bits currently set.
    pub fn set_bits(&self) -> u64 {
        self.bits.count_ones() as u64
    }

    /// Bit-set operations performed, including redundant ones.
    pub fn set_operations(&self) -> u64 {
        self.set_operations
    }

    /// Count feeding [`Self::elements_estimate`].
    pub fn estimate_source(&self) -> EstimateSource {
        self.estimate_source
    }

    /// Hash primitive in use.
    pub fn hasher(&self) -> &H {
        &self.hasher
    }
}

impl<H> fmt::Debug for BloomFilter<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BloomFilter")
            .field("size", &self.size())
            .field("num_hashes", &self.num_hashes)
            .field("expected_elements", &self.expected_elements)
            .field("fpp", &self.fpp)
            .field("set_bits", &self.set_bits())
            .field("set_operations", &self.set_operations)
            .field("estimate_source", &self.estimate_source)
            .finish_non_exhaustive()
    }
}
