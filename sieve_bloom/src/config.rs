//! Declarative filter configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::filter::{BloomFilter, EstimateSource};
use crate::hash::{Hash64, HashKind};
use crate::sizing::{self, FilterPlan};

/// Parameters for building a [`BloomFilter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BloomConfig {
    /// Number of elements the filter is sized for.
    pub expected_elements: u64,
    /// Acceptable false positive probability, strictly between 0 and 1.
    pub false_positive_probability: f64,
    /// Hash primitive.
    #[serde(default)]
    pub hash: HashKind,
    /// Seed handed to the hash primitive.
    #[serde(default)]
    pub seed: u64,
    /// Source of the set-bit count used for cardinality estimates.
    #[serde(default)]
    pub estimator: EstimateSource,
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self {
            expected_elements: 10_000,
            false_positive_probability: 0.01,
            hash: HashKind::default(),
            seed: 0,
            estimator: EstimateSource::default(),
        }
    }
}

impl BloomConfig {
    /// Reject out-of-range sizing inputs.
    pub fn validate(&self) -> Result<()> {
        sizing::validate(self.expected_elements, self.false_positive_probability)
    }

    /// Size and hash count this configuration produces.
    pub fn plan(&self) -> Result<FilterPlan> {
        sizing::plan(self.expected_elements, self.false_positive_probability)
    }

    /// Build a filter with the configured hash primitive.
    pub fn build(&self) -> Result<BloomFilter<Box<dyn Hash64>>> {
        self.build_with(self.hash.build(self.seed))
    }

    /// Build a filter with a caller-supplied hash primitive; `hash` and
    /// `seed` are ignored.
    pub fn build_with<H: Hash64>(&self, hasher: H) -> Result<BloomFilter<H>> {
        self.validate()?;
        Ok(BloomFilter::new(self.expected_elements, self.false_positive_probability, hasher)?
            .with_estimate_source(self.estimator))
    }
}
