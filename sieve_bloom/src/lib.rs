//! Bloom filter with capacity planning, seeded multi-hashing over a single
//! hash primitive, and cardinality estimation.
//!
//! ```
//! use sieve_bloom::BloomFilter;
//!
//! let mut bf = BloomFilter::with_defaults(10_000, 0.10)?;
//! bf.add("A")?;
//! bf.add("B")?;
//! assert!(bf.does_not_exist("C")?);
//! assert!(!bf.does_not_exist("A")?);
//! # Ok::<(), sieve_bloom::BloomError>(())
//! ```
#![deny(missing_docs)]

mod config;
mod error;
mod filter;
pub mod hash;
pub mod sizing;

pub use config::BloomConfig;
pub use error::{BloomError, Result};
pub use filter::{BloomFilter, EstimateSource};
pub use hash::{Fnv64Hash, Hash64, HashKind, Murmur3Hash64, Xxh64Hash};
pub use sizing::FilterPlan;
