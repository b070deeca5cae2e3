//! Resettable 64-bit hash primitives used to derive bit positions.
//!
//! A [`Hash64`] is a stateful sink: callers `reset` it, feed bytes through
//! [`std::io::Write`], then read the digest with `sum64`. Both the write and
//! digest steps are fallible so that hashers backed by external sinks can
//! report failure instead of producing a bogus position.

use std::fmt;
use std::io::{self, Cursor, Write};

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::Xxh64;

/// Seedable 64-bit hash with a reset / write / digest cycle.
pub trait Hash64: Write {
    /// Discard all absorbed input, restoring the initial seeded state.
    fn reset(&mut self);

    /// Digest of everything written since the last reset.
    fn sum64(&mut self) -> io::Result<u64>;
}

impl<H: Hash64 + ?Sized> Hash64 for Box<H> {
    fn reset(&mut self) {
        (**self).reset()
    }

    fn sum64(&mut self) -> io::Result<u64> {
        (**self).sum64()
    }
}

/// MurmurHash3 x64/128 folded to its low 64 bits.
///
/// Input is buffered until [`Hash64::sum64`] since the underlying routine
/// hashes a complete reader in one pass.
#[derive(Debug, Clone, Default)]
pub struct Murmur3Hash64 {
    seed: u32,
    buf: Vec<u8>,
}

impl Murmur3Hash64 {
    /// Create a hasher with the given seed.
    pub fn with_seed(seed: u32) -> Self {
        Self { seed, buf: Vec::new() }
    }

    /// Seed in use.
    pub fn seed(&self) -> u32 {
        self.seed
    }
}

impl Write for Murmur3Hash64 {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Hash64 for Murmur3Hash64 {
    fn reset(&mut self) {
        self.buf.clear();
    }

    fn sum64(&mut self) -> io::Result<u64> {
        let digest = murmur3::murmur3_x64_128(&mut Cursor::new(&self.buf), self.seed)?;
        Ok(digest as u64)
    }
}

/// Streaming XXH64.
#[derive(Clone)]
pub struct Xxh64Hash {
    seed: u64,
    state: Xxh64,
}

impl Xxh64Hash {
    /// Create a hasher with the given seed.
    pub fn with_seed(seed: u64) -> Self {
        Self { seed, state: Xxh64::new(seed) }
    }
}

impl Default for Xxh64Hash {
    fn default() -> Self {
        Self::with_seed(0)
    }
}

impl fmt::Debug for Xxh64Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Xxh64Hash").field("seed", &self.seed).finish_non_exhaustive()
    }
}

impl Write for Xxh64Hash {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.state.update(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Hash64 for Xxh64Hash {
    fn reset(&mut self) {
        self.state.reset(self.seed);
    }

    fn sum64(&mut self) -> io::Result<u64> {
        Ok(self.state.digest())
    }
}

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1 (multiply, then xor) 64-bit.
///
/// The seed is folded into the offset basis; seed 0 is plain FNV-1.
#[derive(Debug, Clone)]
pub struct Fnv64Hash {
    basis: u64,
    state: u64,
}

impl Fnv64Hash {
    /// Create a hasher with the given seed.
    pub fn with_seed(seed: u64) -> Self {
        let basis = FNV_OFFSET_BASIS ^ seed;
        Self { basis, state: basis }
    }
}

impl Default for Fnv64Hash {
    fn default() -> Self {
        Self::with_seed(0)
    }
}

impl Write for Fnv64Hash {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        for &b in bytes {
            self.state = self.state.wrapping_mul(FNV_PRIME) ^ u64::from(b);
        }
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Hash64 for Fnv64Hash {
    fn reset(&mut self) {
        self.state = self.basis;
    }

    fn sum64(&mut self) -> io::Result<u64> {
        Ok(self.state)
    }
}

/// Hash primitive selectable from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashKind {
    /// [`Murmur3Hash64`].
    #[default]
    Murmur3,
    /// [`Xxh64Hash`].
    Xxh64,
    /// [`Fnv64Hash`].
    Fnv64,
}

impl HashKind {
    /// Instantiate the primitive. Murmur3 takes the low 32 bits of `seed`.
    pub fn build(self, seed: u64) -> Box<dyn Hash64> {
        match self {
            HashKind::Murmur3 => Box::new(Murmur3Hash64::with_seed(seed as u32)),
            HashKind::Xxh64 => Box::new(Xxh64Hash::with_seed(seed)),
            HashKind::Fnv64 => Box::new(Fnv64Hash::with_seed(seed)),
        }
    }
}

impl fmt::Display for HashKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashKind::Murmur3 => f.write_str("murmur3"),
            HashKind::Xxh64 => f.write_str("xxh64"),
            HashKind::Fnv64 => f.write_str("fnv64"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest<H: Hash64 + ?Sized>(h: &mut H, parts: &[&[u8]]) -> u64 {
        h.reset();
        for part in parts {
            h.write_all(part).unwrap();
        }
        h.sum64().unwrap()
    }

    #[test]
    fn reset_forgets_previous_input() {
        for kind in [HashKind::Murmur3, HashKind::Xxh64, HashKind::Fnv64] {
            let mut h = kind.build(0);
            let first = digest(&mut *h, &[b"0", b"hello"]);
            h.reset();
            h.write_all(b"garbage").unwrap();
            let second = digest(&mut *h, &[b"0", b"hello"]);
            assert_eq!(first, second, "{kind}");
        }
    }

    #[test]
    fn chunking_does_not_change_digest() {
        let mut m = Murmur3Hash64::default();
        let mut x = Xxh64Hash::default();
        assert_eq!(digest(&mut m, &[b"2", b"apple"]), digest(&mut m, &[b"2apple"]));
        assert_eq!(digest(&mut x, &[b"2", b"apple"]), digest(&mut x, &[b"2apple"]));
    }

    #[test]
    fn seed_prefix_changes_digest() {
        let mut h = Murmur3Hash64::default();
        assert_ne!(digest(&mut h, &[b"0", b"A"]), digest(&mut h, &[b"1", b"A"]));
    }

    #[test]
    fn seeds_are_independent() {
        let mut a = Murmur3Hash64::with_seed(1);
        let mut b = Murmur3Hash64::with_seed(2);
        assert_eq!(a.seed(), 1);
        assert_ne!(digest(&mut a, &[b"key"]), digest(&mut b, &[b"key"]));

        let mut a = Xxh64Hash::with_seed(1);
        let mut b = Xxh64Hash::with_seed(2);
        assert_ne!(digest(&mut a, &[b"key"]), digest(&mut b, &[b"key"]));
    }

    #[test]
    fn xxh64_matches_one_shot() {
        let mut h = Xxh64Hash::with_seed(7);
        assert_eq!(digest(&mut h, &[b"abc"]), xxhash_rust::xxh64::xxh64(b"abc", 7));
    }

    #[test]
    fn murmur3_empty_input_with_zero_seed() {
        let mut h = Murmur3Hash64::default();
        assert_eq!(digest(&mut h, &[]), 0);
    }

    #[test]
    fn fnv1_reference_vectors() {
        let mut h = Fnv64Hash::default();
        assert_eq!(digest(&mut h, &[]), 0xcbf2_9ce4_8422_2325);
        assert_eq!(digest(&mut h, &[b"a"]), 0xaf63_bd4c_8601_b7be);
        assert_eq!(digest(&mut h, &[b"foo", b"bar"]), 0x340d_8765_a4dd_a9c2);
    }

    #[test]
    fn fnv_seed_changes_digest() {
        let mut a = Fnv64Hash::with_seed(0);
        let mut b = Fnv64Hash::with_seed(1);
        assert_ne!(digest(&mut a, &[b"key"]), digest(&mut b, &[b"key"]));
    }

    #[test]
    fn kind_names() {
        assert_eq!(HashKind::default(), HashKind::Murmur3);
        assert_eq!(HashKind::Xxh64.to_string(), "xxh64");
        assert_eq!(HashKind::Fnv64.to_string(), "fnv64");
    }
}
