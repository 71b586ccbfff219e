//! 64-bit FNV-1a over an explicit little-endian byte layout.
//!
//! Used wherever a hash leaves the process or seeds a generator: descriptor
//! versions, RANSAC seeds and raster content identity. Unlike
//! `std::collections::hash_map::DefaultHasher`, the output does not depend on
//! the toolchain release or the target's endianness.

const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const PRIME: u64 = 0x0000_0100_0000_01b3;

#[derive(Clone, Copy, Debug)]
pub(crate) struct Fingerprint(u64);

impl Default for Fingerprint {
    fn default() -> Self {
        Self(OFFSET_BASIS)
    }
}

impl Fingerprint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes(&mut self, data: &[u8]) -> &mut Self {
        for &b in data {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(PRIME);
        }
        self
    }

    pub fn u64(&mut self, value: u64) -> &mut Self {
        self.bytes(&value.to_le_bytes())
    }

    /// `usize` widened to 64 bits so 32- and 64-bit targets agree.
    pub fn usize(&mut self, value: usize) -> &mut Self {
        self.u64(value as u64)
    }

    /// Length-prefixed, so `("ab", "c")` and `("a", "bc")` differ.
    pub fn str(&mut self, value: &str) -> &mut Self {
        self.usize(value.len()).bytes(value.as_bytes())
    }

    pub fn finish(&self) -> u64 {
        self.0
    }
}
