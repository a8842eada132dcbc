//! Buffered cryptographically secure randomness.
//!
//! A [`Prng`] pulls bytes from an underlying [`CryptoRng`] in large blocks and
//! hands them out from an internal buffer, refilling the whole buffer whenever
//! a request would run past its end. Consumed bytes are never handed out
//! twice.
//!
//! [`Prng::new`] draws from the operating system. Tests and deterministic
//! callers construct a [`Prng`] over a seeded generator with
//! [`Prng::from_source`] and pass it explicitly; a process-wide OS-backed
//! instance is available through [`global`] for call sites that have no
//! better place to keep one.

use std::sync::{Mutex, MutexGuard, PoisonError};

use lazy_static::lazy_static;
use num_bigint::BigUint;
use num_traits::Zero;
use rand::{
    CryptoRng, RngCore, TryRngCore,
    rand_core::UnwrapErr,
    rngs::OsRng,
};

/// Size of the randomness buffer in bytes (2048 64-bit limbs).
pub const BUFFER_SIZE: usize = 2048 * 64 / 8;

/// The operating system's entropy source, with failures escalated to panics.
pub type OsSource = UnwrapErr<OsRng>;

/// A buffered random byte source producing field elements and bit strings.
pub struct Prng<R = OsSource> {
    source: R,
    buffer: Box<[u8]>,
    cursor: usize,
}

impl Prng<OsSource> {
    /// Creates a generator backed by the operating system's secure random
    /// source.
    pub fn new() -> Self {
        Self::from_source(OsRng.unwrap_err())
    }
}

impl Default for Prng<OsSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RngCore + CryptoRng> Prng<R> {
    /// Creates a generator backed by `source`.
    pub fn from_source(source: R) -> Self {
        let mut prng = Prng {
            source,
            buffer: vec![0u8; BUFFER_SIZE].into_boxed_slice(),
            cursor: BUFFER_SIZE,
        };
        prng.refill();
        prng
    }

    fn refill(&mut self) {
        self.source.fill_bytes(&mut self.buffer);
        self.cursor = 0;
        tracing::trace!(bytes = BUFFER_SIZE, "refilled randomness buffer");
    }

    /// Hands out the next `nbytes` bytes, refilling first if the buffer
    /// cannot satisfy the request.
    fn take(&mut self, nbytes: usize) -> &[u8] {
        assert!(
            nbytes <= BUFFER_SIZE,
            "requested {nbytes} random bytes, but the buffer holds {BUFFER_SIZE}"
        );
        if BUFFER_SIZE - self.cursor < nbytes {
            self.refill();
        }

        let start = self.cursor;
        self.cursor += nbytes;
        &self.buffer[start..self.cursor]
    }

    /// Returns the number of buffered bytes not yet handed out.
    pub fn remaining(&self) -> usize {
        BUFFER_SIZE - self.cursor
    }

    /// Returns a uniformly random value in $[0, \text{bound})$.
    ///
    /// Draws $\lceil \log_2 \text{bound} \rceil$ bits at a time and rejects
    /// draws that are out of range, so the running time depends on `bound`.
    ///
    /// # Panics
    ///
    /// Panics if `bound` is zero.
    pub fn get_random(&mut self, bound: &BigUint) -> BigUint {
        assert!(!bound.is_zero(), "cannot sample below a zero bound");

        let nbits = bound.bits() as usize;
        loop {
            let candidate = self.get_randomb(nbits);
            if candidate < *bound {
                return candidate;
            }
        }
    }

    /// Returns a uniformly random value of at most `nbits` bits.
    pub fn get_randomb(&mut self, nbits: usize) -> BigUint {
        if nbits == 0 {
            return BigUint::zero();
        }

        let nbytes = nbits.div_ceil(8);
        let excess = nbytes * 8 - nbits;
        BigUint::from_bytes_be(self.take(nbytes)) >> excess
    }

    /// Writes `nbits` random bits into the front of `buf`.
    ///
    /// Whole bytes are overwritten. When `nbits` is not a multiple of 8, the
    /// last touched byte receives random bits only in its low `nbits % 8`
    /// positions; its high bits keep whatever `buf` held before.
    ///
    /// # Panics
    ///
    /// Panics if `buf` is shorter than `nbits` bits.
    pub fn get_randomb_into(&mut self, buf: &mut [u8], nbits: usize) {
        if nbits == 0 {
            return;
        }

        let nbytes = nbits.div_ceil(8);
        assert!(
            buf.len() >= nbytes,
            "buffer of {} bytes cannot hold {nbits} bits",
            buf.len()
        );
        let excess = nbytes * 8 - nbits;
        let previous = buf[nbytes - 1];
        let random = self.take(nbytes);

        buf[..nbytes].copy_from_slice(random);
        if excess != 0 {
            let keep = 0xFFu8 >> excess;
            buf[nbytes - 1] = (random[nbytes - 1] & keep) | (previous & !keep);
        }
    }
}

lazy_static! {
    static ref GLOBAL: Mutex<Prng> = Mutex::new(Prng::new());
}

/// Locks and returns the process-wide OS-backed generator.
pub fn global() -> MutexGuard<'static, Prng> {
    GLOBAL.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn seeded(seed: u64) -> Prng<StdRng> {
        Prng::from_source(StdRng::seed_from_u64(seed))
    }

    #[test]
    fn test_starts_with_full_buffer() {
        assert_eq!(seeded(1).remaining(), BUFFER_SIZE);
    }

    #[test]
    fn test_cursor_advances_by_whole_bytes() {
        let mut prng = seeded(2);
        prng.get_randomb(12);
        assert_eq!(prng.remaining(), BUFFER_SIZE - 2);
        prng.get_randomb(8);
        assert_eq!(prng.remaining(), BUFFER_SIZE - 3);
        prng.get_randomb(0);
        assert_eq!(prng.remaining(), BUFFER_SIZE - 3);
    }

    #[test]
    fn test_consumed_bytes_are_not_reused() {
        let mut prng = seeded(3);
        let snapshot = prng.buffer.clone();

        let mut a = [0u8; 16];
        let mut b = [0u8; 16];
        prng.get_randomb_into(&mut a, 128);
        prng.get_randomb_into(&mut b, 128);
        assert_eq!(&a[..], &snapshot[0..16]);
        assert_eq!(&b[..], &snapshot[16..32]);
    }

    #[test]
    fn test_refills_when_exhausted() {
        let mut prng = seeded(4);
        let first = prng.buffer.clone();
        prng.cursor = BUFFER_SIZE - 3;

        let mut out = [0u8; 4];
        prng.get_randomb_into(&mut out, 32);
        assert_eq!(prng.remaining(), BUFFER_SIZE - 4);
        assert_eq!(&out[..], &prng.buffer[..4]);
        assert_ne!(prng.buffer, first);
    }

    #[test]
    fn test_partial_byte_preserves_destination_high_bits() {
        let mut prng = seeded(5);
        let mut buf = [0xFFu8; 2];
        prng.get_randomb_into(&mut buf, 12);
        assert_eq!(buf[1] & 0xF0, 0xF0);

        let mut prng = seeded(5);
        let mut buf = [0x00u8; 2];
        prng.get_randomb_into(&mut buf, 12);
        assert_eq!(buf[1] & 0xF0, 0x00);
    }

    #[test]
    fn test_seeded_sources_are_deterministic() {
        let bound = BigUint::from(1_000_003u64);
        let a: Vec<_> = (0..10).map(|_| seeded(6).get_random(&bound)).collect();
        let b: Vec<_> = (0..10).map(|_| seeded(6).get_random(&bound)).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_global_instance() {
        let bound = BigUint::from(10u32);
        assert!(global().get_random(&bound) < bound);
    }

    #[test]
    #[should_panic]
    fn test_zero_bound() {
        seeded(7).get_random(&BigUint::zero());
    }

    proptest! {
        #[test]
        fn test_randomb_width(seed in any::<u64>(), nbits in 0usize..300) {
            let mut prng = seeded(seed);
            for _ in 0..8 {
                prop_assert!(prng.get_randomb(nbits).bits() as usize <= nbits);
            }
        }

        #[test]
        fn test_randomb_into_never_sets_excess_bits(seed in any::<u64>(), nbits in 1usize..64) {
            let mut prng = seeded(seed);
            let mut buf = [0u8; 8];
            prng.get_randomb_into(&mut buf, nbits);
            let nbytes = nbits.div_ceil(8);
            let excess = nbytes * 8 - nbits;
            prop_assert_eq!(buf[nbytes - 1] & !(0xFFu8 >> excess), 0);
            prop_assert!(buf[nbytes..].iter().all(|b| *b == 0));
        }

        #[test]
        fn test_random_is_below_bound(seed in any::<u64>(), bound in 1u64..u64::MAX) {
            let mut prng = seeded(seed);
            let bound = BigUint::from(bound);
            prop_assert!(prng.get_random(&bound) < bound);
        }
    }
}
