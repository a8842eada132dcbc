use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_traits::{One, Signed, Zero};
use rand::{CryptoRng, RngCore};
use strata_core::{Error, Result};

use crate::Prng;

/// Describes a prime of the form $2^{\text{bits}} - \delta$.
///
/// This is how external collaborators (the circuit compiler, a hardware
/// simulation bridge) are configured, so a circuit built from the same
/// `FieldConfig` is guaranteed to agree with them on the modulus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldConfig {
    /// Bit length of the power of two.
    pub bits: u32,
    /// Amount subtracted from the power of two.
    pub delta: u64,
}

impl Default for FieldConfig {
    /// The Mersenne prime $2^{61} - 1$.
    fn default() -> Self {
        FieldConfig { bits: 61, delta: 1 }
    }
}

impl FieldConfig {
    /// Returns $2^{\text{bits}} - \delta$.
    pub fn modulus(&self) -> BigInt {
        (BigInt::one() << self.bits) - BigInt::from(self.delta)
    }
}

/// The prime modulus shared by every gate of a circuit.
///
/// All methods that return field elements return them in canonical form,
/// i.e. in $[0, p)$. Inputs are accepted in any form and reduced first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prime {
    modulus: BigInt,
    half: BigInt,
    bits: u64,
}

impl Prime {
    /// Creates a new modulus. Primality is not checked, but the modulus must
    /// be odd and at least 3.
    pub fn new(modulus: impl Into<BigInt>) -> Result<Self> {
        let modulus = modulus.into();
        if modulus < BigInt::from(3) || modulus.is_even() {
            return Err(Error::InvalidModulus(modulus.to_string()));
        }

        Ok(Prime {
            half: &modulus >> 1,
            bits: modulus.bits(),
            modulus,
        })
    }

    /// Creates the modulus described by `config`.
    pub fn from_config(config: &FieldConfig) -> Result<Self> {
        Self::new(config.modulus())
    }

    /// Returns $p$.
    pub fn modulus(&self) -> &BigInt {
        &self.modulus
    }

    /// Returns $\lfloor p / 2 \rfloor$, the threshold above which a field
    /// element is read as negative.
    pub fn half(&self) -> &BigInt {
        &self.half
    }

    /// Returns the bit length of $p$.
    pub fn bits(&self) -> u64 {
        self.bits
    }

    /// Reduces `x` into $[0, p)$.
    pub fn reduce(&self, x: &BigInt) -> BigInt {
        x.mod_floor(&self.modulus)
    }

    /// Reduces `x` in place, only touching it when it lies outside $[0, p)$.
    pub fn reduce_if_needed(&self, x: &mut BigInt) {
        if x.is_negative() || *x >= self.modulus {
            *x = self.reduce(x);
        }
    }

    /// Returns $a + b \bmod p$.
    pub fn add(&self, a: &BigInt, b: &BigInt) -> BigInt {
        self.reduce(&(a + b))
    }

    /// Returns $a - b \bmod p$.
    pub fn sub(&self, a: &BigInt, b: &BigInt) -> BigInt {
        self.reduce(&(a - b))
    }

    /// Returns $a \cdot b \bmod p$.
    pub fn mul(&self, a: &BigInt, b: &BigInt) -> BigInt {
        self.reduce(&(a * b))
    }

    /// Returns $-a \bmod p$.
    pub fn neg(&self, a: &BigInt) -> BigInt {
        self.reduce(&-a)
    }

    /// Returns $a / 2 \bmod p$.
    pub fn halve(&self, a: &BigInt) -> BigInt {
        let a = self.reduce(a);
        if a.is_even() {
            a >> 1
        } else {
            (a + &self.modulus) >> 1
        }
    }

    /// Returns $a^{-1} \bmod p$, or `None` when $a \equiv 0$.
    pub fn invert(&self, a: &BigInt) -> Option<BigInt> {
        let a = self.reduce(a);
        if a.is_zero() {
            return None;
        }
        a.modinv(&self.modulus)
    }

    /// Reads a field element as a signed integer: values above
    /// $\lfloor p / 2 \rfloor$ become $v - p$.
    pub fn to_signed(&self, a: &BigInt) -> BigInt {
        let a = self.reduce(a);
        if a > self.half { a - &self.modulus } else { a }
    }

    /// Draws a uniformly random field element.
    pub fn random_element<R: RngCore + CryptoRng>(&self, prng: &mut Prng<R>) -> BigInt {
        BigInt::from_biguint(Sign::Plus, prng.get_random(&self.modulus_unsigned()))
    }

    /// Draws a random challenge point with `len` coordinates.
    pub fn random_point<R: RngCore + CryptoRng>(
        &self,
        prng: &mut Prng<R>,
        len: usize,
    ) -> Vec<BigInt> {
        (0..len).map(|_| self.random_element(prng)).collect()
    }

    /// Returns $p$ as an unsigned integer.
    pub fn modulus_unsigned(&self) -> BigUint {
        self.modulus.magnitude().clone()
    }
}
