use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Signed;

use crate::Prime;

/// Encodes an exact rational as a field element: $n \cdot d^{-1} \bmod p$.
///
/// Negative values land on $p - |x|$, so the encoding agrees with
/// [`Prime::to_signed`] for every integer of magnitude at most
/// $\lfloor p / 2 \rfloor$.
///
/// # Panics
///
/// Panics if the denominator is divisible by $p$.
pub fn rational_to_field(value: &BigRational, prime: &Prime) -> BigInt {
    let numer = prime.reduce(value.numer());
    if value.is_integer() {
        return numer;
    }

    let inv = prime
        .invert(value.denom())
        .expect("denominator must be invertible modulo the prime");
    prime.mul(&numer, &inv)
}

/// Reduces a rational "if needed", keeping it consistent with its field
/// encoding.
///
/// Rationals whose numerator magnitude and denominator are both below $p$ are
/// left exactly as they are, including their sign. Anything larger is
/// replaced by the signed representative of its field encoding, which is the
/// same element of the field.
pub fn canonicalize_rational(value: &mut BigRational, prime: &Prime) {
    let modulus = prime.modulus();
    if value.numer().abs() < *modulus && value.denom() < modulus {
        return;
    }

    let encoded = rational_to_field(value, prime);
    *value = BigRational::from_integer(prime.to_signed(&encoded));
}
