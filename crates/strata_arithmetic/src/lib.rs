//! # `strata_arithmetic`
//!
//! Arithmetic shared by the prover and the verifier of a layered circuit:
//! the circuit's prime modulus and operations on canonical field elements,
//! the encoding of exact rationals into the field, the multilinear
//! (chi) basis over the boolean hypercube, and a buffered source of
//! cryptographically secure randomness.
//!
//! Field elements are represented as [`BigInt`](num_bigint::BigInt)s in
//! $[0, p)$. The modulus is chosen at runtime, so there is no field type
//! parameter; every operation takes the [`Prime`] it works modulo.

#![deny(unsafe_code)]
#![deny(missing_docs)]

mod chi;
mod prime;
pub mod prng;
mod rational;

pub use chi::{chi_all, chi_at, evaluate_mle, hypercube_dimension};
pub use prime::{FieldConfig, Prime};
pub use prng::Prng;
pub use rational::{canonicalize_rational, rational_to_field};
