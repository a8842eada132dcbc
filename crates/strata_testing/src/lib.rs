//! Fixtures shared by the integration tests of the Strata crates.

#![allow(missing_docs)]

use num_bigint::BigInt;
use num_rational::BigRational;
use rand::{Rng, SeedableRng, rngs::StdRng};
use strata_arithmetic::{FieldConfig, Prime, Prng};
use strata_circuits::{Circuit, CircuitLayer, GateType, GateWiring, InputSlot};

/// The Mersenne prime $2^{61} - 1$.
pub fn mersenne61() -> Prime {
    Prime::from_config(&FieldConfig::default()).expect("2^61 - 1 is an odd prime")
}

pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub fn seeded_prng(seed: u64) -> Prng<StdRng> {
    Prng::from_source(seeded_rng(seed))
}

const RANDOM_KINDS: [GateType; 4] = [GateType::Add, GateType::Mul, GateType::Sub, GateType::Mux];

/// Builds a layer of `size` random gates reading from a layer of
/// `input_size` gates. MUX gates take consecutive selector indices starting
/// at `*next_mux`, which is advanced past them.
///
/// `DivInt` is never generated: its divisor operand must be nonzero, which
/// random wiring cannot promise.
pub fn random_layer<R: Rng + ?Sized>(
    rng: &mut R,
    size: usize,
    input_size: usize,
    next_mux: &mut usize,
) -> CircuitLayer {
    let mut layer = CircuitLayer::new(size);
    for g in 0..size {
        let kind = RANDOM_KINDS[rng.random_range(0..RANDOM_KINDS.len())];
        let in1 = rng.random_range(0..input_size);
        let in2 = rng.random_range(0..input_size);
        *layer.wiring_mut(g) = GateWiring::new(kind, in1, in2);
        if kind == GateType::Mux {
            layer.register_mux(g, *next_mux);
            *next_mux += 1;
        }
    }
    layer
}

/// Builds a random circuit whose layer `i` has `widths[i]` gates. About one
/// input in four is a constant.
pub fn random_circuit<R: Rng + ?Sized>(rng: &mut R, prime: &Prime, widths: &[usize]) -> Circuit {
    assert!(!widths.is_empty(), "a circuit needs an input layer");

    let inputs = (0..widths[0])
        .map(|_| {
            if rng.random_bool(0.25) {
                InputSlot::Constant(BigInt::from(rng.random_range(-100i64..100)))
            } else {
                InputSlot::Variable
            }
        })
        .collect();

    let mut next_mux = 0;
    let layers = widths
        .windows(2)
        .map(|w| random_layer(rng, w[1], w[0], &mut next_mux))
        .collect();

    Circuit::new(prime.clone(), inputs, layers).expect("random wiring is in range")
}

/// Returns `n` small rationals: mostly integers, some halves and thirds.
pub fn random_inputs<R: Rng + ?Sized>(rng: &mut R, n: usize) -> Vec<BigRational> {
    (0..n)
        .map(|_| {
            let numer = BigInt::from(rng.random_range(-1000i64..1000));
            let denom = BigInt::from([1, 1, 1, 2, 3][rng.random_range(0..5)]);
            BigRational::new(numer, denom)
        })
        .collect()
}

pub fn random_mux_bits<R: Rng + ?Sized>(rng: &mut R, n: usize) -> Vec<bool> {
    (0..n).map(|_| rng.random_bool(0.5)).collect()
}
