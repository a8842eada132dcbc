//! The multilinear Lagrange basis over the boolean hypercube.
//!
//! For a point $r = (r_0, \ldots, r_{k-1})$ and a vertex $i$ of the
//! $k$-dimensional hypercube,
//!
//! $$
//! \chi_i(r) = \prod_{j=0}^{k-1} \begin{cases} r_j & \text{if bit } j \text{ of } i \text{ is set} \\ 1 - r_j & \text{otherwise} \end{cases}
//! $$
//!
//! Bit $j$ of the vertex index always corresponds to coordinate $r_j$, least
//! significant bit first.

use maybe_rayon::prelude::*;
use num_bigint::BigInt;
use num_traits::{One, Zero};

use crate::Prime;

/// Returns the number of hypercube coordinates needed to index `size` gates,
/// i.e. $\lceil \log_2 \text{size} \rceil$. A single gate needs none.
pub fn hypercube_dimension(size: usize) -> usize {
    assert!(size > 0, "a layer must contain at least one gate");
    size.next_power_of_two().trailing_zeros() as usize
}

/// Evaluates every basis polynomial at `point`, returning $2^k$ values
/// indexed by hypercube vertex.
pub fn chi_all(point: &[BigInt], prime: &Prime) -> Vec<BigInt> {
    let mut out = Vec::with_capacity(1 << point.len());
    out.push(BigInt::one());

    for r in point {
        let r = prime.reduce(r);
        let r_inv = prime.sub(&BigInt::one(), &r);
        let half = out.len();
        out.extend_from_within(..);
        let (lo, hi) = out.split_at_mut(half);
        lo.par_iter_mut()
            .zip(hi.par_iter_mut())
            .for_each(|(lo, hi)| {
                *hi = prime.mul(hi, &r);
                *lo = prime.mul(lo, &r_inv);
            });
    }

    out
}

/// Evaluates the single basis polynomial for `vertex` at `point`.
pub fn chi_at(point: &[BigInt], vertex: usize, prime: &Prime) -> BigInt {
    point.iter().enumerate().fold(BigInt::one(), |acc, (j, r)| {
        let factor = if (vertex >> j) & 1 == 1 {
            prime.reduce(r)
        } else {
            prime.sub(&BigInt::one(), r)
        };
        prime.mul(&acc, &factor)
    })
}

/// Evaluates the multilinear extension of `values` at `point`.
///
/// `values` are zero-padded up to $2^k$ entries where $k$ is the length of
/// `point`.
pub fn evaluate_mle(values: &[BigInt], point: &[BigInt], prime: &Prime) -> BigInt {
    assert!(
        values.len() <= 1 << point.len(),
        "point has too few coordinates for the number of values"
    );

    let chi = chi_all(point, prime);
    let sum = values
        .iter()
        .zip(chi.iter())
        .filter(|(v, _)| !v.is_zero())
        .fold(BigInt::zero(), |acc, (v, c)| acc + v * c);
    prime.reduce(&sum)
}
