//! # `strata_gadgets`
//!
//! Prover-side "magic" gadgets. A circuit cannot compute an inverse or a bit
//! decomposition with add, mul and sub gates alone, but it can check one.
//! The prover computes these values outside the gate semantics with a
//! [`MagicVarOperation`] and writes them into designated gates; subsequent
//! layers constrain them.

#![deny(unsafe_code)]
#![deny(missing_docs)]

mod magic;

use num_rational::BigRational;
use strata_circuits::Circuit;
use strata_core::Result;

pub use magic::MagicVarOperation;

/// Evaluates `circuit` on `inputs`, running each operation in `ops` right
/// after its [output layer](MagicVarOperation::output_layer) has been
/// evaluated and before the layer above it reads from it.
///
/// Every operation is validated before evaluation starts. Operations sharing
/// an output layer run in the order given.
pub fn evaluate_with_magic(
    circuit: &mut Circuit,
    inputs: &[BigRational],
    mux_bits: &[bool],
    ops: &[MagicVarOperation],
) -> Result<()> {
    for op in ops {
        op.validate(circuit)?;
    }

    let _scope = tracing::debug_span!("evaluate_with_magic", ops = ops.len()).entered();
    circuit.evaluate_with(inputs, mux_bits, |circuit, layer| {
        ops.iter()
            .filter(|op| op.output_layer() == layer)
            .try_for_each(|op| op.compute_magic_gates(circuit))
    })
}
