//! # `strata_circuits`
//!
//! Layered arithmetic circuits over a prime field, in the shape consumed by a
//! GKR-style interactive proof.
//!
//! A [`Circuit`] is a stack of [`CircuitLayer`]s. Every gate of layer $i$
//! applies a [`GateType`] to two gates of layer $i - 1$, named by its
//! [`GateWiring`]. Evaluating the circuit fills each gate with a
//! [`GateValue`]: an exact rational alongside its field encoding. The
//! prover ships the field values; the verifier checks each layer against the
//! one below it using the layer's [`WirePredicates`], the multilinear
//! extensions of "gate $g$ is an add/mul/sub/mux of inputs $a$ and $b$".

#![deny(unsafe_code)]
#![deny(missing_docs)]

mod circuit;
mod gate;
mod layer;
mod wiring;

pub use circuit::{Circuit, InputSlot};
pub use gate::{Gate, GatePosition, GateValue};
pub use layer::{CircuitLayer, WirePredicates};
pub use wiring::{GateType, GateWiring};
