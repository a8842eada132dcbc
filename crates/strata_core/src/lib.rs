//! # `strata_core`
//!
//! This crate contains the error type shared by every crate in the Strata
//! workspace. Errors here describe malformed data crossing a crate boundary
//! (a circuit description, an input assignment, a gadget layout). Broken
//! internal invariants are not represented; those panic at the point of
//! violation.

#![deny(unsafe_code)]
#![deny(missing_docs)]

/// Strata result type.
pub type Result<T> = core::result::Result<T, Error>;

/// Strata error type.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The modulus cannot define an odd prime field.
    #[error("modulus {0} does not define an odd prime field")]
    InvalidModulus(String),

    /// A circuit was described without any layers.
    #[error("a circuit needs at least an input layer")]
    EmptyCircuit,

    /// A layer was described without any gates.
    #[error("layer {layer} has no gates")]
    EmptyLayer {
        /// Index of the offending layer.
        layer: usize,
    },

    /// A gate reads from a position past the end of the layer below it.
    #[error(
        "gate {gate} in layer {layer} reads input {index}, but the layer below has {size} gates"
    )]
    WiringOutOfRange {
        /// Layer containing the gate.
        layer: usize,
        /// Index of the gate within its layer.
        gate: usize,
        /// The out-of-range input index.
        index: usize,
        /// Size of the layer below.
        size: usize,
    },

    /// A MUX gate has no selector index registered for it.
    #[error("MUX gate {gate} in layer {layer} has no selector registered")]
    UnregisteredMux {
        /// Layer containing the gate.
        layer: usize,
        /// Index of the gate within its layer.
        gate: usize,
    },

    /// A selector index was registered for a gate that is not a MUX gate.
    #[error("gate {gate} in layer {layer} has a selector registered but is not a MUX gate")]
    NotAMux {
        /// Layer containing the gate.
        layer: usize,
        /// Index of the gate within its layer.
        gate: usize,
    },

    /// The number of values supplied for the free inputs is wrong.
    #[error("expected {expected} input values, got {actual}")]
    InputCountMismatch {
        /// Number of variable input slots.
        expected: usize,
        /// Number of values supplied.
        actual: usize,
    },

    /// An input value has a denominator that is not invertible modulo the
    /// prime.
    #[error("input {index} has a denominator divisible by the prime")]
    NonInvertibleInput {
        /// Position of the value among the supplied inputs.
        index: usize,
    },

    /// Fewer MUX selector bits were supplied than the circuit references.
    #[error("circuit references {expected} mux selector bits, got {actual}")]
    MuxBitsTooShort {
        /// Number of selector bits the circuit needs.
        expected: usize,
        /// Number of selector bits supplied.
        actual: usize,
    },

    /// A gadget was laid out with the wrong number of gates.
    #[error("{gadget} expects {expected} {role} gates, got {actual}")]
    GadgetArity {
        /// Name of the gadget.
        gadget: &'static str,
        /// Which gate group is malformed.
        role: &'static str,
        /// Number of gates required.
        expected: usize,
        /// Number of gates supplied.
        actual: usize,
    },

    /// A gadget names a gate that does not exist in the circuit.
    #[error("{gadget} names gate {gate} of layer {layer}, which does not exist")]
    GadgetOutOfRange {
        /// Name of the gadget.
        gadget: &'static str,
        /// Layer of the missing gate.
        layer: usize,
        /// Index of the missing gate.
        gate: usize,
    },

    /// A gadget writes gates on more than one layer.
    #[error("{gadget} writes gates on layers {layer} and {other}")]
    SplitGadget {
        /// Name of the gadget.
        gadget: &'static str,
        /// Layer of the first written gate.
        layer: usize,
        /// Another layer the gadget writes.
        other: usize,
    },

    /// A gadget reads an operand that is only computed after its output.
    #[error("{gadget} reads layer {operand_layer} but writes layer {output_layer}")]
    OperandAboveGadget {
        /// Name of the gadget.
        gadget: &'static str,
        /// Layer of the operand.
        operand_layer: usize,
        /// Layer the gadget writes.
        output_layer: usize,
    },

    /// A gadget value does not fit into the bit gates reserved for it.
    #[error("value needs {needed} bits but only {available} bit gates are available")]
    BitWidthExceeded {
        /// Number of bits the value needs.
        needed: u64,
        /// Number of bit gates available.
        available: usize,
    },

    /// An integer comparison was asked to compare non-integral operands.
    #[error("integer comparison operands differ by the non-integral value {0}")]
    NonIntegralDifference(String),

    /// A fixed-point comparison found a denominator it cannot encode.
    #[error("denominator {0} is not a power of two that fits the denominator gates")]
    UnsupportedDenominator(String),
}
