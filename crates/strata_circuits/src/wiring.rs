//! Static description of a single gate.

use num_bigint::BigInt;
use num_traits::Zero;
use strata_arithmetic::Prime;

/// The operation a gate performs on its two inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GateType {
    /// $v_1 + v_2$
    Add,
    /// $v_1 \cdot v_2$
    Mul,
    /// $v_1 - v_2$
    Sub,
    /// Exact integer division; the second input carries the field encoding
    /// of the divisor's inverse.
    DivInt,
    /// Selects $v_1$ or $v_2$ according to an externally supplied bit.
    Mux,
}

impl GateType {
    /// All gate types, in a fixed order.
    pub const ALL: [GateType; 5] = [
        GateType::Add,
        GateType::Mul,
        GateType::Sub,
        GateType::DivInt,
        GateType::Mux,
    ];
}

/// A gate's operation together with the positions of its two inputs in the
/// layer below.
///
/// The default wiring is an `Add` of input 0 with itself, used as a
/// placeholder (notably for every gate of the input layer).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GateWiring {
    /// The gate's operation.
    pub kind: GateType,
    /// Index of the first input in the layer below.
    pub in1: usize,
    /// Index of the second input in the layer below.
    pub in2: usize,
}

impl Default for GateWiring {
    fn default() -> Self {
        GateWiring::new(GateType::Add, 0, 0)
    }
}

impl GateWiring {
    /// Creates a wiring entry.
    pub const fn new(kind: GateType, in1: usize, in2: usize) -> Self {
        GateWiring { kind, in1, in2 }
    }

    /// Replaces the whole wiring entry.
    pub fn set_wiring(&mut self, kind: GateType, in1: usize, in2: usize) {
        *self = GateWiring::new(kind, in1, in2);
    }

    /// Returns true if this gate contributes to the wire predicate of `kind`.
    ///
    /// `Mul` and `DivInt` are interchangeable here: a division is a
    /// multiplication by a precomputed inverse, so both feed the
    /// multiplicative predicate.
    pub fn should_be_treated_as(&self, kind: GateType) -> bool {
        use GateType::*;

        kind == self.kind
            || matches!((kind, self.kind), (Mul, DivInt) | (DivInt, Mul))
    }

    /// Computes this gate's field-domain output from the field encodings of
    /// its inputs, writing it into `result`.
    ///
    /// Zero operands short-circuit: `Add` returns the other operand, `Mul`
    /// and `DivInt` return zero, and `Sub` returns the negated second operand
    /// or the first operand. `DivInt` multiplies its operands; it never
    /// performs a field division. A `Mux` wiring leaves `result` as it is.
    /// In every case `result` is reduced modulo `prime` before returning.
    pub fn apply_field_operation(
        &self,
        result: &mut BigInt,
        op1: &BigInt,
        op2: &BigInt,
        prime: &Prime,
    ) {
        match self.kind {
            GateType::Add => {
                *result = if op1.is_zero() {
                    op2.clone()
                } else if op2.is_zero() {
                    op1.clone()
                } else {
                    op1 + op2
                };
            }
            GateType::Mul | GateType::DivInt => {
                *result = if op1.is_zero() || op2.is_zero() {
                    BigInt::zero()
                } else {
                    op1 * op2
                };
            }
            GateType::Sub => {
                *result = if op1.is_zero() {
                    -op2
                } else if op2.is_zero() {
                    op1.clone()
                } else {
                    op1 - op2
                };
            }
            GateType::Mux => {}
        }

        prime.reduce_if_needed(result);
    }
}
