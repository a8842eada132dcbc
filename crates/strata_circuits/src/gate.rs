//! Dual-valued gate storage and per-gate evaluation.
//!
//! # Design
//!
//! Every gate carries two values: an exact rational, which keeps integer
//! division exact and is what a human inspects, and a field element, which is
//! what the proof machinery consumes. The two are kept consistent by routing
//! every write through [`Gate`], which canonicalizes both slots modulo the
//! circuit's prime.
//!
//! A [`Gate`] does not own its values. It is a short-lived mutable view over
//! one [`GateValue`] slot in the value arena owned by a
//! [`Circuit`](crate::Circuit); gates are named by [`GatePosition`] and
//! resolved through [`Circuit::gate`](crate::Circuit::gate).

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Zero;
use strata_arithmetic::{Prime, canonicalize_rational, rational_to_field};

use crate::wiring::{GateType, GateWiring};

/// Names a gate by its layer and its index within that layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GatePosition {
    /// Layer index; layer 0 is the input layer.
    pub layer: usize,
    /// Gate index within the layer.
    pub gate: usize,
}

impl GatePosition {
    /// Creates a gate position.
    pub const fn new(layer: usize, gate: usize) -> Self {
        GatePosition { layer, gate }
    }
}

/// The rational and field values stored for one gate.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GateValue {
    /// Exact rational value.
    pub rational: BigRational,
    /// Field encoding in $[0, p)$.
    pub field: BigInt,
}

/// A mutable view of one gate's value slot.
pub struct Gate<'a> {
    slot: &'a mut GateValue,
    wiring: GateWiring,
    prime: &'a Prime,
}

impl<'a> Gate<'a> {
    pub(crate) fn new(slot: &'a mut GateValue, wiring: GateWiring, prime: &'a Prime) -> Self {
        Gate {
            slot,
            wiring,
            prime,
        }
    }

    /// Returns this gate's wiring.
    pub fn wiring(&self) -> GateWiring {
        self.wiring
    }

    /// Returns the rational value.
    pub fn rational(&self) -> &BigRational {
        &self.slot.rational
    }

    /// Returns the field value.
    pub fn field(&self) -> &BigInt {
        &self.slot.field
    }

    /// Returns both values.
    pub fn value(&self) -> &GateValue {
        self.slot
    }

    /// Sets the gate from an exact rational; the field slot receives its
    /// encoding.
    pub fn set_rational(&mut self, value: BigRational) {
        self.slot.field = rational_to_field(&value, self.prime);
        self.slot.rational = value;
        self.canonicalize();
    }

    /// Sets the gate from an integer, which is also the field value before
    /// reduction.
    pub fn set_field(&mut self, value: BigInt) {
        self.slot.rational = BigRational::from_integer(value.clone());
        self.slot.field = value;
        self.canonicalize();
    }

    /// Sets the gate from a small integer.
    pub fn set_int(&mut self, value: i64) {
        self.set_field(BigInt::from(value));
    }

    /// Reduces both slots modulo the prime in place.
    pub fn canonicalize(&mut self) {
        canonicalize_rational(&mut self.slot.rational, self.prime);
        self.prime.reduce_if_needed(&mut self.slot.field);
    }

    /// Evaluates this gate from the values of its two inputs.
    ///
    /// The rational result is computed exactly and written first, which also
    /// rewrites the field slot with its encoding. The field slot is then
    /// overwritten with [`GateWiring::apply_field_operation`] applied to the
    /// operands' field values; for `DivInt` this is the product of the field
    /// operands, not a field quotient.
    ///
    /// A `Mul` with a zero operand sets both slots to zero and returns
    /// immediately.
    ///
    /// # Panics
    ///
    /// Panics on a `Mux` wiring (see [`Gate::compute_mux_value`]) and on a
    /// `DivInt` whose second operand has a zero field value.
    pub fn compute_value(&mut self, op1: &GateValue, op2: &GateValue) {
        let rational = match self.wiring.kind {
            GateType::Add => {
                if op1.rational.is_zero() {
                    op2.rational.clone()
                } else if op2.rational.is_zero() {
                    op1.rational.clone()
                } else {
                    &op1.rational + &op2.rational
                }
            }
            GateType::Mul => {
                if op1.rational.is_zero() || op2.rational.is_zero() {
                    self.slot.rational = BigRational::zero();
                    self.slot.field = BigInt::zero();
                    return;
                }
                &op1.rational * &op2.rational
            }
            GateType::DivInt => {
                // The second operand holds d^-1; invert it and read it as a
                // signed integer to get back the true divisor.
                let inverse = self
                    .prime
                    .invert(&op2.field)
                    .expect("DivInt divisor operand must have a nonzero field value");
                let divisor = BigRational::from_integer(self.prime.to_signed(&inverse));
                &op1.rational / &divisor
            }
            GateType::Sub => {
                if op1.rational.is_zero() {
                    -&op2.rational
                } else if op2.rational.is_zero() {
                    op1.rational.clone()
                } else {
                    &op1.rational - &op2.rational
                }
            }
            GateType::Mux => panic!("MUX gates are evaluated with a selector bit"),
        };

        self.set_rational(rational);
        self.wiring
            .apply_field_operation(&mut self.slot.field, &op1.field, &op2.field, self.prime);
    }

    /// Evaluates a MUX gate: copies the second operand when `select_second`
    /// is set and the first operand otherwise.
    pub fn compute_mux_value(&mut self, op1: &GateValue, op2: &GateValue, select_second: bool) {
        assert_eq!(
            self.wiring.kind,
            GateType::Mux,
            "selector evaluation on a non-MUX gate"
        );

        let chosen = if select_second { op2 } else { op1 };
        self.slot.clone_from(chosen);
        self.canonicalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_arithmetic::FieldConfig;

    fn p61() -> Prime {
        Prime::from_config(&FieldConfig::default()).unwrap()
    }

    fn int(prime: &Prime, v: i64) -> GateValue {
        let mut slot = GateValue::default();
        Gate::new(&mut slot, GateWiring::default(), prime).set_int(v);
        slot
    }

    fn eval(prime: &Prime, kind: GateType, op1: &GateValue, op2: &GateValue) -> GateValue {
        let mut slot = GateValue::default();
        Gate::new(&mut slot, GateWiring::new(kind, 0, 1), prime).compute_value(op1, op2);
        slot
    }

    fn q(v: i64) -> BigRational {
        BigRational::from_integer(BigInt::from(v))
    }

    #[test]
    fn test_add() {
        let p = p61();
        let out = eval(&p, GateType::Add, &int(&p, 3), &int(&p, 5));
        assert_eq!(out.rational, q(8));
        assert_eq!(out.field, BigInt::from(8));
    }

    #[test]
    fn test_mul_zero_shortcut() {
        let p = p61();
        let mut slot = int(&p, 12345);
        Gate::new(&mut slot, GateWiring::new(GateType::Mul, 0, 1), &p)
            .compute_value(&int(&p, 0), &int(&p, 7));
        assert_eq!(slot.rational, q(0));
        assert_eq!(slot.field, BigInt::zero());
    }

    #[test]
    fn test_sub_negative_result() {
        let p = p61();
        let out = eval(&p, GateType::Sub, &int(&p, 3), &int(&p, 5));
        assert_eq!(out.rational, q(-2));
        assert_eq!(out.field, p.modulus() - BigInt::from(2));

        let out = eval(&p, GateType::Sub, &int(&p, 0), &int(&p, 5));
        assert_eq!(out.rational, q(-5));
        assert_eq!(out.field, p.modulus() - BigInt::from(5));
    }

    #[test]
    fn test_set_int_negative() {
        let p = p61();
        let slot = int(&p, -2);
        assert_eq!(slot.rational, q(-2));
        assert_eq!(slot.field, p.modulus() - BigInt::from(2));
    }

    #[test]
    fn test_set_rational_fraction() {
        let p = p61();
        let mut slot = GateValue::default();
        let half = BigRational::new(BigInt::from(1), BigInt::from(2));
        Gate::new(&mut slot, GateWiring::default(), &p).set_rational(half.clone());
        assert_eq!(slot.rational, half);
        assert_eq!(p.mul(&slot.field, &BigInt::from(2)), BigInt::from(1));
    }

    #[test]
    fn test_div_int_recovers_signed_divisor() {
        let p = p61();
        let dividend = int(&p, 10);

        // The divisor operand carries the encoding of (-2)^-1; its inverse is
        // p - 2, which must be read back as -2.
        let minus_two = p.reduce(&BigInt::from(-2));
        let mut divisor = GateValue::default();
        Gate::new(&mut divisor, GateWiring::default(), &p)
            .set_field(p.invert(&minus_two).unwrap());
        assert_eq!(p.invert(&divisor.field).unwrap(), p.modulus() - BigInt::from(2));

        let out = eval(&p, GateType::DivInt, &dividend, &divisor);
        assert_eq!(out.rational, q(-5));
    }

    #[test]
    fn test_div_int_field_value_is_operand_product() {
        let p = p61();
        let dividend = int(&p, 10);
        let divisor = int(&p, 3);

        let out = eval(&p, GateType::DivInt, &dividend, &divisor);

        // rational: 10 / (3^-1 read as signed)
        let inv3 = p.to_signed(&p.invert(&BigInt::from(3)).unwrap());
        assert_eq!(out.rational, q(10) / BigRational::from_integer(inv3));
        // field: the plain product, not the field quotient 10 * 3^-1
        assert_eq!(out.field, BigInt::from(30));
        assert_ne!(out.field, p.mul(&BigInt::from(10), &p.invert(&BigInt::from(3)).unwrap()));
    }

    #[test]
    #[should_panic]
    fn test_div_int_by_zero() {
        let p = p61();
        eval(&p, GateType::DivInt, &int(&p, 10), &int(&p, 0));
    }

    #[test]
    #[should_panic]
    fn test_mux_needs_selector() {
        let p = p61();
        eval(&p, GateType::Mux, &int(&p, 1), &int(&p, 2));
    }

    #[test]
    fn test_mux_selection() {
        let p = p61();
        let (a, b) = (int(&p, 4), int(&p, -9));

        let mut slot = GateValue::default();
        let mut gate = Gate::new(&mut slot, GateWiring::new(GateType::Mux, 0, 1), &p);
        gate.compute_mux_value(&a, &b, true);
        assert_eq!(gate.value(), &b);
        gate.compute_mux_value(&a, &b, false);
        assert_eq!(gate.value(), &a);
    }

    #[test]
    fn test_large_values_wrap() {
        let p = p61();
        let big = int(&p, 1 << 60);
        let out = eval(&p, GateType::Add, &big, &big);
        // 2^61 = p + 1
        assert_eq!(out.field, BigInt::from(1));
        assert_eq!(out.rational, q(1));
    }
}
