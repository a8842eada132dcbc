use num_bigint::{BigInt, Sign};
use num_rational::BigRational;
use num_traits::{One, Zero};
use strata_circuits::{Circuit, GatePosition};
use strata_core::{Error, Result};

/// A prover-side helper that fills "magic" gates with values the circuit
/// cannot compute itself, such as inverses and bit decompositions. The
/// circuit's later layers check the values; the operation only supplies them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MagicVarOperation {
    /// Writes $m = (x_1 - x_2)^{-1}$ in the field, or $0$ when
    /// $x_1 = x_2$. A circuit proves $x_1 \neq x_2$ by checking
    /// $(x_1 - x_2) \cdot m = 1$.
    NotEqual {
        /// The inverse gate.
        m: GatePosition,
        /// Left operand.
        x1: GatePosition,
        /// Right operand.
        x2: GatePosition,
    },

    /// Compares two integers through $d = x_1 - x_2$.
    ///
    /// `ms` is a one-hot encoding of the sign of $d$ as `[d < 0, d = 0, d > 0]`
    /// and `ns` receives the bits of $|d|$, least significant first.
    LessThanInt {
        /// Sign indicator gates; exactly three.
        ms: Vec<GatePosition>,
        /// Magnitude bit gates.
        ns: Vec<GatePosition>,
        /// Left operand.
        x1: GatePosition,
        /// Right operand.
        x2: GatePosition,
    },

    /// Compares two dyadic rationals through $d = x_1 - x_2 = n / 2^k$.
    ///
    /// `ms` and `ns` are filled as for [`MagicVarOperation::LessThanInt`]
    /// from the sign of $d$ and the magnitude of $n$; `ds` is a one-hot
    /// encoding of $k$.
    LessThanFloat {
        /// Sign indicator gates; exactly three.
        ms: Vec<GatePosition>,
        /// Numerator bit gates.
        ns: Vec<GatePosition>,
        /// Denominator exponent gates; gate $k$ is set.
        ds: Vec<GatePosition>,
        /// Left operand.
        x1: GatePosition,
        /// Right operand.
        x2: GatePosition,
    },
}

/// Values computed for the gates of one operation, written only once the
/// whole operation has succeeded.
type Assignment = Vec<(GatePosition, BigInt)>;

impl MagicVarOperation {
    /// Returns the gadget's name, used in errors and traces.
    pub fn name(&self) -> &'static str {
        match self {
            MagicVarOperation::NotEqual { .. } => "NotEqual",
            MagicVarOperation::LessThanInt { .. } => "LessThanInt",
            MagicVarOperation::LessThanFloat { .. } => "LessThanFloat",
        }
    }

    fn operands(&self) -> [GatePosition; 2] {
        match self {
            MagicVarOperation::NotEqual { x1, x2, .. }
            | MagicVarOperation::LessThanInt { x1, x2, .. }
            | MagicVarOperation::LessThanFloat { x1, x2, .. } => [*x1, *x2],
        }
    }

    fn written(&self) -> Vec<GatePosition> {
        match self {
            MagicVarOperation::NotEqual { m, .. } => vec![*m],
            MagicVarOperation::LessThanInt { ms, ns, .. } => ms.iter().chain(ns).copied().collect(),
            MagicVarOperation::LessThanFloat { ms, ns, ds, .. } => {
                ms.iter().chain(ns).chain(ds).copied().collect()
            }
        }
    }

    /// Returns the layer holding the gates this operation writes. It runs as
    /// soon as that layer has been evaluated.
    pub fn output_layer(&self) -> usize {
        match self {
            MagicVarOperation::NotEqual { m, .. } => m.layer,
            MagicVarOperation::LessThanInt { ms, x1, .. }
            | MagicVarOperation::LessThanFloat { ms, x1, .. } => {
                ms.first().map_or(x1.layer, |m| m.layer)
            }
        }
    }

    /// Checks the operation's shape against `circuit`: three sign gates, a
    /// nonempty set of denominator gates, every position inside the circuit,
    /// every written gate on one layer and no operand above it.
    pub fn validate(&self, circuit: &Circuit) -> Result<()> {
        let gadget = self.name();

        if let MagicVarOperation::LessThanInt { ms, .. }
        | MagicVarOperation::LessThanFloat { ms, .. } = self
            && ms.len() != 3
        {
            return Err(Error::GadgetArity {
                gadget,
                role: "sign",
                expected: 3,
                actual: ms.len(),
            });
        }
        if let MagicVarOperation::LessThanFloat { ds, .. } = self
            && ds.is_empty()
        {
            return Err(Error::GadgetArity {
                gadget,
                role: "denominator",
                expected: 1,
                actual: 0,
            });
        }

        let written = self.written();
        for pos in written.iter().chain(&self.operands()) {
            if pos.layer >= circuit.depth() || pos.gate >= circuit.layer(pos.layer).size() {
                return Err(Error::GadgetOutOfRange {
                    gadget,
                    layer: pos.layer,
                    gate: pos.gate,
                });
            }
        }

        let output_layer = self.output_layer();
        if let Some(other) = written.iter().find(|pos| pos.layer != output_layer) {
            return Err(Error::SplitGadget {
                gadget,
                layer: output_layer,
                other: other.layer,
            });
        }
        if let Some(operand) = self.operands().iter().find(|x| x.layer > output_layer) {
            return Err(Error::OperandAboveGadget {
                gadget,
                operand_layer: operand.layer,
                output_layer,
            });
        }

        Ok(())
    }

    /// Computes and writes the magic gates from the current values of the
    /// operands. Nothing is written if an error is returned.
    ///
    /// # Panics
    ///
    /// Panics if the circuit's values are not loaded.
    pub fn compute_magic_gates(&self, circuit: &mut Circuit) -> Result<()> {
        self.validate(circuit)?;

        let [x1, x2] = self.operands();
        let assignment = match self {
            MagicVarOperation::NotEqual { m, .. } => {
                let prime = circuit.prime();
                let diff = prime.sub(&circuit.value(x1).field, &circuit.value(x2).field);
                vec![(*m, prime.invert(&diff).unwrap_or_default())]
            }
            MagicVarOperation::LessThanInt { ms, ns, .. } => {
                let diff = &circuit.value(x1).rational - &circuit.value(x2).rational;
                if !diff.is_integer() {
                    return Err(Error::NonIntegralDifference(diff.to_string()));
                }
                let mut assignment = sign_gates(ms, diff.numer());
                assignment.extend(bit_gates(ns, diff.numer())?);
                assignment
            }
            MagicVarOperation::LessThanFloat { ms, ns, ds, .. } => {
                let diff = &circuit.value(x1).rational - &circuit.value(x2).rational;
                let exponent = dyadic_exponent(&diff, ds.len())?;
                let mut assignment = sign_gates(ms, diff.numer());
                assignment.extend(bit_gates(ns, diff.numer())?);
                assignment.extend(
                    ds.iter()
                        .enumerate()
                        .map(|(k, pos)| (*pos, indicator(k == exponent))),
                );
                assignment
            }
        };

        for (pos, value) in assignment {
            circuit.gate(pos).set_field(value);
        }

        tracing::trace!(
            gadget = self.name(),
            layer = self.output_layer(),
            "computed magic gates"
        );
        Ok(())
    }
}

fn indicator(set: bool) -> BigInt {
    if set { BigInt::one() } else { BigInt::zero() }
}

fn sign_gates(ms: &[GatePosition], value: &BigInt) -> Assignment {
    let flags = [
        value.sign() == Sign::Minus,
        value.is_zero(),
        value.sign() == Sign::Plus,
    ];
    ms.iter()
        .zip(flags)
        .map(|(pos, flag)| (*pos, indicator(flag)))
        .collect()
}

/// Assigns the bits of $|v|$ to `ns`, least significant first, padding with
/// zeros.
fn bit_gates(ns: &[GatePosition], value: &BigInt) -> Result<Assignment> {
    let magnitude = value.magnitude();
    let needed = magnitude.bits();
    if needed > ns.len() as u64 {
        return Err(Error::BitWidthExceeded {
            needed,
            available: ns.len(),
        });
    }

    Ok(ns
        .iter()
        .enumerate()
        .map(|(j, pos)| (*pos, indicator(magnitude.bit(j as u64))))
        .collect())
}

/// Returns $k$ such that the denominator of `value` is $2^k$, provided
/// $k < \text{limit}$.
fn dyadic_exponent(value: &BigRational, limit: usize) -> Result<usize> {
    let denom = value.denom();
    let unsupported = || Error::UnsupportedDenominator(denom.to_string());

    let magnitude = denom.magnitude();
    let k = magnitude.trailing_zeros().unwrap_or(0);
    if magnitude.count_ones() != 1 || k >= limit as u64 {
        return Err(unsupported());
    }
    Ok(k as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(n: i64, d: i64) -> BigRational {
        BigRational::new(BigInt::from(n), BigInt::from(d))
    }

    fn positions(layer: usize, range: std::ops::Range<usize>) -> Vec<GatePosition> {
        range.map(|g| GatePosition::new(layer, g)).collect()
    }

    fn values(assignment: &Assignment) -> Vec<i64> {
        assignment
            .iter()
            .map(|(_, v)| i64::try_from(v).unwrap())
            .collect()
    }

    #[test]
    fn test_sign_gates() {
        let ms = positions(0, 0..3);
        assert_eq!(values(&sign_gates(&ms, &BigInt::from(-4))), [1, 0, 0]);
        assert_eq!(values(&sign_gates(&ms, &BigInt::from(0))), [0, 1, 0]);
        assert_eq!(values(&sign_gates(&ms, &BigInt::from(9))), [0, 0, 1]);
    }

    #[test]
    fn test_bit_gates() {
        let ns = positions(0, 0..5);
        assert_eq!(values(&bit_gates(&ns, &BigInt::from(-11)).unwrap()), [1, 1, 0, 1, 0]);
        assert_eq!(values(&bit_gates(&ns, &BigInt::from(0)).unwrap()), [0; 5]);
        assert_eq!(
            bit_gates(&ns, &BigInt::from(32)),
            Err(Error::BitWidthExceeded {
                needed: 6,
                available: 5
            })
        );
        assert_eq!(bit_gates(&[], &BigInt::from(0)), Ok(vec![]));
    }

    #[test]
    fn test_dyadic_exponent() {
        assert_eq!(dyadic_exponent(&q(3, 1), 1), Ok(0));
        assert_eq!(dyadic_exponent(&q(-3, 8), 4), Ok(3));
        assert_eq!(
            dyadic_exponent(&q(3, 8), 3),
            Err(Error::UnsupportedDenominator("8".into()))
        );
        assert_eq!(
            dyadic_exponent(&q(1, 6), 8),
            Err(Error::UnsupportedDenominator("6".into()))
        );
    }
}
