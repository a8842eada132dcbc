//! Circuit layers and their wire predicates.
//!
//! # Design
//!
//! A [`CircuitLayer`] is a structural description only: a list of
//! [`GateWiring`]s and, for MUX gates, the index of the selector bit that
//! drives each one. Values live in the [`Circuit`](crate::Circuit)'s arena so
//! the same layer can be evaluated against many inputs.
//!
//! ### Wire predicates
//!
//! Let layer $i$ have $2^{m_i}$ gates and the layer below it $2^{m_{i+1}}$.
//! For a challenge $(z, w_1, w_2)$ with $z$ of length $m_i$ and $w_1, w_2$ of
//! length $m_{i+1}$, the predicate of a gate class $T$ is
//!
//! $$
//! T(z, w_1, w_2) = \sum_{g \,:\, g \text{ is } T} \chi_g(z) \cdot \chi_{\text{in}_1(g)}(w_1) \cdot \chi_{\text{in}_2(g)}(w_2)
//! $$
//!
//! MUX gates are split into a left and a right predicate according to the
//! selector bit of each gate. With these five values the verifier checks a
//! layer through
//!
//! $$
//! V_i(z) = \sum_{w_1, w_2} \text{add}\,(v_1 + v_2) + \text{mul}\,v_1 v_2 + \text{sub}\,(v_1 - v_2) + \text{mux}_L\,v_1 + \text{mux}_R\,v_2
//! $$
//!
//! (see [`WirePredicates::combine`]).

use std::collections::BTreeMap;

use num_bigint::BigInt;
use strata_arithmetic::{Prime, chi_all, hypercube_dimension};

use crate::wiring::{GateType, GateWiring};

/// The five wire predicates of one layer at one challenge point.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WirePredicates {
    /// Predicate of `Add` gates.
    pub add: BigInt,
    /// Predicate of `Mul` and `DivInt` gates.
    pub mul: BigInt,
    /// Predicate of `Sub` gates.
    pub sub: BigInt,
    /// Predicate of MUX gates whose selector bit is clear.
    pub mux_left: BigInt,
    /// Predicate of MUX gates whose selector bit is set.
    pub mux_right: BigInt,
}

impl WirePredicates {
    /// Evaluates the layer relation for input claims `v1` and `v2`:
    /// $\text{add}(v_1 + v_2) + \text{mul}\,v_1 v_2 + \text{sub}(v_1 - v_2) + \text{mux}_L v_1 + \text{mux}_R v_2$.
    pub fn combine(&self, v1: &BigInt, v2: &BigInt, prime: &Prime) -> BigInt {
        let sum = &self.add * (v1 + v2)
            + &self.mul * (v1 * v2)
            + &self.sub * (v1 - v2)
            + &self.mux_left * v1
            + &self.mux_right * v2;
        prime.reduce(&sum)
    }
}

/// One layer of a circuit: the wiring of each gate and the selector index of
/// each MUX gate.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CircuitLayer {
    gates: Vec<GateWiring>,
    mux_gates: BTreeMap<usize, usize>,
}

impl CircuitLayer {
    /// Creates a layer of `size` placeholder gates.
    pub fn new(size: usize) -> Self {
        CircuitLayer {
            gates: vec![GateWiring::default(); size],
            mux_gates: BTreeMap::new(),
        }
    }

    /// Creates a layer from a list of wirings.
    pub fn from_wiring(gates: Vec<GateWiring>) -> Self {
        CircuitLayer {
            gates,
            mux_gates: BTreeMap::new(),
        }
    }

    /// Returns the number of gates.
    pub fn size(&self) -> usize {
        self.gates.len()
    }

    /// Returns the number of hypercube coordinates indexing this layer.
    pub fn log_size(&self) -> usize {
        hypercube_dimension(self.size())
    }

    /// Resizes the layer, filling new positions with placeholder gates.
    pub fn resize(&mut self, size: usize) {
        self.gates.resize(size, GateWiring::default());
        self.mux_gates.retain(|gate, _| *gate < size);
    }

    /// Returns the wiring of gate `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of range.
    pub fn wiring(&self, idx: usize) -> &GateWiring {
        assert!(idx < self.size(), "gate {idx} out of range");
        &self.gates[idx]
    }

    /// Returns a mutable reference to the wiring of gate `idx`.
    pub fn wiring_mut(&mut self, idx: usize) -> &mut GateWiring {
        assert!(idx < self.size(), "gate {idx} out of range");
        &mut self.gates[idx]
    }

    /// Returns every gate's wiring.
    pub fn wirings(&self) -> &[GateWiring] {
        &self.gates
    }

    /// Declares that MUX gate `gate` is driven by selector bit `mux_idx`.
    pub fn register_mux(&mut self, gate: usize, mux_idx: usize) {
        self.mux_gates.insert(gate, mux_idx);
    }

    /// Returns the registered selector bit indices, keyed by gate index.
    pub fn mux_gates(&self) -> &BTreeMap<usize, usize> {
        &self.mux_gates
    }

    /// Returns the selector bit index of MUX gate `gate`.
    ///
    /// # Panics
    ///
    /// Panics if `gate` was never registered as a MUX gate.
    pub fn mux_idx(&self, gate: usize) -> usize {
        match self.mux_gates.get(&gate) {
            Some(idx) => *idx,
            None => panic!("gate {gate} is not a registered MUX gate"),
        }
    }

    /// Computes this layer's wire predicates at the challenge `rand`.
    ///
    /// `rand` holds the layer's own point followed by the two input points
    /// and must have length $m_i + 2 m_{i+1}$. A MUX gate whose selector bit
    /// in `mux_bits` is set contributes to `mux_right`, otherwise to
    /// `mux_left`.
    ///
    /// This sums over every gate; its cost is linear in the layer size plus
    /// the chi vectors.
    pub fn compute_wire_predicates(
        &self,
        rand: &[BigInt],
        mux_bits: &[bool],
        input_layer_size: usize,
        prime: &Prime,
    ) -> WirePredicates {
        let mi = self.log_size();
        let mip1 = hypercube_dimension(input_layer_size);
        assert_eq!(
            rand.len(),
            mi + 2 * mip1,
            "challenge must have one coordinate per output bit and two per input bit"
        );

        let _scope =
            tracing::debug_span!("wire_predicates", gates = self.size(), input_layer_size)
                .entered();

        let (p_rand, w_rand) = rand.split_at(mi);
        let (w1_rand, w2_rand) = w_rand.split_at(mip1);
        let p_chi = chi_all(p_rand, prime);
        let w1_chi = chi_all(w1_rand, prime);
        let w2_chi = chi_all(w2_rand, prime);

        let mut preds = WirePredicates::default();
        for (i, wiring) in self.gates.iter().enumerate() {
            assert!(
                wiring.in1 < input_layer_size && wiring.in2 < input_layer_size,
                "gate {i} reads past the end of the input layer"
            );
            let term = || prime.mul(&(&p_chi[i] * &w1_chi[wiring.in1]), &w2_chi[wiring.in2]);

            if wiring.should_be_treated_as(GateType::Add) {
                preds.add += term();
            }
            if wiring.should_be_treated_as(GateType::Mul) {
                preds.mul += term();
            }
            if wiring.should_be_treated_as(GateType::Sub) {
                preds.sub += term();
            }
            if wiring.should_be_treated_as(GateType::Mux) {
                let mux_idx = self.mux_idx(i);
                if mux_bits[mux_idx] {
                    preds.mux_right += term();
                } else {
                    preds.mux_left += term();
                }
            }
        }

        for acc in [
            &mut preds.add,
            &mut preds.mul,
            &mut preds.sub,
            &mut preds.mux_left,
            &mut preds.mux_right,
        ] {
            *acc = prime.reduce(acc);
        }

        tracing::trace!(?preds, "computed wire predicates");
        preds
    }

    /// Returns true if no gate of this layer is a MUX gate.
    pub fn is_mux_free(&self) -> bool {
        self.mux_gates.is_empty()
            && self
                .gates
                .iter()
                .all(|w| !w.should_be_treated_as(GateType::Mux))
    }
}

impl FromIterator<GateWiring> for CircuitLayer {
    fn from_iter<I: IntoIterator<Item = GateWiring>>(iter: I) -> Self {
        CircuitLayer::from_wiring(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::{One, Zero};
    use proptest::prelude::*;
    use strata_arithmetic::{FieldConfig, chi_at};

    fn p61() -> Prime {
        Prime::from_config(&FieldConfig::default()).unwrap()
    }

    fn ints(values: &[u64]) -> Vec<BigInt> {
        values.iter().copied().map(BigInt::from).collect()
    }

    #[test]
    fn test_zero_point_isolates_gate_contributions() {
        let p = p61();
        let layer: CircuitLayer = [
            GateWiring::new(GateType::Add, 0, 1),
            GateWiring::new(GateType::Mul, 0, 0),
        ]
        .into_iter()
        .collect();

        // m_i = 1, m_{i+1} = 1: all-zero challenge selects vertex 0 everywhere,
        // so only gate 0 could contribute, and only if its inputs are (0, 0).
        let preds = layer.compute_wire_predicates(&ints(&[0, 0, 0]), &[], 2, &p);
        assert!(preds.add.is_zero());
        assert!(preds.mul.is_zero());

        // Move the layer point to vertex 1: gate 1 is Mul(0, 0) and contributes 1.
        let preds = layer.compute_wire_predicates(&ints(&[1, 0, 0]), &[], 2, &p);
        assert!(preds.add.is_zero());
        assert_eq!(preds.mul, BigInt::one());

        // Vertex 0 with input point (0, 1): gate 0 is Add(0, 1) and contributes 1.
        let preds = layer.compute_wire_predicates(&ints(&[0, 0, 1]), &[], 2, &p);
        assert_eq!(preds.add, BigInt::one());
        assert!(preds.mul.is_zero());
    }

    #[test]
    fn test_by_hand_at_random_point() {
        let p = p61();
        let layer: CircuitLayer = [
            GateWiring::new(GateType::Add, 0, 1),
            GateWiring::new(GateType::Mul, 0, 0),
        ]
        .into_iter()
        .collect();

        let rand = ints(&[7, 11, 13]);
        let preds = layer.compute_wire_predicates(&rand, &[], 2, &p);

        // gate 0: chi_0(7) * chi_0(11) * chi_1(13) = (1 - 7)(1 - 11)(13)
        let add = p.reduce(&BigInt::from((1 - 7) * (1 - 11) * 13));
        // gate 1: chi_1(7) * chi_0(11) * chi_0(13) = 7 (1 - 11)(1 - 13)
        let mul = p.reduce(&BigInt::from(7 * (1 - 11) * (1 - 13)));
        assert_eq!(preds.add, add);
        assert_eq!(preds.mul, mul);
        assert!(preds.sub.is_zero());
        assert!(preds.mux_left.is_zero());
        assert!(preds.mux_right.is_zero());
    }

    #[test]
    fn test_div_int_joins_mul_predicate() {
        let p = p61();
        let with_div: CircuitLayer = [
            GateWiring::new(GateType::DivInt, 1, 0),
            GateWiring::new(GateType::Sub, 1, 1),
        ]
        .into_iter()
        .collect();
        let with_mul: CircuitLayer = [
            GateWiring::new(GateType::Mul, 1, 0),
            GateWiring::new(GateType::Sub, 1, 1),
        ]
        .into_iter()
        .collect();

        let rand = ints(&[5, 6, 8]);
        assert_eq!(
            with_div.compute_wire_predicates(&rand, &[], 2, &p),
            with_mul.compute_wire_predicates(&rand, &[], 2, &p)
        );
    }

    #[test]
    fn test_mux_routing() {
        let p = p61();
        let mut layer: CircuitLayer = [
            GateWiring::new(GateType::Mux, 0, 1),
            GateWiring::new(GateType::Mux, 1, 0),
        ]
        .into_iter()
        .collect();
        layer.register_mux(0, 0);
        layer.register_mux(1, 1);

        let rand = ints(&[3, 4, 9]);
        let term0 = p.mul(
            &p.mul(&chi_at(&rand[..1], 0, &p), &chi_at(&rand[1..2], 0, &p)),
            &chi_at(&rand[2..3], 1, &p),
        );
        let term1 = p.mul(
            &p.mul(&chi_at(&rand[..1], 1, &p), &chi_at(&rand[1..2], 1, &p)),
            &chi_at(&rand[2..3], 0, &p),
        );

        let preds = layer.compute_wire_predicates(&rand, &[true, false], 2, &p);
        assert_eq!(preds.mux_right, term0);
        assert_eq!(preds.mux_left, term1);
        assert!(preds.add.is_zero());

        let preds = layer.compute_wire_predicates(&rand, &[false, false], 2, &p);
        assert_eq!(preds.mux_left, p.add(&term0, &term1));
        assert!(preds.mux_right.is_zero());
    }

    #[test]
    #[should_panic]
    fn test_unregistered_mux_panics() {
        let p = p61();
        let layer: CircuitLayer = [GateWiring::new(GateType::Mux, 0, 0)].into_iter().collect();
        layer.compute_wire_predicates(&ints(&[1, 2]), &[true], 1 << 1, &p);
    }

    #[test]
    #[should_panic]
    fn test_mux_idx_on_plain_gate() {
        CircuitLayer::new(4).mux_idx(2);
    }

    #[test]
    #[should_panic]
    fn test_wrong_challenge_length() {
        let p = p61();
        CircuitLayer::new(4).compute_wire_predicates(&ints(&[1, 2, 3]), &[], 4, &p);
    }

    #[test]
    fn test_resize_drops_stale_mux_registrations() {
        let mut layer = CircuitLayer::new(4);
        layer.wiring_mut(3).set_wiring(GateType::Mux, 0, 1);
        layer.register_mux(3, 0);
        layer.resize(2);
        assert_eq!(layer.size(), 2);
        assert!(layer.is_mux_free());
    }

    #[test]
    fn test_combine() {
        let p = p61();
        let preds = WirePredicates {
            add: BigInt::from(2),
            mul: BigInt::from(3),
            sub: BigInt::from(5),
            mux_left: BigInt::from(7),
            mux_right: BigInt::from(11),
        };
        let (v1, v2) = (BigInt::from(4), BigInt::from(6));
        // 2*10 + 3*24 + 5*(-2) + 7*4 + 11*6
        assert_eq!(preds.combine(&v1, &v2, &p), BigInt::from(20 + 72 - 10 + 28 + 66));
    }

    proptest! {
        #[test]
        fn test_boolean_challenge_counts_matching_gates(
            z in 0usize..4,
            a in 0usize..4,
            b in 0usize..4,
        ) {
            let p = p61();
            let layer: CircuitLayer = [
                GateWiring::new(GateType::Add, 0, 1),
                GateWiring::new(GateType::Mul, 2, 3),
                GateWiring::new(GateType::Sub, 1, 1),
                GateWiring::new(GateType::DivInt, 3, 0),
            ]
            .into_iter()
            .collect();

            let bits = |v: usize| (0..2).map(move |j| BigInt::from((v >> j) & 1));
            let rand: Vec<_> = bits(z).chain(bits(a)).chain(bits(b)).collect();
            let preds = layer.compute_wire_predicates(&rand, &[], 4, &p);

            let hit = |kind: GateType| {
                let w = layer.wiring(z);
                BigInt::from((w.should_be_treated_as(kind) && w.in1 == a && w.in2 == b) as u8)
            };
            prop_assert_eq!(preds.add, hit(GateType::Add));
            prop_assert_eq!(preds.mul, hit(GateType::Mul));
            prop_assert_eq!(preds.sub, hit(GateType::Sub));
        }
    }
}
