//! Layered circuits and their value arena.

use maybe_rayon::prelude::*;
use num_bigint::BigInt;
use num_rational::BigRational;
use strata_arithmetic::Prime;
use strata_core::{Error, Result};

use crate::{
    gate::{Gate, GatePosition, GateValue},
    layer::{CircuitLayer, WirePredicates},
    wiring::GateType,
};

/// Describes one gate of the input layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputSlot {
    /// A value fixed by the circuit description.
    Constant(BigInt),
    /// A value supplied on every evaluation, in slot order.
    Variable,
}

/// A layered arithmetic circuit over a prime field, together with the
/// rational and field values of its most recent evaluation.
///
/// Layer 0 is the input layer, described by [`InputSlot`]s. Every other layer
/// reads both inputs of each gate from the layer directly below it. The last
/// layer is the output layer.
///
/// Values are only readable between a successful [`Circuit::load_inputs`]
/// (or [`Circuit::evaluate`]) and the next [`Circuit::invalidate`]; reading
/// them at any other time panics.
#[derive(Clone, Debug)]
pub struct Circuit {
    prime: Prime,
    inputs: Vec<InputSlot>,
    layers: Vec<CircuitLayer>,
    values: Vec<Vec<GateValue>>,
    mux_bits_needed: usize,
    valid: bool,
}

impl Circuit {
    /// Builds a circuit from its input layer and the layers above it, given
    /// bottom to top.
    ///
    /// Every gate must read positions that exist in the layer below it,
    /// every MUX gate must have a selector registered, and only MUX gates
    /// may have one.
    pub fn new(prime: Prime, inputs: Vec<InputSlot>, layers: Vec<CircuitLayer>) -> Result<Self> {
        if inputs.is_empty() {
            return Err(Error::EmptyCircuit);
        }

        let mut all = Vec::with_capacity(layers.len() + 1);
        all.push(CircuitLayer::new(inputs.len()));
        all.extend(layers);

        let mut mux_bits_needed = 0;
        for (i, pair) in all.windows(2).enumerate() {
            let (below, layer) = (&pair[0], &pair[1]);
            let layer_idx = i + 1;
            if layer.size() == 0 {
                return Err(Error::EmptyLayer { layer: layer_idx });
            }

            for (gate, wiring) in layer.wirings().iter().enumerate() {
                for index in [wiring.in1, wiring.in2] {
                    if index >= below.size() {
                        return Err(Error::WiringOutOfRange {
                            layer: layer_idx,
                            gate,
                            index,
                            size: below.size(),
                        });
                    }
                }
                if wiring.kind == GateType::Mux && !layer.mux_gates().contains_key(&gate) {
                    return Err(Error::UnregisteredMux {
                        layer: layer_idx,
                        gate,
                    });
                }
            }

            for (&gate, &mux_idx) in layer.mux_gates() {
                if gate >= layer.size() || layer.wiring(gate).kind != GateType::Mux {
                    return Err(Error::NotAMux {
                        layer: layer_idx,
                        gate,
                    });
                }
                mux_bits_needed = mux_bits_needed.max(mux_idx + 1);
            }
        }

        Ok(Circuit {
            prime,
            inputs,
            layers: all,
            values: Vec::new(),
            mux_bits_needed,
            valid: false,
        })
    }

    /// Returns the prime the circuit is evaluated modulo.
    pub fn prime(&self) -> &Prime {
        &self.prime
    }

    /// Returns the number of layers, counting the input layer.
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    /// Returns layer `i`.
    pub fn layer(&self, i: usize) -> &CircuitLayer {
        &self.layers[i]
    }

    /// Returns the input layer description.
    pub fn inputs(&self) -> &[InputSlot] {
        &self.inputs
    }

    /// Returns the number of values [`Circuit::load_inputs`] expects.
    pub fn num_variables(&self) -> usize {
        self.inputs
            .iter()
            .filter(|slot| matches!(slot, InputSlot::Variable))
            .count()
    }

    /// Returns the minimum length of the selector bit string.
    pub fn mux_bits_needed(&self) -> usize {
        self.mux_bits_needed
    }

    /// Resets every gate to zero, writes the input layer and marks the values
    /// valid.
    ///
    /// The values are invalid after an error.
    pub fn load_inputs(&mut self, values: &[BigRational]) -> Result<()> {
        self.invalidate();

        let expected = self.num_variables();
        if values.len() != expected {
            return Err(Error::InputCountMismatch {
                expected,
                actual: values.len(),
            });
        }
        if let Some(index) = values
            .iter()
            .position(|v| self.prime.invert(v.denom()).is_none())
        {
            return Err(Error::NonInvertibleInput { index });
        }

        self.values = self
            .layers
            .iter()
            .map(|layer| vec![GateValue::default(); layer.size()])
            .collect();
        self.valid = true;

        let mut values = values.iter();
        for (slot, input) in self.values[0].iter_mut().zip(&self.inputs) {
            let mut gate = Gate::new(slot, *self.layers[0].wiring(0), &self.prime);
            match input {
                InputSlot::Constant(c) => gate.set_field(c.clone()),
                // Counted above.
                InputSlot::Variable => gate.set_rational(values.next().cloned().unwrap_or_default()),
            }
        }

        Ok(())
    }

    /// Evaluates every gate of layer `i` from the values of layer `i - 1`.
    ///
    /// # Panics
    ///
    /// Panics if the values are invalid, if `i` is the input layer or out of
    /// range, or if `mux_bits` is shorter than [`Circuit::mux_bits_needed`].
    pub fn evaluate_layer(&mut self, i: usize, mux_bits: &[bool]) {
        assert!(self.valid, "circuit values are not loaded");
        assert!(
            i > 0 && i < self.depth(),
            "layer {i} is not an evaluable layer"
        );
        assert!(
            mux_bits.len() >= self.mux_bits_needed,
            "too few mux selector bits"
        );

        let (below, above) = self.values.split_at_mut(i);
        let prev = &below[i - 1];
        let layer = &self.layers[i];
        let prime = &self.prime;

        above[0]
            .par_iter_mut()
            .enumerate()
            .for_each(|(g, slot)| {
                let wiring = *layer.wiring(g);
                let (op1, op2) = (&prev[wiring.in1], &prev[wiring.in2]);
                let mut gate = Gate::new(slot, wiring, prime);
                match wiring.kind {
                    GateType::Mux => {
                        gate.compute_mux_value(op1, op2, mux_bits[layer.mux_idx(g)])
                    }
                    _ => gate.compute_value(op1, op2),
                }
            });

        tracing::trace!(layer = i, gates = layer.size(), "evaluated layer");
    }

    /// Loads `inputs` and evaluates the whole circuit.
    pub fn evaluate(&mut self, inputs: &[BigRational], mux_bits: &[bool]) -> Result<()> {
        self.evaluate_with(inputs, mux_bits, |_, _| Ok(()))
    }

    /// Loads `inputs` and evaluates the whole circuit, calling `after_layer`
    /// once each layer (the input layer included) holds its values.
    ///
    /// If any step fails the values are left invalid, so a partial pass can
    /// never be read.
    pub fn evaluate_with<F>(
        &mut self,
        inputs: &[BigRational],
        mux_bits: &[bool],
        mut after_layer: F,
    ) -> Result<()>
    where
        F: FnMut(&mut Circuit, usize) -> Result<()>,
    {
        self.invalidate();
        if mux_bits.len() < self.mux_bits_needed {
            return Err(Error::MuxBitsTooShort {
                expected: self.mux_bits_needed,
                actual: mux_bits.len(),
            });
        }

        let _scope = tracing::debug_span!("evaluate", depth = self.depth()).entered();

        let result = self.run_pass(inputs, mux_bits, &mut after_layer);
        if let Err(err) = &result {
            tracing::debug!(%err, "evaluation failed");
            self.invalidate();
        }
        result
    }

    fn run_pass<F>(
        &mut self,
        inputs: &[BigRational],
        mux_bits: &[bool],
        after_layer: &mut F,
    ) -> Result<()>
    where
        F: FnMut(&mut Circuit, usize) -> Result<()>,
    {
        self.load_inputs(inputs)?;
        after_layer(self, 0)?;
        for i in 1..self.depth() {
            self.evaluate_layer(i, mux_bits);
            after_layer(self, i)?;
        }
        Ok(())
    }

    /// Marks the values invalid.
    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    /// Returns true if the values may be read.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Returns a mutable view of the gate at `pos`.
    pub fn gate(&mut self, pos: GatePosition) -> Gate<'_> {
        assert!(self.valid, "circuit values are not loaded");
        let wiring = *self.layers[pos.layer].wiring(pos.gate);
        Gate::new(&mut self.values[pos.layer][pos.gate], wiring, &self.prime)
    }

    /// Returns the values of the gate at `pos`.
    pub fn value(&self, pos: GatePosition) -> &GateValue {
        &self.layer_values(pos.layer)[pos.gate]
    }

    /// Returns the values of every gate of layer `i`.
    pub fn layer_values(&self, i: usize) -> &[GateValue] {
        assert!(self.valid, "circuit values are not loaded");
        &self.values[i]
    }

    /// Returns the field values of layer `i`, in gate order.
    pub fn field_values(&self, i: usize) -> Vec<BigInt> {
        self.layer_values(i)
            .iter()
            .map(|v| v.field.clone())
            .collect()
    }

    /// Returns the values of the output layer.
    pub fn outputs(&self) -> &[GateValue] {
        self.layer_values(self.depth() - 1)
    }

    /// Computes the wire predicates of layer `layer` against the layer below
    /// it.
    pub fn wire_predicates(
        &self,
        layer: usize,
        rand: &[BigInt],
        mux_bits: &[bool],
    ) -> WirePredicates {
        assert!(layer > 0, "the input layer has no wire predicates");
        self.layers[layer].compute_wire_predicates(
            rand,
            mux_bits,
            self.layers[layer - 1].size(),
            &self.prime,
        )
    }
}
